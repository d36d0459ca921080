use anyhow::{Context, Result};
use clap::Parser;
use loqa_voice::{
    ChannelSink, Config, NatsEngine, SessionController, StaticPermission, WavFileCapture,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Transcribe a WAV file through a NATS speech-to-text service
#[derive(Debug, Parser)]
#[command(name = "loqa-voice", version)]
struct Args {
    /// WAV file to play into the recogniser
    wav: PathBuf,

    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/loqa-voice")]
    config: String,

    /// Recognition locale, overrides the configured one
    #[arg(short, long)]
    locale: Option<String>,

    /// Only report the final result
    #[arg(long)]
    no_partial: bool,

    /// Transcribe the file as fast as the service accepts it instead of playing it live
    #[arg(long)]
    transcribe: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loqa Voice v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let engine = NatsEngine::connect(&cfg.nats, &cfg.audio)
        .await
        .context("Failed to create recognition engine")?;
    let capture = WavFileCapture::new(&args.wav, cfg.audio.buffer_duration_ms);
    let (sink, mut notifications) = ChannelSink::channel();

    let controller = SessionController::with_config(
        Box::new(capture),
        Arc::new(engine),
        Arc::new(StaticPermission::granted()),
        Arc::new(sink),
        &cfg.recognition,
    );

    let mut options = cfg.recognition.options();
    if args.no_partial {
        options.partial_results = false;
    }

    let locale = args.locale.as_deref().unwrap_or_default();
    if args.transcribe {
        controller
            .start_transcription(&args.wav, locale, options)
            .await
            .context("Failed to start transcription")?;
    } else {
        controller
            .start(locale, options)
            .await
            .context("Failed to start recognition")?;
    }

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else { break };
                if !notification.is_volume() {
                    println!("{}", serde_json::to_string(&notification)?);
                }
                if notification.is_end() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, ending session");
                if args.transcribe {
                    controller.stop_transcription().await;
                } else {
                    controller.stop().await;
                }
            }
        }
    }

    Ok(())
}
