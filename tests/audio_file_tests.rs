// Integration tests for WAV file reading and file-backed capture
//
// Fixtures are written to a temp dir with hound so the tests are self-contained.

mod support;

use anyhow::Result;
use loqa_voice::{
    AudioCapture, AudioFile, ChannelSink, EndReason, Notification, RecognitionOptions,
    SessionController, SessionError, SessionKind, SessionState, StaticPermission,
    TranscriptionSegment, WavFileCapture,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use support::{controller_with, EngineControl, WAIT};
use tempfile::TempDir;
use tokio::sync::mpsc;

fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Poll a control counter until it reaches `expected`
async fn wait_for(counter: &AtomicUsize, expected: usize) {
    tokio::time::timeout(WAIT, async {
        while EngineControl::count(counter) < expected {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("counter never reached expected value");
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notification channel closed")
}

fn partials() -> RecognitionOptions {
    RecognitionOptions {
        partial_results: true,
        ..RecognitionOptions::default()
    }
}

fn segment(text: &str, duration: f64) -> TranscriptionSegment {
    TranscriptionSegment {
        transcription: text.to_string(),
        timestamp: 0.0,
        duration,
    }
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tone.wav");
    write_wav(&path, 16000, 1, &vec![1000i16; 8000])?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 8000);
    assert!((audio.duration_seconds - 0.5).abs() < 0.001);
    assert!(audio.path.contains("tone.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_frames() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stereo.wav");
    // 250ms of 16kHz stereo
    write_wav(&path, 16000, 2, &vec![7i16; 4000 * 2])?;

    let frames = AudioFile::open(&path)?.frames(100);

    assert_eq!(frames.len(), 3, "two full 100ms frames and a short tail");
    assert_eq!(frames[0].samples.len(), 1600 * 2);
    assert_eq!(frames[1].timestamp_ms, 100);
    assert_eq!(frames[2].samples.len(), 800 * 2);
    assert_eq!(frames[2].duration_ms(), 50);
    assert!(frames.iter().all(|f| f.channels == 2));

    Ok(())
}

#[tokio::test]
async fn test_wav_capture_availability() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("present.wav");
    write_wav(&path, 16000, 1, &[0i16; 160])?;

    assert!(WavFileCapture::new(&path, 100).is_available().await);
    assert!(!WavFileCapture::new(dir.path().join("missing.wav"), 100).is_available().await);

    Ok(())
}

#[tokio::test]
async fn test_wav_capture_feeds_session() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("speech.wav");
    // 300ms → three 100ms buffers
    write_wav(&path, 16000, 1, &vec![2000i16; 4800])?;

    let engine_ctl = Arc::new(EngineControl::default());
    let (sink, mut notifications) = ChannelSink::channel();
    let controller = SessionController::new(
        Box::new(WavFileCapture::new(&path, 100)),
        support::scripted_engine(Arc::clone(&engine_ctl)),
        Arc::new(StaticPermission::granted()),
        Arc::new(sink),
    );

    controller.start("en-US", RecognitionOptions::default()).await?;

    let mut volumes = 0;
    let first = tokio::time::timeout(WAIT, notifications.recv()).await?;
    assert_eq!(first, Some(Notification::SpeechStart));
    while volumes < 3 {
        match tokio::time::timeout(WAIT, notifications.recv()).await? {
            Some(Notification::SpeechVolumeChanged { .. }) => volumes += 1,
            other => panic!("unexpected notification {:?}", other),
        }
    }

    assert_eq!(EngineControl::count(&engine_ctl.feeds), 3);

    controller.stop().await;
    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(
        notifications.recv().await,
        Some(Notification::SpeechEnd {
            reason: EndReason::Stopped
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_wav_capture_missing_file_fails_start() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("gone.wav");
    write_wav(&path, 16000, 1, &[0i16; 160])?;

    let engine_ctl = Arc::new(EngineControl::default());
    let (sink, _notifications) = ChannelSink::channel();
    let controller = SessionController::new(
        Box::new(WavFileCapture::new(&path, 100)),
        support::scripted_engine(Arc::clone(&engine_ctl)),
        Arc::new(StaticPermission::granted()),
        Arc::new(sink),
    );

    assert!(controller.is_available().await);
    std::fs::remove_file(&path)?;

    let result = controller.start("en-US", RecognitionOptions::default()).await;

    assert!(result.is_err());
    assert_eq!(controller.state(), SessionState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_wav_end_signals_engine_and_awaits_result() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("short.wav");
    write_wav(&path, 16000, 1, &vec![1500i16; 4800])?;

    let engine_ctl = Arc::new(EngineControl::default());
    let (sink, mut notifications) = ChannelSink::channel();
    let controller = SessionController::new(
        Box::new(WavFileCapture::new(&path, 100)),
        support::scripted_engine(Arc::clone(&engine_ctl)),
        Arc::new(StaticPermission::granted()),
        Arc::new(sink),
    );

    controller.start("en-US", RecognitionOptions::default()).await?;
    wait_for(&engine_ctl.ends, 1).await;

    // End of input does not end the session; the engine still owes its result
    assert_eq!(EngineControl::count(&engine_ctl.feeds), 3);
    assert_eq!(controller.state(), SessionState::Listening);
    let stats = controller.snapshot().session.expect("session still live");
    assert!(stats.audio_ended);
    assert_eq!(stats.audio_ms, 300);

    engine_ctl.final_result("that was short");

    let mut received = Vec::new();
    loop {
        let notification = next(&mut notifications).await;
        let end = notification.is_end();
        if !notification.is_volume() {
            received.push(notification);
        }
        if end {
            break;
        }
    }

    assert_eq!(
        received,
        vec![
            Notification::SpeechStart,
            Notification::SpeechResults {
                text: "that was short".to_string(),
                alternatives: vec!["that was short".to_string()],
            },
            Notification::SpeechEnd {
                reason: EndReason::Completed
            },
        ]
    );
    assert_eq!(EngineControl::count(&engine_ctl.ends), 1);
    assert_eq!(EngineControl::count(&engine_ctl.finishes), 1);
    assert_eq!(controller.state(), SessionState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_transcription_reports_segments() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("memo.wav");
    write_wav(&path, 16000, 1, &vec![900i16; 4800])?;

    // File transcription needs no microphone permission
    let (sink, mut notifications) = ChannelSink::channel();
    let (controller, capture, engine) =
        controller_with(Arc::new(StaticPermission::denied()), Arc::new(sink));

    controller
        .start_transcription(&path, "en", partials())
        .await?;
    assert_eq!(
        controller.snapshot().session.map(|s| s.kind),
        Some(SessionKind::Transcription)
    );
    assert_eq!(engine.last_locale.lock().unwrap().as_deref(), Some("en-US"));

    wait_for(&engine.ends, 1).await;
    engine.partial("take the");
    engine.final_result("take the bins out");

    assert_eq!(next(&mut notifications).await, Notification::TranscriptionStart);
    assert_eq!(
        next(&mut notifications).await,
        Notification::TranscriptionResults {
            transcription: "take the".to_string(),
            segments: vec![segment("take the", 0.3)],
            is_final: false,
        }
    );
    assert_eq!(
        next(&mut notifications).await,
        Notification::TranscriptionResults {
            transcription: "take the bins out".to_string(),
            segments: vec![segment("take the bins out", 0.3)],
            is_final: true,
        }
    );
    assert_eq!(
        next(&mut notifications).await,
        Notification::TranscriptionEnd {
            reason: EndReason::Completed
        }
    );

    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(EngineControl::count(&engine.feeds), 3);
    assert_eq!(capture.starts.load(std::sync::atomic::Ordering::SeqCst), 0, "microphone untouched");

    Ok(())
}

#[tokio::test]
async fn test_transcription_ignores_speech_stop() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("memo.wav");
    write_wav(&path, 16000, 1, &vec![900i16; 1600])?;

    let (sink, mut notifications) = ChannelSink::channel();
    let (controller, _capture, engine) =
        controller_with(Arc::new(StaticPermission::granted()), Arc::new(sink));

    controller
        .start_transcription(&path, "en-US", partials())
        .await?;

    controller.stop().await;
    controller.cancel().await;
    assert!(controller.state().is_active());
    assert_eq!(
        controller.start("en-US", partials()).await,
        Err(SessionError::AlreadyRunning)
    );

    controller.stop_transcription().await;
    assert_eq!(controller.state(), SessionState::Idle);

    let mut received = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        received.push(notification);
    }
    assert_eq!(
        received.last(),
        Some(&Notification::TranscriptionEnd {
            reason: EndReason::Stopped
        })
    );
    assert!(received.iter().all(|n| !matches!(n, Notification::SpeechEnd { .. })));
    assert_eq!(EngineControl::count(&engine.finishes), 1);

    Ok(())
}

#[tokio::test]
async fn test_cancel_transcription() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("memo.wav");
    write_wav(&path, 16000, 1, &vec![900i16; 1600])?;

    let (sink, mut notifications) = ChannelSink::channel();
    let (controller, _capture, engine) =
        controller_with(Arc::new(StaticPermission::granted()), Arc::new(sink));

    controller
        .start_transcription(&path, "en-US", partials())
        .await?;
    controller.cancel_transcription().await;
    // Nothing left to destroy
    controller.destroy_transcription().await;

    let mut last = None;
    while let Ok(notification) = notifications.try_recv() {
        last = Some(notification);
    }
    assert_eq!(
        last,
        Some(Notification::TranscriptionEnd {
            reason: EndReason::Cancelled
        })
    );
    assert_eq!(EngineControl::count(&engine.cancels), 1);
    assert_eq!(controller.state(), SessionState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_transcription_of_missing_file() -> Result<()> {
    let dir = TempDir::new()?;

    let (sink, mut notifications) = ChannelSink::channel();
    let (controller, _capture, engine) =
        controller_with(Arc::new(StaticPermission::granted()), Arc::new(sink));

    let result = controller
        .start_transcription(dir.path().join("nothing.wav"), "en-US", partials())
        .await;

    assert!(matches!(result, Err(SessionError::Unavailable(_))));
    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(EngineControl::count(&engine.begins), 0);
    assert!(notifications.try_recv().is_err());

    Ok(())
}
