use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{AudioCapture, CaptureHandle, CaptureTap};
use super::frame::AudioFrame;
use crate::error::SessionError;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split into consecutive frames of `buffer_duration_ms` each (last one may be short)
    pub fn frames(&self, buffer_duration_ms: u64) -> Vec<AudioFrame> {
        let channels = self.channels.max(1) as usize;
        let per_frame = (self.sample_rate as u64 * buffer_duration_ms / 1000).max(1) as usize;
        let chunk_len = per_frame * channels;

        self.samples
            .chunks(chunk_len)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * buffer_duration_ms,
            })
            .collect()
    }
}

/// Capture source that plays a WAV file through the tap
///
/// Plays at real-time pace by default, which exercises a recogniser the way a microphone
/// would. Reports end of input once the last frame was delivered.
pub struct WavFileCapture {
    path: PathBuf,
    buffer_duration_ms: u64,
    paced: bool,
    active: Option<(u64, JoinHandle<()>)>,
}

impl WavFileCapture {
    pub fn new(path: impl Into<PathBuf>, buffer_duration_ms: u64) -> Self {
        Self {
            path: path.into(),
            buffer_duration_ms: buffer_duration_ms.max(1),
            paced: true,
            active: None,
        }
    }

    /// Deliver frames as fast as the session takes them (file transcription)
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }
}

#[async_trait::async_trait]
impl AudioCapture for WavFileCapture {
    async fn is_available(&self) -> bool {
        self.path.is_file()
    }

    async fn start(&mut self, tap: CaptureTap) -> Result<CaptureHandle, SessionError> {
        if self.is_capturing() {
            return Err(SessionError::Capture("already capturing".to_string()));
        }

        let audio = AudioFile::open(&self.path)
            .map_err(|e| SessionError::Capture(format!("{:#}", e)))?;
        let frames = audio.frames(self.buffer_duration_ms);
        let interval = Duration::from_millis(self.buffer_duration_ms);

        info!(
            "Starting file capture for {}: {} frames of {}ms",
            tap.session(),
            frames.len(),
            self.buffer_duration_ms
        );

        let paced = self.paced;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for frame in frames {
                if paced {
                    ticker.tick().await;
                } else {
                    tokio::task::yield_now().await;
                }
                if !tap.deliver(frame) {
                    debug!("Session closed, file capture stopping early");
                    return;
                }
            }
            debug!("File capture reached end of file");
            tap.end();
        });

        let handle = CaptureHandle::next();
        self.active = Some((handle.id(), task));

        Ok(handle)
    }

    async fn stop(&mut self, handle: &CaptureHandle) {
        match self.active.take() {
            Some((id, task)) if id == handle.id() => {
                task.abort();
                info!("File capture stopped");
            }
            Some(other) => {
                warn!("Ignoring stop for stale capture handle {}", handle.id());
                self.active = Some(other);
            }
            None => {}
        }
    }

    fn is_capturing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|(_, task)| !task.is_finished())
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}
