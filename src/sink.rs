//! Caller-facing notifications
//!
//! The controller queues notifications under its session lock and delivers them, in
//! order, after releasing it. A sink may query the controller from `emit`, but it should
//! return promptly because delivery is serialized.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// Engine delivered its final result
    Completed,
    /// Caller asked to stop
    Stopped,
    /// Caller cancelled
    Cancelled,
    /// Engine, capture or acquisition failure
    Failed,
}

/// Part of a file transcription with its position in the audio, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    pub transcription: String,
    pub timestamp: f64,
    pub duration: f64,
}

/// Live recognition emits the `speech-*` family, file transcription `transcription-*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Notification {
    SpeechStart,
    SpeechRecognized {
        #[serde(rename = "isFinal")]
        is_final: bool,
    },
    SpeechPartialResults {
        text: String,
    },
    /// `alternatives` is best first, starts with `text` and holds at most `max_results`
    SpeechResults {
        text: String,
        alternatives: Vec<String>,
    },
    SpeechError {
        kind: String,
        message: String,
    },
    SpeechVolumeChanged {
        channel0: f32,
        channel1: f32,
    },
    SpeechEnd {
        reason: EndReason,
    },
    TranscriptionStart,
    TranscriptionResults {
        transcription: String,
        segments: Vec<TranscriptionSegment>,
        #[serde(rename = "isFinal")]
        is_final: bool,
    },
    TranscriptionError {
        kind: String,
        message: String,
    },
    TranscriptionEnd {
        reason: EndReason,
    },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SpeechStart => "speech-start",
            Self::SpeechRecognized { .. } => "speech-recognized",
            Self::SpeechPartialResults { .. } => "speech-partial-results",
            Self::SpeechResults { .. } => "speech-results",
            Self::SpeechError { .. } => "speech-error",
            Self::SpeechVolumeChanged { .. } => "speech-volume-changed",
            Self::SpeechEnd { .. } => "speech-end",
            Self::TranscriptionStart => "transcription-start",
            Self::TranscriptionResults { .. } => "transcription-results",
            Self::TranscriptionError { .. } => "transcription-error",
            Self::TranscriptionEnd { .. } => "transcription-end",
        }
    }

    /// `speech-end` or `transcription-end`
    pub fn is_end(&self) -> bool {
        matches!(self, Self::SpeechEnd { .. } | Self::TranscriptionEnd { .. })
    }

    pub fn is_volume(&self) -> bool {
        matches!(self, Self::SpeechVolumeChanged { .. })
    }
}

/// Fire-and-forget delivery of notifications to the caller
pub trait EventSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Sink backed by an unbounded channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            warn!("Notification receiver dropped, discarding {}", e.0.name());
        }
    }
}

/// Sink that only logs
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, notification: Notification) {
        if notification.is_volume() {
            trace!(?notification, "notification");
        } else {
            info!(?notification, "notification");
        }
    }
}
