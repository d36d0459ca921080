use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the controller
///
/// `Idle → Starting → Listening → Stopping → Idle`, with `Failed` reachable from
/// `Starting` or `Listening` and also resolving to `Idle`. Within one session the state
/// only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Starting,
    Listening,
    Stopping,
    Failed,
}

impl SessionState {
    fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Starting => 1,
            Self::Listening => 2,
            Self::Stopping | Self::Failed => 3,
        }
    }

    /// Whether a live session may move from `self` to `next`
    pub fn can_advance_to(self, next: SessionState) -> bool {
        next != Self::Idle && self != Self::Idle && next.rank() > self.rank()
    }

    /// Starting or Listening: the caller still receives transcript events
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Listening)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session is capturing from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Live recognition from the microphone
    Speech,
    /// Recognition of an audio file
    Transcription,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speech => f.write_str("speech"),
            Self::Transcription => f.write_str("transcription"),
        }
    }
}
