use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{SessionKind, SessionState};
use crate::audio::AudioLevel;

/// Point-in-time view of the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,

    /// Present while a session exists
    pub session: Option<SessionStats>,
}

/// Statistics about the live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub kind: SessionKind,

    /// Normalised locale the request was opened with
    pub locale: String,

    /// When `start` was accepted
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Audio buffers forwarded to the engine
    pub buffers_fed: usize,

    /// Audio forwarded to the engine, in milliseconds
    pub audio_ms: u64,

    /// The capture source reported end of input
    pub audio_ended: bool,

    /// Partial results forwarded to the caller
    pub partial_results: usize,

    /// Most recent level reading
    pub level: AudioLevel,

    /// Caller asked to end the session; no further transcript events are delivered
    pub teardown_requested: bool,

    /// A terminal transcript event is still expected from the engine
    pub final_result_expected: bool,
}
