use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::AudioFrame;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one start-to-teardown lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self {
        Self(SESSION_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Event posted by a capability adapter into the controller's serialization point
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Buffer(AudioFrame),
    CaptureEnded,
    CaptureFailed(String),
    EngineReady,
    Recognized { is_final: bool },
    Partial(String),
    /// Best hypothesis first
    Final(Vec<String>),
    EngineFailed { code: String, message: String },
}

impl SessionEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::CaptureEnded => "capture-ended",
            Self::CaptureFailed(_) => "capture-failed",
            Self::EngineReady => "engine-ready",
            Self::Recognized { .. } => "recognized",
            Self::Partial(_) => "partial",
            Self::Final(_) => "final",
            Self::EngineFailed { .. } => "engine-failed",
        }
    }
}

#[derive(Debug)]
pub(crate) struct Envelope {
    pub session: SessionId,
    pub event: SessionEvent,
}
