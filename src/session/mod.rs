//! Recognition session management
//!
//! This module provides the `SessionController` that manages:
//! - Permission and availability checks before a session starts
//! - Acquiring the capture source and a recognition request
//! - Relaying engine and capture events to the caller's sink
//! - Transcribing audio files through the same engine
//! - Teardown that never delivers transcript events after it was requested

mod controller;
pub(crate) mod event;
mod state;
mod stats;

pub use controller::SessionController;
pub use event::SessionId;
pub use state::{SessionKind, SessionState};
pub use stats::{SessionSnapshot, SessionStats};
