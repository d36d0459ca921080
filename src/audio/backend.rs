use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use super::frame::AudioFrame;
use crate::error::SessionError;
use crate::session::event::{Envelope, SessionEvent};
use crate::session::SessionId;

static CAPTURE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Ownership token for a running capture with its tap installed
///
/// Not `Clone`: the controller holds the only one and hands it back to
/// [`AudioCapture::stop`] exactly once during teardown.
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureHandle(u64);

impl CaptureHandle {
    pub fn next() -> Self {
        Self(CAPTURE_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Where a capture adapter delivers audio for one session
///
/// Delivery never blocks, so it is safe to call from an audio callback thread.
#[derive(Debug, Clone)]
pub struct CaptureTap {
    session: SessionId,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl CaptureTap {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver one buffer; returns false once the session is gone
    pub fn deliver(&self, frame: AudioFrame) -> bool {
        self.post(SessionEvent::Buffer(frame))
    }

    /// The source has no more audio; the engine is told so and the session waits for
    /// its final result
    pub fn end(&self) -> bool {
        self.post(SessionEvent::CaptureEnded)
    }

    /// Report a hardware failure; the session tears down with an `audio` error
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.post(SessionEvent::CaptureFailed(message.into()))
    }

    fn post(&self, event: SessionEvent) -> bool {
        self.tx
            .send(Envelope {
                session: self.session,
                event,
            })
            .is_ok()
    }
}

/// Audio capture capability
///
/// Implementations:
/// - [`WavFileCapture`](super::WavFileCapture): plays a WAV file at real-time pace
/// - host adapters wrapping a platform microphone
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Whether the input device can be opened right now
    async fn is_available(&self) -> bool;

    /// Start capturing and install `tap` as the only consumer of buffers
    async fn start(&mut self, tap: CaptureTap) -> Result<CaptureHandle, SessionError>;

    /// Stop capturing and remove the tap
    ///
    /// Must be idempotent: stopping twice, or with a handle that is no longer
    /// current, is a no-op.
    async fn stop(&mut self, handle: &CaptureHandle);

    /// Check if capture is currently running
    fn is_capturing(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}
