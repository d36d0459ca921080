use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use crate::audio::AudioFrame;
use crate::error::SessionError;
use crate::session::event::{Envelope, SessionEvent};
use crate::session::SessionId;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Recogniser configuration for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionOptions {
    /// Forward interim hypotheses as `speech-partial-results`
    pub partial_results: bool,
    /// Keep audio on the device; engines that can't honour this must refuse the request
    pub requires_on_device_recognition: bool,
    /// Maximum alternatives the engine should compute and the caller receives
    pub max_results: u32,
    /// Ask for microphone permission on `start` when it has not been granted yet
    pub request_permissions_auto: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            partial_results: true,
            requires_on_device_recognition: false,
            max_results: 5,
            request_permissions_auto: true,
        }
    }
}

/// Ownership token for one active recognition request
#[derive(Debug, PartialEq, Eq)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub fn next() -> Self {
        Self(REQUEST_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Where an engine delivers results for one request
///
/// An engine sends zero or more partials and then exactly one terminal event
/// ([`final_result`](Self::final_result) or [`error`](Self::error)). Anything sent after
/// the terminal event is dropped by the controller.
#[derive(Debug, Clone)]
pub struct EngineTap {
    session: SessionId,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EngineTap {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The engine accepted the request and is listening
    pub fn ready(&self) -> bool {
        self.post(SessionEvent::EngineReady)
    }

    /// Speech was recognised in the audio so far, before any text is available
    pub fn recognized(&self, is_final: bool) -> bool {
        self.post(SessionEvent::Recognized { is_final })
    }

    pub fn partial(&self, text: impl Into<String>) -> bool {
        self.post(SessionEvent::Partial(text.into()))
    }

    pub fn final_result(&self, text: impl Into<String>) -> bool {
        self.post(SessionEvent::Final(vec![text.into()]))
    }

    /// Final result with alternatives, best first
    pub fn final_results(&self, alternatives: Vec<String>) -> bool {
        self.post(SessionEvent::Final(alternatives))
    }

    pub fn error(&self, code: impl Into<String>, message: impl Into<String>) -> bool {
        self.post(SessionEvent::EngineFailed {
            code: code.into(),
            message: message.into(),
        })
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

/// Speech recognition capability
///
/// At most one request is active at a time. `feed` is called from the controller's
/// serialization point and must not block.
#[async_trait::async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Whether recognition can run right now (service reachable, model loaded, ...)
    async fn is_available(&self) -> bool;

    /// Names of the recognition services this engine can route to
    async fn services(&self) -> Vec<String>;

    /// Open a request; results are delivered through `tap`
    async fn begin_request(
        &self,
        locale: &str,
        options: &RecognitionOptions,
        tap: EngineTap,
    ) -> Result<RequestHandle, SessionError>;

    /// Stream one captured buffer into the request
    fn feed(&self, request: &RequestHandle, frame: &AudioFrame) -> Result<(), SessionError>;

    /// No more audio will be fed; the request stays open for its terminal event
    fn end_audio(&self, request: &RequestHandle) -> Result<(), SessionError>;

    /// Signal end of audio and release the request; idempotent
    async fn finish(&self, request: &RequestHandle);

    /// Abandon the request without waiting for a result; idempotent
    async fn cancel(&self, request: &RequestHandle);

    /// Engine name for logging
    fn name(&self) -> &str;
}
