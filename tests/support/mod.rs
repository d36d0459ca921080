// Capability doubles shared by the integration tests
//
// The controls are shared with the test body so it can play the role of the audio
// hardware and the recognition engine, and count how often resources were released.

#![allow(dead_code)]

use loqa_voice::{
    AudioCapture, AudioFrame, CaptureHandle, CaptureTap, ChannelSink, EngineTap, EventSink,
    Notification, PermissionGate, RecognitionEngine, RecognitionOptions, RequestHandle,
    SessionController, SessionError, StaticPermission,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

pub const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Capture
// ============================================================================

pub struct CaptureControl {
    pub tap: Mutex<Option<CaptureTap>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub available: AtomicBool,
    pub fail_start: Mutex<Option<String>>,
    /// When set, `start` parks until the gate is notified
    pub gate: Mutex<Option<Arc<Notify>>>,
    pub entered: Notify,
}

impl Default for CaptureControl {
    fn default() -> Self {
        Self {
            tap: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            fail_start: Mutex::new(None),
            gate: Mutex::new(None),
            entered: Notify::new(),
        }
    }
}

impl CaptureControl {
    pub fn push(&self, frame: AudioFrame) -> bool {
        match self.tap.lock().unwrap().as_ref() {
            Some(tap) => tap.deliver(frame),
            None => false,
        }
    }

    pub fn fail(&self, message: &str) -> bool {
        match self.tap.lock().unwrap().as_ref() {
            Some(tap) => tap.fail(message),
            None => false,
        }
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

pub struct ScriptedCapture {
    control: Arc<CaptureControl>,
    current: Option<u64>,
}

#[async_trait::async_trait]
impl AudioCapture for ScriptedCapture {
    async fn is_available(&self) -> bool {
        self.control.available.load(Ordering::SeqCst)
    }

    async fn start(&mut self, tap: CaptureTap) -> Result<CaptureHandle, SessionError> {
        self.control.starts.fetch_add(1, Ordering::SeqCst);
        self.control.entered.notify_one();

        let gate = self.control.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(message) = self.control.fail_start.lock().unwrap().clone() {
            return Err(SessionError::Capture(message));
        }

        *self.control.tap.lock().unwrap() = Some(tap);
        let handle = CaptureHandle::next();
        self.current = Some(handle.id());
        Ok(handle)
    }

    async fn stop(&mut self, handle: &CaptureHandle) {
        self.control.stops.fetch_add(1, Ordering::SeqCst);
        if self.current == Some(handle.id()) {
            self.current = None;
            self.control.tap.lock().unwrap().take();
        }
    }

    fn is_capturing(&self) -> bool {
        self.current.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct EngineControl {
    pub tap: Mutex<Option<EngineTap>>,
    pub begins: AtomicUsize,
    pub feeds: AtomicUsize,
    /// End-of-audio signals for the active request
    pub ends: AtomicUsize,
    pub finishes: AtomicUsize,
    pub cancels: AtomicUsize,
    pub available: AtomicBool,
    pub fail_begin: Mutex<Option<SessionError>>,
    pub last_locale: Mutex<Option<String>>,
    pub last_options: Mutex<Option<RecognitionOptions>>,
}

impl Default for EngineControl {
    fn default() -> Self {
        Self {
            tap: Mutex::new(None),
            begins: AtomicUsize::new(0),
            feeds: AtomicUsize::new(0),
            ends: AtomicUsize::new(0),
            finishes: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            fail_begin: Mutex::new(None),
            last_locale: Mutex::new(None),
            last_options: Mutex::new(None),
        }
    }
}

impl EngineControl {
    fn with_tap(&self, f: impl FnOnce(&EngineTap) -> bool) -> bool {
        match self.tap.lock().unwrap().as_ref() {
            Some(tap) => f(tap),
            None => false,
        }
    }

    pub fn ready(&self) -> bool {
        self.with_tap(|tap| tap.ready())
    }

    pub fn partial(&self, text: &str) -> bool {
        self.with_tap(|tap| tap.partial(text))
    }

    pub fn recognized(&self, is_final: bool) -> bool {
        self.with_tap(|tap| tap.recognized(is_final))
    }

    pub fn final_result(&self, text: &str) -> bool {
        self.with_tap(|tap| tap.final_result(text))
    }

    pub fn final_results(&self, alternatives: &[&str]) -> bool {
        self.with_tap(|tap| {
            tap.final_results(alternatives.iter().map(|a| a.to_string()).collect())
        })
    }

    pub fn error(&self, code: &str, message: &str) -> bool {
        self.with_tap(|tap| tap.error(code, message))
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct ScriptedEngine {
    control: Arc<EngineControl>,
    active: Mutex<Option<u64>>,
}

#[async_trait::async_trait]
impl RecognitionEngine for ScriptedEngine {
    async fn is_available(&self) -> bool {
        self.control.available.load(Ordering::SeqCst)
    }

    async fn services(&self) -> Vec<String> {
        vec!["scripted".to_string()]
    }

    async fn begin_request(
        &self,
        locale: &str,
        options: &RecognitionOptions,
        tap: EngineTap,
    ) -> Result<RequestHandle, SessionError> {
        self.control.begins.fetch_add(1, Ordering::SeqCst);
        *self.control.last_locale.lock().unwrap() = Some(locale.to_string());
        *self.control.last_options.lock().unwrap() = Some(options.clone());

        if let Some(error) = self.control.fail_begin.lock().unwrap().clone() {
            return Err(error);
        }

        *self.control.tap.lock().unwrap() = Some(tap);
        let handle = RequestHandle::next();
        *self.active.lock().unwrap() = Some(handle.id());
        Ok(handle)
    }

    fn feed(&self, request: &RequestHandle, _frame: &AudioFrame) -> Result<(), SessionError> {
        if *self.active.lock().unwrap() != Some(request.id()) {
            return Err(SessionError::engine("client", "no active request"));
        }
        self.control.feeds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn end_audio(&self, request: &RequestHandle) -> Result<(), SessionError> {
        if *self.active.lock().unwrap() != Some(request.id()) {
            return Err(SessionError::engine("client", "no active request"));
        }
        self.control.ends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finish(&self, request: &RequestHandle) {
        self.control.finishes.fetch_add(1, Ordering::SeqCst);
        let mut active = self.active.lock().unwrap();
        if *active == Some(request.id()) {
            *active = None;
        }
    }

    async fn cancel(&self, request: &RequestHandle) {
        self.control.cancels.fetch_add(1, Ordering::SeqCst);
        let mut active = self.active.lock().unwrap();
        if *active == Some(request.id()) {
            *active = None;
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub controller: SessionController,
    pub capture: Arc<CaptureControl>,
    pub engine: Arc<EngineControl>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

pub fn scripted_engine(control: Arc<EngineControl>) -> Arc<ScriptedEngine> {
    Arc::new(ScriptedEngine {
        control,
        active: Mutex::new(None),
    })
}

pub fn harness() -> Harness {
    harness_with(StaticPermission::granted())
}

pub fn harness_with(permission: impl PermissionGate + 'static) -> Harness {
    let (sink, notifications) = ChannelSink::channel();
    let (controller, capture, engine) = controller_with(Arc::new(permission), Arc::new(sink));

    Harness {
        controller,
        capture,
        engine,
        notifications,
    }
}

/// Controller over scripted adapters that reports to `sink`
pub fn controller_with(
    permission: Arc<dyn PermissionGate>,
    sink: Arc<dyn EventSink>,
) -> (SessionController, Arc<CaptureControl>, Arc<EngineControl>) {
    let capture = Arc::new(CaptureControl::default());
    let engine = Arc::new(EngineControl::default());

    let controller = SessionController::new(
        Box::new(ScriptedCapture {
            control: Arc::clone(&capture),
            current: None,
        }),
        scripted_engine(Arc::clone(&engine)),
        permission,
        sink,
    );

    (controller, capture, engine)
}

impl Harness {
    pub async fn next(&mut self) -> Notification {
        tokio::time::timeout(WAIT, self.notifications.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed")
    }

    /// Everything up to and including `speech-end` or `transcription-end`
    pub async fn until_end(&mut self) -> Vec<Notification> {
        let mut received = Vec::new();
        loop {
            let notification = self.next().await;
            let end = notification.is_end();
            received.push(notification);
            if end {
                return received;
            }
        }
    }

    /// Whatever is queued right now
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut received = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            received.push(notification);
        }
        received
    }
}

/// Drop volume readings, which may interleave anywhere
pub fn transcript(notifications: &[Notification]) -> Vec<Notification> {
    notifications
        .iter()
        .filter(|n| !n.is_volume())
        .cloned()
        .collect()
}

/// 10ms of 16kHz mono at a constant amplitude
pub fn frame(amplitude: i16) -> AudioFrame {
    AudioFrame {
        samples: vec![amplitude; 160],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    }
}

/// Let spawned tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
