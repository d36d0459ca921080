use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, error, info, trace, warn};

use super::event::{Envelope, SessionEvent, SessionId};
use super::state::{SessionKind, SessionState};
use super::stats::{SessionSnapshot, SessionStats};
use crate::audio::{AudioCapture, AudioLevel, CaptureHandle, CaptureTap, WavFileCapture};
use crate::config::RecognitionConfig;
use crate::engine::{EngineTap, RecognitionEngine, RecognitionOptions, RequestHandle};
use crate::error::SessionError;
use crate::locale;
use crate::permission::{PermissionGate, PermissionStatus};
use crate::sink::{EndReason, EventSink, Notification, TranscriptionSegment};

/// Frame size used when transcribing files
const TRANSCRIPTION_BUFFER_MS: u64 = 100;

type SharedCapture = Arc<tokio::sync::Mutex<Box<dyn AudioCapture>>>;

/// Owns the single live capture + recognition session
///
/// Adapters post events into a per-session channel that one pump task drains, so every
/// transition happens under the same lock. Caller-initiated teardown flips
/// `teardown_requested` under that lock before any resource is released; from then on
/// only the closing `speech-end` reaches the sink.
///
/// Acquisition and release run on spawned tasks, so dropping a `start` or `stop` future
/// never strands a half-built session.
///
/// Cloning is cheap and yields another handle to the same controller.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

struct Shared {
    microphone: SharedCapture,
    engine: Arc<dyn RecognitionEngine>,
    permission: Arc<dyn PermissionGate>,
    sink: Arc<dyn EventSink>,
    inner: Mutex<Inner>,
    /// Held while draining the outbox so notifications reach the sink in queue order
    delivery: Mutex<()>,
}

struct Inner {
    /// Applied to the next `start` given an empty locale
    locale: String,
    options: RecognitionOptions,
    session: Option<Session>,
    /// Notifications queued under the lock, delivered by `flush` once it is released
    outbox: Vec<Notification>,
}

struct Session {
    id: SessionId,
    kind: SessionKind,
    state: SessionState,
    locale: String,
    options: RecognitionOptions,
    started_at: DateTime<Utc>,
    source: SharedCapture,
    /// Acquisition is still running; it owns cleanup if teardown is requested meanwhile
    acquiring: bool,
    teardown_requested: bool,
    final_result_expected: bool,
    audio_ended: bool,
    end_reason: Option<EndReason>,
    capture: Option<CaptureHandle>,
    request: Option<RequestHandle>,
    halt: Arc<Notify>,
    done: watch::Sender<bool>,
    level: AudioLevel,
    buffers_fed: usize,
    audio_ms: u64,
    partial_results: usize,
}

/// Resources taken out of a session for release, exactly one per session
struct Teardown {
    session: SessionId,
    reason: EndReason,
    capture: Option<(SharedCapture, CaptureHandle)>,
    request: Option<RequestHandle>,
}

fn end_notification(kind: SessionKind, reason: EndReason) -> Notification {
    match kind {
        SessionKind::Speech => Notification::SpeechEnd { reason },
        SessionKind::Transcription => Notification::TranscriptionEnd { reason },
    }
}

impl Session {
    fn new(
        kind: SessionKind,
        locale: String,
        options: RecognitionOptions,
        source: SharedCapture,
    ) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            id: SessionId::next(),
            kind,
            state: SessionState::Starting,
            locale,
            options,
            started_at: Utc::now(),
            source,
            acquiring: true,
            teardown_requested: false,
            final_result_expected: true,
            audio_ended: false,
            end_reason: None,
            capture: None,
            request: None,
            halt: Arc::new(Notify::new()),
            done,
            level: AudioLevel::default(),
            buffers_fed: 0,
            audio_ms: 0,
            partial_results: 0,
        }
    }

    fn advance(&mut self, next: SessionState) {
        if self.state.can_advance_to(next) {
            debug!("{}: {} -> {}", self.id, self.state, next);
            self.state = next;
        } else {
            warn!("{}: ignoring transition {} -> {}", self.id, self.state, next);
        }
    }

    /// First buffer or engine acknowledgement
    fn mark_listening(&mut self, outbox: &mut Vec<Notification>) {
        if self.state == SessionState::Starting {
            self.advance(SessionState::Listening);
            outbox.push(match self.kind {
                SessionKind::Speech => Notification::SpeechStart,
                SessionKind::Transcription => Notification::TranscriptionStart,
            });
        }
    }

    /// The audio covered so far, as one segment
    fn segment(&self, text: &str) -> TranscriptionSegment {
        TranscriptionSegment {
            transcription: text.to_string(),
            timestamp: 0.0,
            duration: self.audio_ms as f64 / 1000.0,
        }
    }

    fn partial(&self, text: String) -> Notification {
        match self.kind {
            SessionKind::Speech => Notification::SpeechPartialResults { text },
            SessionKind::Transcription => Notification::TranscriptionResults {
                segments: vec![self.segment(&text)],
                transcription: text,
                is_final: false,
            },
        }
    }

    fn results(&self, mut alternatives: Vec<String>) -> Notification {
        alternatives.truncate((self.options.max_results as usize).max(1));
        let text = alternatives.first().cloned().unwrap_or_default();

        match self.kind {
            SessionKind::Speech => Notification::SpeechResults { text, alternatives },
            SessionKind::Transcription => Notification::TranscriptionResults {
                segments: vec![self.segment(&text)],
                transcription: text,
                is_final: true,
            },
        }
    }

    fn fail(&mut self, outbox: &mut Vec<Notification>, error: SessionError) -> Teardown {
        warn!("{} failed: {}", self.id, error);
        let kind = error.code().to_string();
        let message = error.message();
        outbox.push(match self.kind {
            SessionKind::Speech => Notification::SpeechError { kind, message },
            SessionKind::Transcription => Notification::TranscriptionError { kind, message },
        });
        self.final_result_expected = false;
        self.begin_teardown(SessionState::Failed, EndReason::Failed)
    }

    fn begin_teardown(&mut self, state: SessionState, reason: EndReason) -> Teardown {
        self.teardown_requested = true;
        self.advance(state);
        self.end_reason = Some(reason);
        Teardown {
            session: self.id,
            reason,
            capture: self
                .capture
                .take()
                .map(|handle| (Arc::clone(&self.source), handle)),
            request: self.request.take(),
        }
    }

    /// Release job for resources acquired after the caller already ended the session
    fn handoff(&self, capture: Option<CaptureHandle>, request: Option<RequestHandle>) -> Teardown {
        Teardown {
            session: self.id,
            reason: self.end_reason.unwrap_or(EndReason::Stopped),
            capture: capture.map(|handle| (Arc::clone(&self.source), handle)),
            request,
        }
    }

    fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        SessionStats {
            kind: self.kind,
            locale: self.locale.clone(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            buffers_fed: self.buffers_fed,
            audio_ms: self.audio_ms,
            audio_ended: self.audio_ended,
            partial_results: self.partial_results,
            level: self.level,
            teardown_requested: self.teardown_requested,
            final_result_expected: self.final_result_expected,
        }
    }
}

impl SessionController {
    pub fn new(
        capture: Box<dyn AudioCapture>,
        engine: Arc<dyn RecognitionEngine>,
        permission: Arc<dyn PermissionGate>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::with_config(capture, engine, permission, sink, &RecognitionConfig::default())
    }

    pub fn with_config(
        capture: Box<dyn AudioCapture>,
        engine: Arc<dyn RecognitionEngine>,
        permission: Arc<dyn PermissionGate>,
        sink: Arc<dyn EventSink>,
        config: &RecognitionConfig,
    ) -> Self {
        info!(
            "Session controller ready (capture: {}, engine: {})",
            capture.name(),
            engine.name()
        );

        Self {
            shared: Arc::new(Shared {
                microphone: Arc::new(tokio::sync::Mutex::new(capture)),
                engine,
                permission,
                sink,
                inner: Mutex::new(Inner {
                    locale: locale::resolve(&config.locale, "en-US"),
                    options: config.options(),
                    session: None,
                    outbox: Vec::new(),
                }),
                delivery: Mutex::new(()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver queued notifications; must be called without the session lock held
    fn flush(&self) {
        let _delivery = self
            .shared
            .delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            let batch = std::mem::take(&mut self.lock().outbox);
            if batch.is_empty() {
                break;
            }
            for notification in batch {
                self.shared.sink.emit(notification);
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock()
            .session
            .as_ref()
            .map_or(SessionState::Idle, |session| session.state)
    }

    /// True while a session is starting or listening
    pub fn is_recognizing(&self) -> bool {
        self.state().is_active()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            state: inner
                .session
                .as_ref()
                .map_or(SessionState::Idle, |session| session.state),
            session: inner.session.as_ref().map(Session::stats),
        }
    }

    /// Default locale for the next `start`
    pub fn locale(&self) -> String {
        self.lock().locale.clone()
    }

    /// Default options for [`start_default`](Self::start_default)
    pub fn options(&self) -> RecognitionOptions {
        self.lock().options.clone()
    }

    /// Change the default locale; only allowed while idle
    pub fn set_locale(&self, locale: &str) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if let Some(session) = &inner.session {
            return Err(SessionError::InvalidState {
                operation: "set locale",
                state: session.state,
            });
        }
        inner.locale = locale::resolve(locale, "en-US");
        info!("Default locale set to {}", inner.locale);
        Ok(())
    }

    /// Change the default options; only allowed while idle
    pub fn set_options(&self, options: RecognitionOptions) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if let Some(session) = &inner.session {
            return Err(SessionError::InvalidState {
                operation: "configure recognition",
                state: session.state,
            });
        }
        inner.options = options;
        Ok(())
    }

    /// Whether both the recognition engine and the capture source are usable
    pub async fn is_available(&self) -> bool {
        if !self.shared.engine.is_available().await {
            return false;
        }
        let capture = self.shared.microphone.lock().await;
        capture.is_available().await
    }

    pub async fn request_permission(&self) -> PermissionStatus {
        self.shared.permission.request().await
    }

    pub async fn recognition_services(&self) -> Vec<String> {
        self.shared.engine.services().await
    }

    /// Start with the configured locale and options
    pub async fn start_default(&self) -> Result<(), SessionError> {
        let options = self.options();
        self.start("", options).await
    }

    /// Start live recognition; an empty `locale` falls back to the configured default
    pub async fn start(
        &self,
        locale: &str,
        options: RecognitionOptions,
    ) -> Result<(), SessionError> {
        let locale = self.resolve_start_locale(locale)?;

        self.check_permission(&options).await?;
        self.check_engine().await?;
        {
            let capture = self.shared.microphone.lock().await;
            if !capture.is_available().await {
                return Err(SessionError::Unavailable(format!(
                    "{} audio input is not available",
                    capture.name()
                )));
            }
        }

        let source = Arc::clone(&self.shared.microphone);
        self.launch(SessionKind::Speech, source, locale, options)
            .await
    }

    /// Transcribe a WAV file through the recognition engine
    ///
    /// Emits the `transcription-*` notifications and shares the single-session slot with
    /// live recognition. No microphone permission is needed.
    pub async fn start_transcription(
        &self,
        path: impl AsRef<Path>,
        locale: &str,
        options: RecognitionOptions,
    ) -> Result<(), SessionError> {
        let path = path.as_ref();
        let locale = self.resolve_start_locale(locale)?;

        if !path.is_file() {
            return Err(SessionError::Unavailable(format!(
                "audio file not found: {}",
                path.display()
            )));
        }
        self.check_engine().await?;

        let capture: Box<dyn AudioCapture> =
            Box::new(WavFileCapture::new(path, TRANSCRIPTION_BUFFER_MS).unpaced());
        let source = Arc::new(tokio::sync::Mutex::new(capture));
        self.launch(SessionKind::Transcription, source, locale, options)
            .await
    }

    /// End live recognition, letting the engine finish with the audio it has; idempotent
    pub async fn stop(&self) {
        self.request_teardown(EndReason::Stopped, Some(SessionKind::Speech))
            .await;
    }

    /// End live recognition without waiting for a result; idempotent
    pub async fn cancel(&self) {
        self.request_teardown(EndReason::Cancelled, Some(SessionKind::Speech))
            .await;
    }

    pub async fn stop_transcription(&self) {
        self.request_teardown(EndReason::Stopped, Some(SessionKind::Transcription))
            .await;
    }

    pub async fn cancel_transcription(&self) {
        self.request_teardown(EndReason::Cancelled, Some(SessionKind::Transcription))
            .await;
    }

    /// Cancel a running transcription and wait until idle
    pub async fn destroy_transcription(&self) {
        self.cancel_transcription().await;
        debug!("Transcription destroyed");
    }

    /// Cancel whatever is live and wait until idle
    pub async fn destroy(&self) {
        self.request_teardown(EndReason::Cancelled, None).await;
        debug!("Session controller destroyed");
    }

    fn resolve_start_locale(&self, locale: &str) -> Result<String, SessionError> {
        let inner = self.lock();
        if let Some(session) = &inner.session {
            warn!("Rejecting start: {} is {}", session.id, session.state);
            return Err(SessionError::AlreadyRunning);
        }
        Ok(locale::resolve(locale, &inner.locale))
    }

    async fn check_permission(&self, options: &RecognitionOptions) -> Result<(), SessionError> {
        match self.shared.permission.status().await {
            PermissionStatus::Granted => Ok(()),
            PermissionStatus::Denied if options.request_permissions_auto => {
                info!("Requesting microphone permission");
                match self.shared.permission.request().await {
                    PermissionStatus::Granted => Ok(()),
                    PermissionStatus::Denied => Err(SessionError::Permission(
                        "microphone permission request was denied".to_string(),
                    )),
                }
            }
            PermissionStatus::Denied => Err(SessionError::Permission(
                "microphone permission is required but not granted".to_string(),
            )),
        }
    }

    async fn check_engine(&self) -> Result<(), SessionError> {
        if self.shared.engine.is_available().await {
            Ok(())
        } else {
            Err(SessionError::Unavailable(format!(
                "{} recognition engine is not available",
                self.shared.engine.name()
            )))
        }
    }

    /// Claim the session slot and acquire the adapters on a task of their own
    async fn launch(
        &self,
        kind: SessionKind,
        source: SharedCapture,
        locale: String,
        options: RecognitionOptions,
    ) -> Result<(), SessionError> {
        let (id, halt) = {
            let mut inner = self.lock();
            if inner.session.is_some() {
                return Err(SessionError::AlreadyRunning);
            }
            let session = Session::new(kind, locale.clone(), options.clone(), Arc::clone(&source));
            let started = (session.id, Arc::clone(&session.halt));
            inner.session = Some(session);
            started
        };

        info!("Starting {} {} ({})", kind, id, locale);

        let acquisition = tokio::spawn(self.clone().acquire(id, source, locale, options, halt));

        match acquisition.await {
            Ok(result) => result,
            Err(e) => {
                error!("Acquisition for {} did not complete: {}", id, e);
                let error = SessionError::Unavailable(format!("acquisition aborted: {}", e));
                self.abort_start(id, error, None).await
            }
        }
    }

    async fn acquire(
        self,
        id: SessionId,
        source: SharedCapture,
        locale: String,
        options: RecognitionOptions,
        halt: Arc<Notify>,
    ) -> Result<(), SessionError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let request = match self
            .shared
            .engine
            .begin_request(&locale, &options, EngineTap::new(id, tx.clone()))
            .await
        {
            Ok(request) => request,
            Err(e) => return self.abort_start(id, e, None).await,
        };

        let capture = {
            let mut capture = source.lock().await;
            capture.start(CaptureTap::new(id, tx)).await
        };
        let capture = match capture {
            Ok(capture) => capture,
            Err(e) => return self.abort_start(id, e, Some(request)).await,
        };

        if let Some(job) = self.install(id, &source, capture, request) {
            info!("Stop requested while {} was starting", id);
            self.finish_teardown(job).await;
            return Ok(());
        }

        tokio::spawn(self.clone().pump(id, rx, halt));

        info!("Recognition {} started", id);

        Ok(())
    }

    /// Hand acquired resources to the session, or back for release if it is ending
    fn install(
        &self,
        id: SessionId,
        source: &SharedCapture,
        capture: CaptureHandle,
        request: RequestHandle,
    ) -> Option<Teardown> {
        let mut inner = self.lock();

        let Some(session) = inner.session.as_mut().filter(|session| session.id == id) else {
            warn!("{} vanished during start, releasing resources", id);
            return Some(Teardown {
                session: id,
                reason: EndReason::Stopped,
                capture: Some((Arc::clone(source), capture)),
                request: Some(request),
            });
        };

        session.acquiring = false;

        if session.teardown_requested {
            return Some(session.handoff(Some(capture), Some(request)));
        }

        session.capture = Some(capture);
        session.request = Some(request);
        None
    }

    /// `Starting -> Failed` after an adapter refused to start
    ///
    /// When the caller already ended the session their reason stands and the start counts
    /// as successful, same as an acquisition that completes after `stop`.
    async fn abort_start(
        &self,
        id: SessionId,
        error: SessionError,
        request: Option<RequestHandle>,
    ) -> Result<(), SessionError> {
        let (job, ended_by_caller) = {
            let mut inner = self.lock();
            let Inner {
                session, outbox, ..
            } = &mut *inner;

            match session.as_mut().filter(|session| session.id == id) {
                Some(session) if session.teardown_requested => {
                    session.acquiring = false;
                    debug!("{} failed to start after it was ended: {}", id, error);
                    (session.handoff(None, request), true)
                }
                Some(session) => {
                    session.acquiring = false;
                    let mut job = session.fail(outbox, error.clone());
                    job.request = request;
                    (job, false)
                }
                None => (
                    Teardown {
                        session: id,
                        reason: EndReason::Failed,
                        capture: None,
                        request,
                    },
                    false,
                ),
            }
        };

        self.finish_teardown(job).await;

        if ended_by_caller {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// `kind` limits the request to sessions of that kind; `None` ends anything
    async fn request_teardown(&self, reason: EndReason, kind: Option<SessionKind>) {
        let (job, mut done) = {
            let mut inner = self.lock();
            let Some(session) = inner.session.as_mut() else {
                debug!("No active session to end");
                return;
            };
            if kind.is_some_and(|kind| kind != session.kind) {
                debug!("{} is not a {} session, leaving it running", session.id, session.kind);
                return;
            }

            let done = session.done.subscribe();
            if session.teardown_requested {
                debug!("{} is already ending", session.id);
                (None, done)
            } else {
                info!("Ending {} ({:?})", session.id, reason);
                if reason == EndReason::Cancelled {
                    session.final_result_expected = false;
                }
                let job = session.begin_teardown(SessionState::Stopping, reason);
                // While acquiring, the acquisition task releases whatever it obtains
                ((!session.acquiring).then_some(job), done)
            }
        };

        if let Some(job) = job {
            let this = self.clone();
            tokio::spawn(async move { this.finish_teardown(job).await });
        }

        // Err means the session was already cleared
        let _ = done.wait_for(|finished| *finished).await;
        self.flush();
    }

    /// Release resources, queue the end notification and return to idle
    async fn finish_teardown(&self, job: Teardown) {
        if let Some((source, handle)) = &job.capture {
            let mut capture = source.lock().await;
            capture.stop(handle).await;
        }

        if let Some(request) = &job.request {
            match job.reason {
                EndReason::Completed | EndReason::Stopped => {
                    self.shared.engine.finish(request).await
                }
                EndReason::Cancelled | EndReason::Failed => {
                    self.shared.engine.cancel(request).await
                }
            }
        }

        {
            let mut inner = self.lock();
            let Inner {
                session, outbox, ..
            } = &mut *inner;

            match session.take() {
                Some(ended) if ended.id == job.session => {
                    outbox.push(end_notification(ended.kind, job.reason));
                    ended.halt.notify_one();
                    ended.done.send_replace(true);
                    info!(
                        "{} ended ({:?}) after {} buffers",
                        ended.id, job.reason, ended.buffers_fed
                    );
                }
                other => *session = other,
            }
        }

        self.flush();
    }

    async fn pump(self, id: SessionId, mut rx: mpsc::UnboundedReceiver<Envelope>, halt: Arc<Notify>) {
        debug!("Event pump for {} started", id);

        loop {
            tokio::select! {
                biased;
                _ = halt.notified() => break,
                envelope = rx.recv() => {
                    let Some(envelope) = envelope else {
                        debug!("All adapters for {} hung up", id);
                        break;
                    };
                    let job = self.dispatch(envelope);
                    self.flush();
                    if let Some(job) = job {
                        self.finish_teardown(job).await;
                        break;
                    }
                }
            }
        }

        debug!("Event pump for {} stopped", id);
    }

    /// Apply one adapter event; returns the teardown to run when it ends the session
    fn dispatch(&self, envelope: Envelope) -> Option<Teardown> {
        let mut inner = self.lock();
        let Inner {
            session, outbox, ..
        } = &mut *inner;

        let Some(session) = session.as_mut() else {
            debug!("Dropping {} for {}: idle", envelope.event.name(), envelope.session);
            return None;
        };

        // Teardown intent is checked before anything else is touched
        if session.id != envelope.session || session.teardown_requested {
            debug!(
                "Dropping {} for {}: teardown requested",
                envelope.event.name(),
                envelope.session
            );
            return None;
        }

        match envelope.event {
            SessionEvent::Buffer(frame) => {
                session.mark_listening(outbox);

                let fed = match &session.request {
                    Some(request) => self.shared.engine.feed(request, &frame),
                    None => Ok(()),
                };
                if let Err(e) = fed {
                    return Some(session.fail(outbox, e));
                }

                session.buffers_fed += 1;
                session.audio_ms += frame.duration_ms();
                session.level = AudioLevel::measure(&frame);
                trace!(
                    "{} level {:.1}/{:.1} dB",
                    session.id,
                    session.level.channel0,
                    session.level.channel1
                );
                if session.kind == SessionKind::Speech {
                    outbox.push(Notification::SpeechVolumeChanged {
                        channel0: session.level.channel0,
                        channel1: session.level.channel1,
                    });
                }
                None
            }
            SessionEvent::CaptureEnded => {
                if session.audio_ended {
                    return None;
                }
                session.audio_ended = true;
                info!(
                    "{} audio input ended after {} buffers, awaiting result",
                    session.id, session.buffers_fed
                );

                let ended = match &session.request {
                    Some(request) => self.shared.engine.end_audio(request),
                    None => Ok(()),
                };
                match ended {
                    Ok(()) => None,
                    Err(e) => Some(session.fail(outbox, e)),
                }
            }
            SessionEvent::EngineReady => {
                session.mark_listening(outbox);
                None
            }
            SessionEvent::Recognized { is_final } => {
                session.mark_listening(outbox);
                if session.kind == SessionKind::Speech {
                    outbox.push(Notification::SpeechRecognized { is_final });
                }
                None
            }
            SessionEvent::Partial(text) => {
                session.mark_listening(outbox);
                if session.options.partial_results {
                    session.partial_results += 1;
                    outbox.push(session.partial(text));
                } else {
                    trace!("{} partial results disabled, dropping", session.id);
                }
                None
            }
            SessionEvent::Final(alternatives) => {
                session.mark_listening(outbox);
                info!("{} final result received", session.id);
                outbox.push(session.results(alternatives));
                session.final_result_expected = false;
                Some(session.begin_teardown(SessionState::Stopping, EndReason::Completed))
            }
            SessionEvent::EngineFailed { code, message } => {
                Some(session.fail(outbox, SessionError::Engine { code, message }))
            }
            SessionEvent::CaptureFailed(message) => {
                Some(session.fail(outbox, SessionError::Capture(message)))
            }
        }
    }
}
