use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine as _;
use futures::stream::StreamExt;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::messages::{AudioFrameMessage, RecognitionErrorMessage, TranscriptMessage};
use crate::audio::{AudioFrame, Resampler};
use crate::config::{AudioConfig, NatsConfig};
use crate::engine::{EngineTap, RecognitionEngine, RecognitionOptions, RequestHandle};
use crate::error::SessionError;

/// Result message decoded from the transcript subjects
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Partial(String),
    /// Best transcript first, followed by distinct alternatives
    Final(Vec<String>),
    Error { code: String, message: String },
}

/// Decode a message for `request_id`; `None` for other requests or unparsable payloads
///
/// `stt.error*` subjects carry [`RecognitionErrorMessage`], everything else a
/// [`TranscriptMessage`].
pub fn decode_inbound(subject: &str, payload: &[u8], request_id: &str) -> Option<InboundEvent> {
    if subject.starts_with("stt.error") {
        return match serde_json::from_slice::<RecognitionErrorMessage>(payload) {
            Ok(err) if err.session_id == request_id => Some(InboundEvent::Error {
                code: err.code,
                message: err.message,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to parse recognition error message: {}", e);
                None
            }
        };
    }

    match serde_json::from_slice::<TranscriptMessage>(payload) {
        Ok(transcript) if transcript.session_id == request_id => {
            if transcript.partial {
                Some(InboundEvent::Partial(transcript.text))
            } else {
                let mut alternatives = vec![transcript.text];
                for alternative in transcript.alternatives {
                    if !alternatives.contains(&alternative) {
                        alternatives.push(alternative);
                    }
                }
                Some(InboundEvent::Final(alternatives))
            }
        }
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to parse transcript message: {}", e);
            None
        }
    }
}

enum Outbound {
    Frame(AudioFrame),
    End,
}

struct ActiveRequest {
    handle_id: u64,
    request_id: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    publisher: JoinHandle<()>,
    listener: JoinHandle<()>,
}

/// Server-side recognition over NATS
///
/// Audio is published to `<audio_subject_prefix>.<request id>` as base64 PCM; results come
/// back on the transcript subjects (`stt.text.partial`, `stt.text.final`, `stt.error`) and
/// are filtered by request id.
pub struct NatsEngine {
    client: Client,
    url: String,
    audio_subject_prefix: String,
    transcript_subject: String,
    sample_rate: u32,
    channels: u16,
    active: Mutex<Option<ActiveRequest>>,
}

impl NatsEngine {
    /// Connect to NATS server
    pub async fn connect(nats: &NatsConfig, audio: &AudioConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", nats.url);

        let client = async_nats::connect(nats.url.as_str())
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            url: nats.url.clone(),
            audio_subject_prefix: nats.audio_subject_prefix.clone(),
            transcript_subject: nats.transcript_subject.clone(),
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            active: Mutex::new(None),
        })
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveRequest>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove the active request if `request` still owns it
    fn take_active(&self, request: &RequestHandle) -> Option<ActiveRequest> {
        let mut active = self.active();
        match active.as_ref() {
            Some(current) if current.handle_id == request.id() => active.take(),
            _ => None,
        }
    }

    fn spawn_publisher(
        &self,
        mut encoder: AudioEncoder,
        mut outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> JoinHandle<()> {
        let client = self.client.clone();
        let subject = format!("{}.{}", self.audio_subject_prefix, encoder.request_id);

        tokio::spawn(async move {
            while let Some(item) = outbound.recv().await {
                let (messages, final_frame): (Result<Vec<AudioFrameMessage>>, bool) = match item {
                    Outbound::Frame(frame) => {
                        (encoder.frame(&frame).map(|m| m.into_iter().collect()), false)
                    }
                    Outbound::End => (encoder.end(), true),
                };
                let messages = match messages {
                    Ok(messages) => messages,
                    Err(e) => {
                        error!("Failed to resample audio for {}: {:#}", encoder.request_id, e);
                        break;
                    }
                };

                for message in messages {
                    match serde_json::to_vec(&message) {
                        Ok(payload) => {
                            if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                                error!("Failed to publish audio frame: {}", e);
                            }
                        }
                        Err(e) => error!("Failed to encode audio frame: {}", e),
                    }
                }

                if final_frame {
                    debug!("Published final frame marker for {}", encoder.request_id);
                    break;
                }
            }
        })
    }
}

/// Turns captured frames into the audio messages of one request
///
/// Frames are converted to the service format by a streaming [`Resampler`], and each
/// message is labelled with the format of the samples it actually carries. The first
/// message also carries the request's locale and `max_results`.
pub struct AudioEncoder {
    request_id: String,
    resampler: Resampler,
    sequence: u32,
    settings: Option<(String, u32)>,
}

impl AudioEncoder {
    pub fn new(
        request_id: impl Into<String>,
        sample_rate: u32,
        channels: u16,
        locale: impl Into<String>,
        max_results: u32,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            resampler: Resampler::new(sample_rate, channels),
            sequence: 0,
            settings: Some((locale.into(), max_results)),
        }
    }

    /// Message for one captured frame; `None` while the resampler is still filling
    pub fn frame(&mut self, frame: &AudioFrame) -> Result<Option<AudioFrameMessage>> {
        let processed = self.resampler.process(frame)?;
        if processed.samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.message(&processed, false)))
    }

    /// Remaining audio followed by the final marker
    pub fn end(&mut self) -> Result<Vec<AudioFrameMessage>> {
        let rest = self.resampler.flush()?;
        let mut messages = Vec::new();
        if !rest.samples.is_empty() {
            messages.push(self.message(&rest, false));
        }

        let marker = AudioFrame {
            samples: Vec::new(),
            ..rest
        };
        messages.push(self.message(&marker, true));
        Ok(messages)
    }

    fn message(&mut self, frame: &AudioFrame, final_frame: bool) -> AudioFrameMessage {
        let (locale, max_results) = self.settings.take().unzip();
        let message = AudioFrameMessage {
            session_id: self.request_id.clone(),
            sequence: self.sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(frame.pcm_bytes()),
            sample_rate: frame.sample_rate,
            channels: frame.channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame,
            locale,
            max_results,
        };
        self.sequence = self.sequence.wrapping_add(1);
        message
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for NatsEngine {
    async fn is_available(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    async fn services(&self) -> Vec<String> {
        vec![format!("nats:{}", self.url)]
    }

    async fn begin_request(
        &self,
        locale: &str,
        options: &RecognitionOptions,
        tap: EngineTap,
    ) -> Result<RequestHandle, SessionError> {
        if options.requires_on_device_recognition {
            return Err(SessionError::Unavailable(
                "on-device recognition is not supported by the NATS engine".to_string(),
            ));
        }

        if self.active().is_some() {
            return Err(SessionError::Unavailable("RecognitionService busy".to_string()));
        }

        let request_id = format!("speech-{}", uuid::Uuid::new_v4());

        info!("Subscribing to transcripts on {}", self.transcript_subject);

        let mut subscriber = self
            .client
            .subscribe(self.transcript_subject.clone())
            .await
            .map_err(|e| SessionError::Unavailable(format!("Failed to subscribe: {}", e)))?;

        let listener_request_id = request_id.clone();
        let listener = tokio::spawn(async move {
            tap.ready();

            while let Some(msg) = subscriber.next().await {
                let subject: &str = &msg.subject;
                let Some(event) = decode_inbound(subject, &msg.payload, &listener_request_id)
                else {
                    continue;
                };

                let delivered = match event {
                    InboundEvent::Partial(text) => tap.partial(text),
                    InboundEvent::Final(alternatives) => {
                        tap.final_results(alternatives);
                        break;
                    }
                    InboundEvent::Error { code, message } => {
                        tap.error(code, message);
                        break;
                    }
                };

                if !delivered {
                    break;
                }
            }

            debug!("Transcript listener for {} stopped", listener_request_id);
        });

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let encoder = AudioEncoder::new(
            request_id.clone(),
            self.sample_rate,
            self.channels,
            locale,
            options.max_results,
        );
        let publisher = self.spawn_publisher(encoder, outbound_rx);

        let handle = RequestHandle::next();

        info!(
            "Recognition request {} opened ({}, max_results={})",
            request_id, locale, options.max_results
        );

        *self.active() = Some(ActiveRequest {
            handle_id: handle.id(),
            request_id,
            outbound,
            publisher,
            listener,
        });

        Ok(handle)
    }

    fn feed(&self, request: &RequestHandle, frame: &AudioFrame) -> Result<(), SessionError> {
        let active = self.active();
        let current = active
            .as_ref()
            .filter(|current| current.handle_id == request.id())
            .ok_or_else(|| SessionError::engine("client", "no active recognition request"))?;

        current
            .outbound
            .send(Outbound::Frame(frame.clone()))
            .map_err(|_| SessionError::engine("client", "audio publisher stopped"))
    }

    fn end_audio(&self, request: &RequestHandle) -> Result<(), SessionError> {
        let active = self.active();
        let current = active
            .as_ref()
            .filter(|current| current.handle_id == request.id())
            .ok_or_else(|| SessionError::engine("client", "no active recognition request"))?;

        debug!("Audio for {} ended, awaiting final transcript", current.request_id);
        current
            .outbound
            .send(Outbound::End)
            .map_err(|_| SessionError::engine("client", "audio publisher stopped"))
    }

    async fn finish(&self, request: &RequestHandle) {
        if let Some(active) = self.take_active(request) {
            info!("Ending recognition request {}", active.request_id);
            // The publisher flushes the marker and exits on its own
            let _ = active.outbound.send(Outbound::End);
            active.listener.abort();
        }
    }

    async fn cancel(&self, request: &RequestHandle) {
        if let Some(active) = self.take_active(request) {
            info!("Cancelling recognition request {}", active.request_id);
            active.publisher.abort();
            active.listener.abort();
        }
    }

    fn name(&self) -> &str {
        "NATS"
    }
}
