use anyhow::Result;
use serde::Deserialize;

use crate::engine::RecognitionOptions;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognition: RecognitionConfig,
    pub audio: AudioConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "loqa-voice".to_string(),
        }
    }
}

/// Defaults applied to every recognition session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Locale used when `start` is given an empty one
    pub locale: String,
    pub partial_results: bool,
    pub requires_on_device_recognition: bool,
    pub max_results: u32,
    pub request_permissions_auto: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        let options = RecognitionOptions::default();
        Self {
            locale: "en-US".to_string(),
            partial_results: options.partial_results,
            requires_on_device_recognition: options.requires_on_device_recognition,
            max_results: options.max_results,
            request_permissions_auto: options.request_permissions_auto,
        }
    }
}

impl RecognitionConfig {
    pub fn options(&self) -> RecognitionOptions {
        RecognitionOptions {
            partial_results: self.partial_results,
            requires_on_device_recognition: self.requires_on_device_recognition,
            max_results: self.max_results,
            request_permissions_auto: self.request_permissions_auto,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // STT services expect 16kHz
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
    /// Audio frames go to `<prefix>.<request id>`
    pub audio_subject_prefix: String,
    pub transcript_subject: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            audio_subject_prefix: "audio.frame".to_string(),
            transcript_subject: "stt.>".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (extension optional) with `LOQA_VOICE__SECTION__KEY` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LOQA_VOICE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
