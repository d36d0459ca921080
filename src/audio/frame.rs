use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::resample::Resampler;

/// Power reported for digital silence, matching the -160 dB floor of platform meters
pub const SILENCE_DB: f32 = -160.0;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        frames * 1000 / self.sample_rate as u64
    }

    /// Convert a standalone frame to the format a recogniser expects
    ///
    /// Streams should keep one [`Resampler`] instead, so rate conversion carries its
    /// state across frame boundaries.
    pub fn to_format(&self, target_sample_rate: u32, target_channels: u16) -> Result<AudioFrame> {
        let mut resampler = Resampler::new(target_sample_rate, target_channels);
        let mut converted = resampler.process(self)?;
        converted.samples.extend(resampler.flush()?.samples);
        Ok(converted)
    }

    /// Little-endian PCM bytes
    pub fn pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Average power of the first two channels, in dBFS
///
/// Mono frames report the same reading on both channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioLevel {
    pub channel0: f32,
    pub channel1: f32,
}

impl Default for AudioLevel {
    fn default() -> Self {
        Self {
            channel0: SILENCE_DB,
            channel1: SILENCE_DB,
        }
    }
}

impl AudioLevel {
    pub fn measure(frame: &AudioFrame) -> Self {
        let channels = frame.channels.max(1) as usize;
        let channel0 = channel_power(&frame.samples, 0, channels);
        let channel1 = if channels > 1 {
            channel_power(&frame.samples, 1, channels)
        } else {
            channel0
        };

        Self { channel0, channel1 }
    }
}

fn channel_power(samples: &[i16], channel: usize, stride: usize) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for sample in samples.iter().skip(channel).step_by(stride) {
        let normalized = *sample as f64 / 32768.0;
        sum += normalized * normalized;
        count += 1;
    }

    if count == 0 || sum == 0.0 {
        return SILENCE_DB;
    }

    let rms = (sum / count as f64).sqrt();
    ((20.0 * rms.log10()) as f32).max(SILENCE_DB)
}
