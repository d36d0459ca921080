//! Sample-rate and channel conversion for outbound audio
//!
//! Rate conversion goes through rubato's FFT resampler. It is stateful, so frames are
//! buffered until a full resampler chunk is available and a call may return an empty
//! frame; [`Resampler::flush`] drains the remainder at end of stream.

use anyhow::Result;
use rubato::{FftFixedIn, Resampler as _};

use super::frame::AudioFrame;

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Converts a stream of frames to one sample rate and channel count
pub struct Resampler {
    sample_rate: u32,
    channels: u16,
    stage: Option<Stage>,
    last_timestamp_ms: u64,
}

struct Stage {
    from: u32,
    to: u32,
    inner: FftFixedIn<f32>,
    /// Deinterleaved input waiting for a full chunk, one lane per channel
    pending: Vec<Vec<f32>>,
    /// Leading output frames that are only filter delay
    skip: usize,
    frames_in: u64,
    frames_out: u64,
}

impl Resampler {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            stage: None,
            last_timestamp_ms: 0,
        }
    }

    /// Convert one frame; the result carries whatever output is ready so far
    pub fn process(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        self.last_timestamp_ms = frame.timestamp_ms;
        let mixed = remix(&frame.samples, frame.channels, self.channels);

        // Input rate changed mid-stream: drain what the old stage still holds
        let rate_changed = self
            .stage
            .as_ref()
            .is_some_and(|stage| stage.from != frame.sample_rate);
        let mut samples = if rate_changed {
            self.drain_stage()?
        } else {
            Vec::new()
        };

        if frame.sample_rate == self.sample_rate || frame.sample_rate == 0 {
            samples.extend(mixed);
            return Ok(self.frame(samples, frame.timestamp_ms));
        }

        if self.stage.is_none() {
            self.stage = Some(Stage::new(
                frame.sample_rate,
                self.sample_rate,
                usize::from(self.channels),
            )?);
        }
        if let Some(stage) = self.stage.as_mut() {
            stage.push(&mixed);
            samples.extend(stage.ready()?);
        }

        Ok(self.frame(samples, frame.timestamp_ms))
    }

    /// Drain buffered input at end of stream
    pub fn flush(&mut self) -> Result<AudioFrame> {
        let samples = self.drain_stage()?;
        Ok(self.frame(samples, self.last_timestamp_ms))
    }

    fn drain_stage(&mut self) -> Result<Vec<i16>> {
        match self.stage.take() {
            Some(mut stage) => stage.finish(),
            None => Ok(Vec::new()),
        }
    }

    fn frame(&self, samples: Vec<i16>, timestamp_ms: u64) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_ms,
        }
    }
}

impl Stage {
    fn new(from: u32, to: u32, channels: usize) -> Result<Self> {
        let inner = FftFixedIn::<f32>::new(from as usize, to as usize, CHUNK, SUB_CHUNKS, channels)?;
        let skip = inner.output_delay();

        Ok(Self {
            from,
            to,
            inner,
            pending: vec![Vec::new(); channels],
            skip,
            frames_in: 0,
            frames_out: 0,
        })
    }

    fn pending_frames(&self) -> usize {
        self.pending.first().map_or(0, Vec::len)
    }

    fn push(&mut self, interleaved: &[i16]) {
        let channels = self.pending.len();
        for frame in interleaved.chunks_exact(channels) {
            for (lane, &sample) in self.pending.iter_mut().zip(frame) {
                lane.push(f32::from(sample) / 32768.0);
            }
        }
        self.frames_in += (interleaved.len() / channels) as u64;
    }

    /// Run every full chunk that is buffered
    fn ready(&mut self) -> Result<Vec<i16>> {
        let mut out = Vec::new();

        while self.pending_frames() >= self.inner.input_frames_next() {
            let needed = self.inner.input_frames_next();
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|lane| lane.drain(..needed).collect())
                .collect();
            let block = self.inner.process(&chunk, None)?;
            self.emit(&block, &mut out, None);
        }

        Ok(out)
    }

    /// Push the partial tail and the filter delay through, trimmed to the exact length
    fn finish(&mut self) -> Result<Vec<i16>> {
        let mut out = Vec::new();
        let expected = (self.frames_in as f64 * f64::from(self.to) / f64::from(self.from)).round() as u64;

        if self.pending_frames() > 0 {
            let rest: Vec<Vec<f32>> = self.pending.iter_mut().map(std::mem::take).collect();
            let block = self.inner.process_partial(Some(rest.as_slice()), None)?;
            self.emit(&block, &mut out, Some(expected));
        }

        let block = self.inner.process_partial(None::<&[Vec<f32>]>, None)?;
        self.emit(&block, &mut out, Some(expected));

        Ok(out)
    }

    fn emit(&mut self, block: &[Vec<f32>], out: &mut Vec<i16>, limit: Option<u64>) {
        let frames = block.first().map_or(0, Vec::len);

        for i in 0..frames {
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            if limit.is_some_and(|limit| self.frames_out >= limit) {
                break;
            }
            for lane in block {
                out.push(to_i16(lane[i]));
            }
            self.frames_out += 1;
        }
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Change the channel count of interleaved samples
///
/// Folding to mono averages every channel; mono is duplicated onto each output channel;
/// otherwise the leading channels are kept and missing ones repeat the last input channel.
pub fn remix(samples: &[i16], from: u16, to: u16) -> Vec<i16> {
    let from = usize::from(from.max(1));
    let to = usize::from(to.max(1));
    if from == to {
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            out.push((sum / from as i32) as i16);
        } else {
            for channel in 0..to {
                out.push(frame[channel.min(from - 1)]);
            }
        }
    }
    out
}
