pub mod backend;
pub mod file;
pub mod frame;
pub mod resample;

pub use backend::{AudioCapture, CaptureHandle, CaptureTap};
pub use file::{AudioFile, WavFileCapture};
pub use frame::{AudioFrame, AudioLevel, SILENCE_DB};
pub use resample::{remix, Resampler};
