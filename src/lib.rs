pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod locale;
pub mod nats;
pub mod permission;
pub mod session;
pub mod sink;

pub use audio::{
    AudioCapture, AudioFile, AudioFrame, AudioLevel, CaptureHandle, CaptureTap, Resampler,
    WavFileCapture, SILENCE_DB,
};
pub use config::Config;
pub use engine::{EngineTap, RecognitionEngine, RecognitionOptions, RequestHandle};
pub use error::SessionError;
pub use nats::{AudioFrameMessage, NatsEngine, TranscriptMessage};
pub use permission::{PermissionGate, PermissionStatus, StaticPermission};
pub use session::{
    SessionController, SessionId, SessionKind, SessionSnapshot, SessionState, SessionStats,
};
pub use sink::{
    ChannelSink, EndReason, EventSink, Notification, TracingSink, TranscriptionSegment,
};
