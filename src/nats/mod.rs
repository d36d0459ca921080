pub mod client;
pub mod messages;

pub use client::{decode_inbound, AudioEncoder, InboundEvent, NatsEngine};
pub use messages::{AudioFrameMessage, RecognitionErrorMessage, TranscriptMessage};
