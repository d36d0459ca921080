//! Recognition engine capability
//!
//! The controller depends only on [`RecognitionEngine`]. Concrete engines live next to
//! their transport (see [`crate::nats::NatsEngine`] for the server-side one).

mod backend;

pub use backend::{EngineTap, RecognitionEngine, RecognitionOptions, RequestHandle};
