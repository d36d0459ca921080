use crate::session::SessionState;

/// Errors surfaced by the session controller and its capability adapters.
///
/// Adapter failures never escape the controller as panics: they come back either as the
/// `Err` of a command or as a forwarded `speech-error` notification carrying [`code`].
///
/// [`code`]: SessionError::code
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("a recognition session is already running")]
    AlreadyRunning,

    #[error("speech recognition unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("recognition engine error ({code}): {message}")]
    Engine { code: String, message: String },

    #[error("audio capture error: {0}")]
    Capture(String),
}

impl SessionError {
    pub fn engine(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Engine {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable kind string used in `speech-error` notifications
    pub fn code(&self) -> &str {
        match self {
            Self::AlreadyRunning => "already-running",
            Self::Unavailable(_) => "unavailable",
            Self::Permission(_) => "permission",
            Self::InvalidState { .. } => "invalid-state",
            Self::Engine { code, .. } => code,
            Self::Capture(_) => "audio",
        }
    }

    /// Human readable detail without the kind prefix
    pub fn message(&self) -> String {
        match self {
            Self::Engine { message, .. } => message.clone(),
            Self::Unavailable(msg) | Self::Permission(msg) | Self::Capture(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
