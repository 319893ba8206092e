//! Error types for generation calls.

use std::time::Duration;

use parley_core::error::ParleyError;

/// Why a generation call produced nothing usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("generation transport error: {0}")]
    Transport(String),
    #[error("generation service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed generation response: {0}")]
    Malformed(String),
    #[error("generation response was empty")]
    Empty,
    #[error("generation response too short to use ({len} characters)")]
    LowConfidence { len: usize },
    #[error("generation service unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Classify an HTTP status into a `Status` error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        GenerationError::Status {
            status,
            message: message.into(),
        }
    }

    /// Whether a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Timeout(_) | GenerationError::Transport(_) => true,
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<GenerationError> for ParleyError {
    fn from(err: GenerationError) -> Self {
        ParleyError::Generation(err.to_string())
    }
}
