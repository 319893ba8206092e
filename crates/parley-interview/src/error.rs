//! Error types for interview sessions.

use crate::types::SessionState;

/// Errors reported to the caller of a session.
///
/// Generation failures never appear here; they are absorbed by the
/// rule-based composer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        state: SessionState,
        operation: &'static str,
    },
    #[error("could not transcribe your answer, please try again: {0}")]
    Transcription(String),
}
