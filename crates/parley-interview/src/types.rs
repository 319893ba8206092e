use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_core::types::{SignalSet, TerminationReason, Transcript};

/// Lifecycle of an interview session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, `start` not yet called.
    Idle,
    /// Accepting respondent turns.
    Active,
    /// Writing the closing message.
    Finalizing,
    /// Finished; no further operations are valid.
    Done,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Active => "active",
            SessionState::Finalizing => "finalizing",
            SessionState::Done => "done",
        };
        f.write_str(s)
    }
}

/// A message the interviewer says to the respondent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewerMessage {
    pub text: String,
}

/// Which tier of the composer produced a follow-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpSource {
    Generated,
    Fallback,
}

/// A composed follow-up question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub text: String,
    pub source: FollowUpSource,
}

/// Everything a downstream consumer needs from a finished interview.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalizeResult {
    pub session_id: Uuid,
    pub reason: TerminationReason,
    /// Full transcript, closing message included.
    pub transcript: Transcript,
    pub signals: SignalSet,
}

/// Result of a successful `submit_response`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Continue {
        message: InterviewerMessage,
        source: FollowUpSource,
    },
    Finalize(FinalizeResult),
}

impl SubmitOutcome {
    pub fn is_finalize(&self) -> bool {
        matches!(self, SubmitOutcome::Finalize(_))
    }
}

/// Read-only view of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub transcript: Transcript,
    pub elapsed_seconds: u64,
    pub respondent_turn_count: usize,
}
