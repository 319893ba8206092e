//! Conversational interview engine for Parley.
//!
//! Conducts a bounded, multi-turn interview: extracts signals from the
//! respondent's answers, decides when enough has been gathered, and composes
//! the next question through a generation service with a deterministic
//! fallback.

pub mod bullets;
pub mod clock;
pub mod composer;
pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod signals;
pub mod types;
pub mod voice;

pub use bullets::BulletDrafter;
pub use clock::{ManualClock, MonotonicClock, SessionClock, SystemClock};
pub use composer::FollowUpComposer;
pub use error::SessionError;
pub use orchestrator::InterviewSession;
pub use policy::TerminationPolicy;
pub use signals::ContextSignalExtractor;
pub use types::{
    FinalizeResult, FollowUp, FollowUpSource, InterviewerMessage, SessionSnapshot, SessionState,
    SubmitOutcome,
};
pub use voice::VoiceInterface;
