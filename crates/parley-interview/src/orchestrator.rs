//! Interview session state machine.
//!
//! `Idle -> Active -> Finalizing -> Done`. Every operation is validated
//! against the current state before anything is mutated, so a rejected
//! call leaves the session exactly as it was.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use parley_core::config::ParleyConfig;
use parley_core::types::{
    ConversationTurn, SignalSet, TerminationDecision, TerminationReason, Transcript,
};

use crate::clock::{MonotonicClock, SessionClock, SystemClock};
use crate::composer::FollowUpComposer;
use crate::error::SessionError;
use crate::policy::TerminationPolicy;
use crate::signals::ContextSignalExtractor;
use crate::types::{
    FinalizeResult, InterviewerMessage, SessionSnapshot, SessionState, SubmitOutcome,
};

const GENERIC_OPENER: &str = "Hi! I'd love to hear about a project you're proud of. What did you build, and what was your role?";
const QUALITY_CLOSING: &str = "This is fantastic, thank you! You've shared the technologies you used and the measurable impact you had, which is exactly what makes strong resume bullets. I'll draft them now.";
const GENERIC_CLOSING: &str = "Thanks so much for walking me through your work! I have what I need to start drafting your resume bullets.";

/// Longest slice of prior context quoted back in the opener.
const OPENER_SNIPPET_CHARS: usize = 80;

/// One interview with one respondent.
pub struct InterviewSession {
    id: Uuid,
    state: SessionState,
    transcript: Transcript,
    signals: SignalSet,
    clock_source: Arc<dyn MonotonicClock>,
    clock: Option<SessionClock>,
    budget: Duration,
    extractor: ContextSignalExtractor,
    policy: TerminationPolicy,
    composer: FollowUpComposer,
    max_response_chars: usize,
}

impl InterviewSession {
    pub fn new(config: &ParleyConfig, composer: FollowUpComposer) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            transcript: Transcript::new(),
            signals: SignalSet::default(),
            clock_source: Arc::new(SystemClock::new()),
            clock: None,
            budget: Duration::from_secs(config.session.budget_secs),
            extractor: ContextSignalExtractor::new(),
            policy: TerminationPolicy::new(config.policy.clone()),
            composer,
            max_response_chars: config.session.max_response_chars,
        }
    }

    /// Replace the time source. Takes effect at `start`.
    pub fn with_clock(mut self, source: Arc<dyn MonotonicClock>) -> Self {
        self.clock_source = source;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Begin the interview and return the opening question.
    pub fn start(
        &mut self,
        prior_context: Option<&str>,
    ) -> Result<InterviewerMessage, SessionError> {
        self.require_state(SessionState::Idle, "start")?;

        self.clock = Some(SessionClock::start(self.clock_source.clone(), self.budget));
        let text = opener_for(prior_context);
        self.transcript.push(ConversationTurn::interviewer(text.clone()));
        self.state = SessionState::Active;

        tracing::info!(
            session_id = %self.id,
            budget_secs = self.budget.as_secs(),
            personalized = text != GENERIC_OPENER,
            "Interview started"
        );
        Ok(InterviewerMessage { text })
    }

    /// Record a respondent answer and decide what happens next.
    ///
    /// Absent or blank input is rejected without touching the session.
    pub async fn submit_response<'a>(
        &mut self,
        text: impl Into<Option<&'a str>>,
    ) -> Result<SubmitOutcome, SessionError> {
        self.require_state(SessionState::Active, "submit a response")?;
        let clock = self.clock.as_ref().ok_or(SessionError::InvalidState {
            state: self.state,
            operation: "submit a response",
        })?;

        let text = match text.into() {
            Some(t) if !t.trim().is_empty() => t,
            Some(_) => return Err(SessionError::InvalidInput("response is blank".to_string())),
            None => return Err(SessionError::InvalidInput("response is missing".to_string())),
        };

        let chars = text.chars().count();
        if chars > self.max_response_chars {
            tracing::debug!(
                session_id = %self.id,
                chars,
                limit = self.max_response_chars,
                "Oversized response accepted, prompts will be truncated"
            );
        }

        self.transcript.push(ConversationTurn::respondent(text));
        self.signals = self.extractor.extract(&self.transcript);

        let decision = self.policy.decide(&self.signals, clock);

        tracing::debug!(
            session_id = %self.id,
            turns = self.signals.respondent_turn_count,
            remaining_secs = clock.remaining().as_secs(),
            decision = ?decision,
            "Policy evaluated"
        );

        match decision {
            TerminationDecision::Continue => {
                let follow_up = self.composer.compose(&self.transcript, &self.signals).await;
                self.transcript
                    .push(ConversationTurn::interviewer(follow_up.text.clone()));
                Ok(SubmitOutcome::Continue {
                    message: InterviewerMessage {
                        text: follow_up.text,
                    },
                    source: follow_up.source,
                })
            }
            TerminationDecision::Finalize(reason) => {
                Ok(SubmitOutcome::Finalize(self.finalize(reason)))
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            transcript: self.transcript.clone(),
            elapsed_seconds: self
                .clock
                .as_ref()
                .map(|c| c.elapsed().as_secs())
                .unwrap_or(0),
            respondent_turn_count: self.signals.respondent_turn_count,
        }
    }

    fn finalize(&mut self, reason: TerminationReason) -> FinalizeResult {
        self.state = SessionState::Finalizing;
        let closing = match reason {
            TerminationReason::QualitySufficient => QUALITY_CLOSING,
            TerminationReason::TimeExceeded | TerminationReason::TurnCapReached => GENERIC_CLOSING,
        };
        self.transcript.push(ConversationTurn::interviewer(closing));
        self.state = SessionState::Done;

        tracing::info!(
            session_id = %self.id,
            reason = %reason,
            turns = self.signals.respondent_turn_count,
            "Interview finalized"
        );

        FinalizeResult {
            session_id: self.id,
            reason,
            transcript: self.transcript.clone(),
            signals: self.signals,
        }
    }

    fn require_state(
        &self,
        required: SessionState,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == required {
            Ok(())
        } else {
            tracing::warn!(
                session_id = %self.id,
                state = %self.state,
                operation,
                "Rejected call in wrong state"
            );
            Err(SessionError::InvalidState {
                state: self.state,
                operation,
            })
        }
    }
}

impl std::fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("turns", &self.transcript.len())
            .field("signals", &self.signals)
            .field("clock", &self.clock)
            .finish()
    }
}

fn opener_for(prior_context: Option<&str>) -> String {
    let snippet = prior_context
        .and_then(|ctx| ctx.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(|line| {
            let mut s: String = line.chars().take(OPENER_SNIPPET_CHARS).collect();
            if line.chars().count() > OPENER_SNIPPET_CHARS {
                s.push_str("...");
            }
            s
        });

    match snippet {
        Some(s) => format!(
            "Hi! I had a look at your background (\"{}\"). Pick one project from it you're proud of: what did you build, and what was your role?",
            s
        ),
        None => GENERIC_OPENER.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::FollowUpSource;
    use parley_core::config::GenerationConfig;
    use parley_core::types::Speaker;
    use parley_generation::{FailingGenerationService, MockGenerationService};

    fn session_with(manual: Arc<ManualClock>) -> InterviewSession {
        let composer = FollowUpComposer::new(
            Arc::new(FailingGenerationService::new()),
            &GenerationConfig::default(),
        );
        InterviewSession::new(&ParleyConfig::default(), composer).with_clock(manual)
    }

    fn started() -> (InterviewSession, Arc<ManualClock>) {
        let manual = Arc::new(ManualClock::new());
        let mut s = session_with(manual.clone());
        s.start(None).unwrap();
        (s, manual)
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = session_with(Arc::new(ManualClock::new()));
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.transcript().is_empty());
        assert_eq!(s.snapshot().elapsed_seconds, 0);
    }

    #[test]
    fn test_start_generic_opener() {
        let (s, _) = started();
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.transcript().len(), 1);
        let first = &s.transcript().turns()[0];
        assert_eq!(first.speaker, Speaker::Interviewer);
        assert_eq!(first.text, GENERIC_OPENER);
    }

    #[test]
    fn test_start_personalized_opener() {
        let mut s = session_with(Arc::new(ManualClock::new()));
        let msg = s
            .start(Some("\n  Senior engineer at Acme, payments platform\nMore lines"))
            .unwrap();
        assert!(msg.text.contains("Senior engineer at Acme, payments platform"));
        assert!(!msg.text.contains("More lines"));
    }

    #[test]
    fn test_blank_prior_context_is_generic() {
        let mut s = session_with(Arc::new(ManualClock::new()));
        assert_eq!(s.start(Some("   \n ")).unwrap().text, GENERIC_OPENER);
    }

    #[test]
    fn test_opener_snippet_clipped() {
        let text = opener_for(Some(&"a".repeat(500)));
        assert!(text.contains(&format!("{}...", "a".repeat(OPENER_SNIPPET_CHARS))));
    }

    #[test]
    fn test_start_twice_is_invalid_state() {
        let (mut s, _) = started();
        let err = s.start(None).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidState {
                state: SessionState::Active,
                ..
            }
        ));
        assert_eq!(s.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_before_start_is_invalid_state() {
        let mut s = session_with(Arc::new(ManualClock::new()));
        let err = s.submit_response("hello").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidState {
                state: SessionState::Idle,
                ..
            }
        ));
        assert!(s.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_blank_and_missing_input_rejected_without_mutation() {
        let (mut s, _) = started();
        for input in [Some(""), Some("   \t\n"), None] {
            let err = s.submit_response(input).await.unwrap_err();
            assert!(matches!(err, SessionError::InvalidInput(_)));
        }
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.transcript().len(), 1);
        assert_eq!(s.signals().respondent_turn_count, 0);
    }

    #[tokio::test]
    async fn test_continue_appends_two_turns() {
        let (mut s, _) = started();
        let outcome = s
            .submit_response("I built a react dashboard for 3 users")
            .await
            .unwrap();
        match outcome {
            SubmitOutcome::Continue { message, source } => {
                assert_eq!(source, FollowUpSource::Fallback);
                assert!(message.text.contains("React"));
            }
            other => panic!("expected continue, got {:?}", other),
        }
        assert_eq!(s.transcript().len(), 3);
        assert!(s.signals().mentions_technology);
        assert!(!s.signals().mentions_metric);
    }

    #[tokio::test]
    async fn test_generated_follow_up_is_used() {
        let composer = FollowUpComposer::new(
            Arc::new(MockGenerationService::always(
                "What did the dashboard help people decide?",
            )),
            &GenerationConfig::default(),
        );
        let mut s = InterviewSession::new(&ParleyConfig::default(), composer)
            .with_clock(Arc::new(ManualClock::new()));
        s.start(None).unwrap();
        match s.submit_response("I built a dashboard").await.unwrap() {
            SubmitOutcome::Continue { message, source } => {
                assert_eq!(source, FollowUpSource::Generated);
                assert_eq!(message.text, "What did the dashboard help people decide?");
            }
            other => panic!("expected continue, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_turn_cap_finalizes_with_generic_closing() {
        let (mut s, _) = started();
        for _ in 0..9 {
            let out = s.submit_response("I helped out").await.unwrap();
            assert!(!out.is_finalize());
        }
        match s.submit_response("I helped out").await.unwrap() {
            SubmitOutcome::Finalize(result) => {
                assert_eq!(result.reason, TerminationReason::TurnCapReached);
                assert_eq!(result.session_id, s.id());
                assert_eq!(
                    result.transcript.last().map(|t| t.text.as_str()),
                    Some(GENERIC_CLOSING)
                );
            }
            other => panic!("expected finalize, got {:?}", other),
        }
        assert_eq!(s.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_time_exceeded_finalizes() {
        let (mut s, manual) = started();
        manual.advance(Duration::from_secs(721));
        match s.submit_response("I wrote python").await.unwrap() {
            SubmitOutcome::Finalize(result) => {
                assert_eq!(result.reason, TerminationReason::TimeExceeded);
            }
            other => panic!("expected finalize, got {:?}", other),
        }
        assert_eq!(s.snapshot().elapsed_seconds, 721);
    }

    #[tokio::test]
    async fn test_calls_after_done_are_rejected() {
        let (mut s, manual) = started();
        manual.advance(Duration::from_secs(900));
        assert!(s.submit_response("done").await.unwrap().is_finalize());
        let len = s.transcript().len();

        assert!(matches!(
            s.submit_response("more").await.unwrap_err(),
            SessionError::InvalidState {
                state: SessionState::Done,
                ..
            }
        ));
        assert!(matches!(
            s.start(None).unwrap_err(),
            SessionError::InvalidState { .. }
        ));
        assert_eq!(s.transcript().len(), len);
    }

    #[tokio::test]
    async fn test_oversized_input_stored_in_full() {
        let (mut s, _) = started();
        let big = "word ".repeat(2_000);
        let out = s.submit_response(big.as_str()).await.unwrap();
        assert!(!out.is_finalize());
        assert_eq!(s.transcript().turns()[1].text, big);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_progress() {
        let (mut s, manual) = started();
        manual.advance(Duration::from_secs(42));
        s.submit_response("I used docker").await.unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.elapsed_seconds, 42);
        assert_eq!(snap.respondent_turn_count, 1);
        assert_eq!(snap.transcript.len(), 3);
    }
}
