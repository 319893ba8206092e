//! Spoken answers: transcribe, then submit as text.

use parley_speech::TranscriptionService;

use crate::error::SessionError;
use crate::orchestrator::InterviewSession;
use crate::types::{SessionState, SubmitOutcome};

/// Default capture rate for recorded answers.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Feeds recorded answers into a session through a [`TranscriptionService`].
pub struct VoiceInterface<T: TranscriptionService> {
    service: T,
    sample_rate: u32,
}

impl<T: TranscriptionService> VoiceInterface<T> {
    pub fn new(service: T) -> Self {
        Self {
            service,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Transcribe `audio` and submit the text as the respondent's answer.
    ///
    /// A recognition failure leaves the session untouched and asks the
    /// respondent to try again. Silence transcribed as blank text is
    /// rejected the same way typed blank input is.
    pub async fn submit(
        &self,
        session: &mut InterviewSession,
        audio: &[f32],
    ) -> Result<SubmitOutcome, SessionError> {
        if session.state() != SessionState::Active {
            return Err(SessionError::InvalidState {
                state: session.state(),
                operation: "submit a voice response",
            });
        }

        let result = self
            .service
            .transcribe(audio, self.sample_rate)
            .await
            .map_err(|e| {
                tracing::warn!(session_id = %session.id(), error = %e, "Transcription failed");
                SessionError::Transcription(e.to_string())
            })?;

        tracing::debug!(
            session_id = %session.id(),
            duration_ms = result.duration.as_millis() as u64,
            "Voice answer transcribed"
        );

        session.submit_response(result.text.as_str()).await
    }
}
