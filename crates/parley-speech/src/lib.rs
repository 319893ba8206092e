//! Parley Speech crate - speech-to-text collaborator interface.
//!
//! The interview engine never performs recognition itself. Spoken answers go
//! through a [`TranscriptionService`] and only the resulting text reaches the
//! session.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use parley_core::error::ParleyError;

/// Text recognized from one recorded answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub text: String,
    /// Length of the recording the text came from.
    pub duration: Duration,
}

/// Turns a recorded answer into text.
pub trait TranscriptionService: Send + Sync {
    /// `audio` is mono PCM in [-1.0, 1.0] sampled at `sample_rate` Hz.
    fn transcribe(
        &self,
        audio: &[f32],
        sample_rate: u32,
    ) -> impl Future<Output = Result<Transcription, ParleyError>> + Send;
}

// =============================================================================
// Mock
// =============================================================================

/// Scripted recognizer for tests and offline demos.
///
/// Replies are consumed in order. Once the script runs out, `after_script`
/// (if set) answers every further recording.
#[derive(Debug, Default)]
pub struct MockTranscriptionService {
    script: Mutex<VecDeque<Result<String, String>>>,
    after_script: Option<Result<String, String>>,
    calls: Mutex<usize>,
}

impl MockTranscriptionService {
    /// Recognize every recording as `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            after_script: Some(Ok(text.into())),
            ..Self::default()
        }
    }

    /// One reply per recording, in order. `Err` entries simulate a
    /// recognizer failure for that recording.
    pub fn scripted(replies: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Fail every recording with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            after_script: Some(Err(reason.into())),
            ..Self::default()
        }
    }

    /// Number of recordings submitted so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }

    fn next_reply(&self) -> Result<String, String> {
        let next = self
            .script
            .lock()
            .map_err(|_| "mock script lock poisoned".to_string())?
            .pop_front();
        match next.or_else(|| self.after_script.clone()) {
            Some(reply) => reply,
            None => Err("no scripted transcription left".to_string()),
        }
    }
}

impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(
        &self,
        audio: &[f32],
        sample_rate: u32,
    ) -> Result<Transcription, ParleyError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }

        if audio.is_empty() || sample_rate == 0 {
            return Err(ParleyError::Transcription("no audio was captured".to_string()));
        }

        let text = self.next_reply().map_err(ParleyError::Transcription)?;
        let duration = Duration::from_secs_f64(audio.len() as f64 / f64::from(sample_rate));
        tracing::debug!(
            duration_ms = duration.as_millis() as u64,
            chars = text.len(),
            "Mock transcription"
        );

        Ok(Transcription { text, duration })
    }
}
