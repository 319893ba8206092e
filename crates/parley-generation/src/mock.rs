//! Scripted generation services for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::GenerationError;
use crate::service::{GenerationRequest, GenerationService};

/// Generation service that replays scripted replies in order.
///
/// Once the script is exhausted every call returns the fallback reply. Each
/// request is recorded so tests can assert on prompt contents.
#[derive(Debug, Default)]
pub struct MockGenerationService {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationService {
    /// A service that always replies with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::default()
        }
    }

    /// A service that replays `replies`, then fails with `Unavailable`.
    pub fn scripted(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Sleep before answering, to exercise caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl GenerationService for MockGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .map_err(|e| GenerationError::Unavailable(format!("mock lock poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| GenerationError::Unavailable("mock script exhausted".to_string())),
        }
    }
}

/// Generation service that fails every call.
#[derive(Debug, Clone)]
pub struct FailingGenerationService {
    error: GenerationError,
}

impl FailingGenerationService {
    pub fn new() -> Self {
        Self {
            error: GenerationError::Unavailable("generation disabled".to_string()),
        }
    }

    pub fn with_error(error: GenerationError) -> Self {
        Self { error }
    }
}

impl Default for FailingGenerationService {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationService for FailingGenerationService {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(self.error.clone())
    }
}
