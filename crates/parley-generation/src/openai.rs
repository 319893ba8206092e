//! OpenAI-compatible chat-completions client.
//!
//! Works against OpenAI itself and any endpoint speaking the same API
//! (Ollama, Groq, OpenRouter, DeepSeek, ...), selected by base URL.

use std::time::Duration;

use parley_core::config::GenerationConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::service::{GenerationRequest, GenerationService};

#[derive(Debug, Clone)]
pub struct OpenAiCompatService {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatService {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        }
    }

    /// Build a client from the `[generation]` config section, reading the API
    /// key from the configured environment variable.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            GenerationError::Unavailable(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_millis(config.timeout_ms),
        ))
    }

    fn to_api_request(&self, request: &GenerationRequest) -> ApiRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ApiMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ApiRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.constraints.max_tokens,
            temperature: request.constraints.temperature,
        }
    }
}

impl GenerationService for OpenAiCompatService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.api_base);
        let payload = self.to_api_request(request);

        let resp = match self
            .client
            .post(url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(GenerationError::Timeout(self.timeout)),
            Err(e) => return Err(GenerationError::Transport(e.to_string())),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or(text);
            return Err(GenerationError::from_status(status.as_u16(), message));
        }

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Malformed("empty choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }

        tracing::debug!(model = %self.model, chars = text.len(), "Generation completed");
        Ok(text)
    }
}

// -- Wire types --

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
