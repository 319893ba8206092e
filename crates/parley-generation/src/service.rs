//! Generation service trait and request types.

use std::future::Future;
use std::pin::Pin;

use crate::error::GenerationError;

/// Sampling limits for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConstraints {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConstraints {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// A single prompt sent to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// User-role prompt text.
    pub prompt: String,
    pub constraints: GenerationConstraints,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            constraints: GenerationConstraints::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_constraints(mut self, constraints: GenerationConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Service that turns a prompt into text.
pub trait GenerationService: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// Object-safe version of [`GenerationService`] for dynamic dispatch.
///
/// `GenerationService::generate` returns `impl Future` and so cannot be used
/// behind `dyn`. Every `GenerationService` gets this trait through the
/// blanket impl below, which lets sessions hold an `Arc<dyn DynGenerationService>`.
pub trait DynGenerationService: Send + Sync {
    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;
}

impl<T: GenerationService> DynGenerationService for T {
    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(self.generate(request))
    }
}
