//! Parley Generation crate - text-generation collaborator interface.
//!
//! Provides a trait-based abstraction over an external language model,
//! an OpenAI-compatible HTTP client, and scripted mocks for tests and
//! offline runs. Callers decide how to degrade when a call fails; this crate
//! only classifies the failure.

pub mod error;
pub mod mock;
pub mod openai;
pub mod service;

pub use error::GenerationError;
pub use mock::{FailingGenerationService, MockGenerationService};
pub use openai::OpenAiCompatService;
pub use service::{
    DynGenerationService, GenerationConstraints, GenerationRequest, GenerationService,
};
