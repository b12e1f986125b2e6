//! # triage-inference
//!
//! LLM generation backends and model-output handling for ticket-triage.
//!
//! This crate provides:
//! - Gemini backend (`generateContent` REST API)
//! - OpenAI-compatible backend, used for Azure OpenAI deployments
//! - Provider selection from the command line
//! - Prompt builders for synthesis, categorization and diagnostics analysis
//! - Labeled-section and embedded-JSON extraction
//! - Vocabulary validation with logged, inspectable fallbacks
//!
//! # Feature Flags
//!
//! - `mock`: Enable [`mock::MockGenerationBackend`] for dependent crates' tests
//!
//! # Example
//!
//! ```rust,no_run
//! use triage_inference::{build_backend, parse_synthesis_response, LlmProvider};
//! use triage_core::LlmSettings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = build_backend(LlmProvider::Gemini, &LlmSettings::default()).unwrap();
//!     let text = backend.generate("...").await.unwrap();
//!     let synthesis = parse_synthesis_response(&text).into_inner();
//! }
//! ```

pub mod categorization;
pub mod diagnostics;
pub mod embedded_json;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod sections;
pub mod synthesis;
pub mod validation;

// Mock generation backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use categorization::{categorization_prompt, parse_categorization_response};
pub use diagnostics::{diagnostics_prompt, parse_diagnostics_response};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use provider::{build_backend, LlmProvider, ProviderError};
pub use synthesis::{format_comment_thread, parse_synthesis_response, synthesis_prompt};
pub use validation::Validated;
