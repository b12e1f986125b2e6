//! OpenAI-compatible inference backend.
//!
//! Works with the OpenAI cloud API and with Azure OpenAI deployments, which
//! share the chat completions wire format but differ in URL layout and
//! authentication header.
//!
//! # Example
//!
//! ```rust,no_run
//! use triage_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use triage_core::{AzureSettings, GenerationBackend, LlmSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let azure = AzureSettings {
//!         endpoint: Some("https://acme.openai.azure.com".to_string()),
//!         api_key: Some("key".to_string()),
//!         ..Default::default()
//!     };
//!     let config = OpenAIConfig::azure(&azure, &LlmSettings::default()).unwrap();
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let text = backend.generate("Summarize this ticket").await.unwrap();
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{
    AuthStyle, OpenAIBackend, OpenAIConfig, DEFAULT_GEN_MODEL, DEFAULT_OPENAI_URL,
    DEFAULT_SYSTEM_PROMPT,
};
pub use error::{to_triage_error, OpenAIErrorCode};
pub use types::*;
