//! LLM provider selection.
//!
//! ```text
//! --model-provider gemini   → GeminiBackend
//! --model-provider azure    → OpenAIBackend against an Azure deployment
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use triage_core::{GenerationBackend, LlmSettings, Result};

use crate::gemini::{GeminiBackend, GeminiConfig};
use crate::openai::{OpenAIBackend, OpenAIConfig};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown model provider '{0}' (expected 'gemini' or 'azure')")]
    Unknown(String),
}

impl From<ProviderError> for triage_core::Error {
    fn from(e: ProviderError) -> Self {
        triage_core::Error::Config(e.to_string())
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    Azure,
}

impl FromStr for LlmProvider {
    type Err = ProviderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "azure" | "openai" => Ok(Self::Azure),
            _ => Err(ProviderError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Azure => write!(f, "azure"),
        }
    }
}

/// Build the generation backend for `provider`.
///
/// Missing credentials for the chosen provider are a configuration error.
pub fn build_backend(
    provider: LlmProvider,
    settings: &LlmSettings,
) -> Result<Arc<dyn GenerationBackend>> {
    let backend: Arc<dyn GenerationBackend> = match provider {
        LlmProvider::Gemini => {
            let config = GeminiConfig::from_settings(&settings.gemini, settings)?;
            Arc::new(GeminiBackend::new(config)?)
        }
        LlmProvider::Azure => {
            let config = OpenAIConfig::azure(&settings.azure, settings)?;
            Arc::new(OpenAIBackend::new(config)?)
        }
    };
    info!(provider = %provider, model = backend.model_name(), "LLM backend ready");
    Ok(backend)
}
