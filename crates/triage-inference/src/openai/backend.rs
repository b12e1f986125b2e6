//! OpenAI-compatible chat completion backend (OpenAI cloud or Azure OpenAI).

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use triage_core::{defaults, AzureSettings, Error, GenerationBackend, LlmSettings, Result};

use super::error::{to_triage_error, OpenAIErrorCode};
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = "gpt-4o-mini";

/// System message sent with every analysis prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert support ticket analyst. Follow the requested output format exactly.";

/// How the API key is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>` (OpenAI and compatible servers).
    Bearer,
    /// `api-key: <key>` (Azure OpenAI).
    AzureApiKey,
}

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL the `/chat/completions` path is appended to.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    pub auth_style: AuthStyle,
    /// Azure `api-version` query parameter.
    pub api_version: Option<String>,
    /// Model (or Azure deployment) to use for generation.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// System message used by [`GenerationBackend::generate`].
    pub system_prompt: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            auth_style: AuthStyle::Bearer,
            api_version: None,
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            timeout_seconds: defaults::LLM_TIMEOUT_SECS,
            temperature: None,
            max_tokens: None,
            top_p: None,
            system_prompt: None,
        }
    }
}

impl OpenAIConfig {
    /// Configuration for an Azure OpenAI deployment.
    ///
    /// Fails with [`Error::Config`] when the endpoint or key is missing.
    pub fn azure(azure: &AzureSettings, llm: &LlmSettings) -> Result<Self> {
        let endpoint = azure
            .endpoint
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("AZURE_OPENAI_ENDPOINT is required".to_string()))?;
        let api_key = azure
            .api_key
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("AZURE_OPENAI_API_KEY is required".to_string()))?;

        Ok(Self {
            base_url: format!(
                "{}/openai/deployments/{}",
                endpoint.trim_end_matches('/'),
                azure.deployment
            ),
            api_key: Some(api_key),
            auth_style: AuthStyle::AzureApiKey,
            api_version: Some(azure.api_version.clone()),
            gen_model: azure.deployment.clone(),
            timeout_seconds: llm.timeout_secs,
            temperature: Some(llm.temperature),
            max_tokens: Some(llm.max_tokens),
            top_p: Some(llm.top_p),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            url = %config.base_url,
            model = %config.gen_model,
            auth = ?config.auth_style,
            "Initializing OpenAI-compatible backend"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref version) = self.config.api_version {
            req = req.query(&[("api-version", version.as_str())]);
        }

        if let Some(ref api_key) = self.config.api_key {
            req = match self.config.auth_style {
                AuthStyle::Bearer => req.header("Authorization", format!("Bearer {}", api_key)),
                AuthStyle::AzureApiKey => req.header("api-key", api_key),
            };
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let system = self.config.system_prompt.clone().unwrap_or_default();
        self.generate_with_system(&system, prompt).await
    }

    #[instrument(skip(self, system, prompt), fields(subsystem = "inference", component = "openai", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let mut messages = Vec::new();

        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response.json().await.unwrap_or(OpenAIErrorResponse {
                error: OpenAIError {
                    message: "Unknown error".to_string(),
                    error_type: "unknown".to_string(),
                    code: None,
                },
            });
            let error_type = body.error.code.as_deref().unwrap_or(&body.error.error_type);
            let code = OpenAIErrorCode::from_response(status.as_u16(), error_type);
            return Err(to_triage_error(
                code,
                &format!("OpenAI returned {}: {}", status, body.error.message),
            ));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(Error::Inference("Model returned an empty response".to_string()));
        }

        debug!(
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
