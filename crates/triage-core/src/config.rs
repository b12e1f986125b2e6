//! Run configuration.
//!
//! Values are layered: built-in defaults from [`crate::defaults`], then an
//! optional TOML file, then environment variables. Missing credentials are
//! reported by [`TriageConfig::validate`] before any network call is made.
//!
//! Example file:
//!
//! ```toml
//! timezone_offset_minutes = 330
//!
//! [zendesk]
//! subdomain = "acme"
//! email = "support-bot@acme.example"
//! api_key = "${ZENDESK_API_KEY}"
//!
//! [zendesk.field_ids]
//! diagnostics_used = 360001234567
//! cross_team = 360001234568
//!
//! [limits]
//! llm_max_concurrent = 1
//! llm_request_delay_ms = 4000
//!
//! [vocabularies.categories]
//! values = ["Guidance", "Mobile", "WFE"]
//! ```

use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::defaults;
use crate::error::{Error, Result};
use crate::vocab::Vocabularies;

// =============================================================================
// HELPDESK
// =============================================================================

/// Opaque helpdesk custom-field IDs mapped to their meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomFieldIds {
    /// "Was the diagnostics tool used" dropdown.
    pub diagnostics_used: Option<u64>,
    /// Cross-team escalation flag.
    pub cross_team: Option<u64>,
    /// Link to the issue-tracker ticket.
    pub jira_link: Option<u64>,
    /// Support-assigned root cause.
    pub support_root_cause: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZendeskSettings {
    pub subdomain: String,
    pub email: String,
    pub api_key: Option<String>,
    /// Overrides `https://{subdomain}.zendesk.com` (used by tests and proxies).
    pub base_url: Option<String>,
    pub field_ids: CustomFieldIds,
}

impl ZendeskSettings {
    /// Root URL for API calls, without a trailing slash.
    pub fn api_root(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.zendesk.com", self.subdomain),
        }
    }

    /// Agent-facing link to a ticket.
    pub fn agent_ticket_url(&self, ticket_id: &str) -> String {
        format!(
            "https://{}.zendesk.com/agent/tickets/{}",
            self.subdomain, ticket_id
        )
    }
}

// =============================================================================
// INFERENCE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: defaults::GEMINI_MODEL.to_string(),
            base_url: defaults::GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureSettings {
    /// Resource endpoint, e.g. `https://acme.openai.azure.com`.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: defaults::AZURE_DEPLOYMENT.to_string(),
            api_version: defaults::AZURE_API_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub gemini: GeminiSettings,
    pub azure: AzureSettings,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            gemini: GeminiSettings::default(),
            azure: AzureSettings::default(),
            temperature: defaults::GEN_TEMPERATURE,
            max_tokens: defaults::GEN_MAX_TOKENS,
            top_p: defaults::GEN_TOP_P,
            timeout_secs: defaults::LLM_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// LIMITS
// =============================================================================

/// Concurrency, retry and pacing limits for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub zendesk_max_concurrent: usize,
    pub llm_max_concurrent: usize,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub llm_request_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            zendesk_max_concurrent: defaults::ZENDESK_MAX_CONCURRENT,
            llm_max_concurrent: defaults::LLM_MAX_CONCURRENT,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            llm_request_delay_ms: defaults::LLM_REQUEST_DELAY_MS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// ROOT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub zendesk: ZendeskSettings,
    pub llm: LlmSettings,
    pub limits: Limits,
    pub vocabularies: Vocabularies,
    pub timezone_offset_minutes: i32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            zendesk: ZendeskSettings::default(),
            llm: LlmSettings::default(),
            limits: Limits::default(),
            vocabularies: Vocabularies::default(),
            timezone_offset_minutes: defaults::TIMEZONE_OFFSET_MINUTES,
        }
    }
}

impl TriageConfig {
    /// Load defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading config file");
                Self::from_file(path)?
            }
            None => {
                debug!("No config file given, using defaults and environment");
                Self::default()
            }
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file after `${VAR}` substitution.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&substitute_env_vars(&content))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// A set variable with an unparseable value is a configuration error
    /// rather than being silently ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ZENDESK_SUBDOMAIN") {
            self.zendesk.subdomain = v;
        }
        if let Some(v) = get("ZENDESK_EMAIL") {
            self.zendesk.email = v;
        }
        if let Some(v) = get("ZENDESK_API_KEY") {
            self.zendesk.api_key = Some(v);
        }
        if let Some(v) = get("ZENDESK_BASE_URL") {
            self.zendesk.base_url = Some(v);
        }
        let ids = &mut self.zendesk.field_ids;
        set_parsed(&get, "ZENDESK_DIAGNOSTICS_FIELD_ID", &mut ids.diagnostics_used)?;
        set_parsed(&get, "ZENDESK_CROSS_TEAM_FIELD_ID", &mut ids.cross_team)?;
        set_parsed(&get, "ZENDESK_JIRA_FIELD_ID", &mut ids.jira_link)?;
        set_parsed(&get, "ZENDESK_ROOT_CAUSE_FIELD_ID", &mut ids.support_root_cause)?;

        if let Some(v) = get("GEMINI_API_KEY") {
            self.llm.gemini.api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.llm.gemini.model = v;
        }
        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.llm.azure.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.llm.azure.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT") {
            self.llm.azure.deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.llm.azure.api_version = v;
        }

        let limits = &mut self.limits;
        override_parsed(&get, "ZENDESK_MAX_CONCURRENT", &mut limits.zendesk_max_concurrent)?;
        override_parsed(&get, "LLM_MAX_CONCURRENT", &mut limits.llm_max_concurrent)?;
        override_parsed(&get, "MAX_RETRIES", &mut limits.max_retries)?;
        override_parsed(&get, "RETRY_DELAY_MS", &mut limits.retry_base_delay_ms)?;
        override_parsed(&get, "LLM_REQUEST_DELAY_MS", &mut limits.llm_request_delay_ms)?;
        override_parsed(&get, "REQUEST_TIMEOUT_SECS", &mut limits.request_timeout_secs)?;
        override_parsed(&get, "LLM_TIMEOUT_SECS", &mut self.llm.timeout_secs)?;
        override_parsed(&get, "TIMEZONE_OFFSET_MINUTES", &mut self.timezone_offset_minutes)?;
        Ok(())
    }

    /// Check helpdesk credentials, limits and vocabularies.
    ///
    /// LLM credentials are checked when the provider backend is built, since
    /// only the selected provider needs them.
    pub fn validate(&self) -> Result<()> {
        if self.zendesk.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Config(
                "ZENDESK_API_KEY is required but not set".to_string(),
            ));
        }
        if self.zendesk.email.is_empty() {
            return Err(Error::Config("ZENDESK_EMAIL is required".to_string()));
        }
        if self.zendesk.subdomain.is_empty() && self.zendesk.base_url.is_none() {
            return Err(Error::Config(
                "ZENDESK_SUBDOMAIN or zendesk.base_url is required".to_string(),
            ));
        }
        if self.limits.zendesk_max_concurrent == 0 || self.limits.llm_max_concurrent == 0 {
            return Err(Error::Config(
                "concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.limits.request_timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least 1 second".to_string()));
        }
        self.vocabularies.validate().map_err(Error::Config)?;
        Ok(())
    }
}

fn override_parsed<T, G>(get: &G, key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, raw)))?;
    }
    Ok(())
}

fn set_parsed<T, G>(get: &G, key: &str, target: &mut Option<T>) -> Result<()>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        let parsed = raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, raw)))?;
        *target = Some(parsed);
    }
    Ok(())
}

/// Substitute environment variables in the format ${VAR_NAME}.
///
/// Unset variables are left as-is so validation reports them.
fn substitute_env_vars(content: &str) -> String {
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex");
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
