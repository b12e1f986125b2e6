//! Centralized default constants for ticket-triage.
//!
//! **This module is the single source of truth** for shared default values.
//! Configuration loading, backends and the pipeline reference these constants
//! instead of defining their own magic numbers.

// =============================================================================
// HELPDESK
// =============================================================================

/// Maximum concurrent helpdesk API requests.
pub const ZENDESK_MAX_CONCURRENT: usize = 10;

/// Per-request timeout for helpdesk calls (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Helpdesk API path prefix.
pub const ZENDESK_API_PREFIX: &str = "/api/v2";

/// Upper bound on comment pages followed for one ticket.
pub const MAX_COMMENT_PAGES: usize = 100;

// =============================================================================
// INFERENCE
// =============================================================================

/// Maximum concurrent LLM generation calls.
pub const LLM_MAX_CONCURRENT: usize = 5;

/// Delay after each successful LLM call (milliseconds). Zero disables it.
pub const LLM_REQUEST_DELAY_MS: u64 = 0;

/// Per-request timeout for LLM generation (seconds).
pub const LLM_TIMEOUT_SECS: u64 = 120;

/// Default Gemini model.
pub const GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Default Gemini REST base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Azure OpenAI deployment name.
pub const AZURE_DEPLOYMENT: &str = "gpt-4o";

/// Default Azure OpenAI API version.
pub const AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Sampling temperature for analysis prompts.
pub const GEN_TEMPERATURE: f32 = 0.3;

/// Maximum tokens per analysis response.
pub const GEN_MAX_TOKENS: u32 = 2000;

/// Nucleus sampling parameter.
pub const GEN_TOP_P: f32 = 0.95;

// =============================================================================
// RETRY
// =============================================================================

/// Retries after the first failed attempt.
pub const MAX_RETRIES: u32 = 1;

/// Base delay for exponential backoff (milliseconds): `base * 2^attempt`.
pub const RETRY_BASE_DELAY_MS: u64 = 2000;

// =============================================================================
// DISPLAY
// =============================================================================

/// Offset used when rendering timestamps (minutes east of UTC). IST.
pub const TIMEZONE_OFFSET_MINUTES: i32 = 330;

/// Prefix for output file names.
pub const OUTPUT_FILENAME_PREFIX: &str = "output_";

/// Timestamp format embedded in output file names.
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Placeholder thread text when a ticket has no comments.
pub const NO_COMMENTS_PLACEHOLDER: &str = "No comments available.";
