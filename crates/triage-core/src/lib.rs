//! # triage-core
//!
//! Core types, traits, and configuration for ticket-triage.
//!
//! This crate provides the ticket record model, the closed vocabularies used
//! to validate model output, the pure derivation rules, and the trait seams
//! that the helpdesk client, inference backends and pipeline depend on.
//!
//! ## Logging
//!
//! Every crate logs through `tracing` with the same structured field names,
//! so a JSON log stream filters the same way whichever crate emitted it:
//! `run_id`, `subsystem` (`cli`, `export`, `pipeline`, `zendesk`, `inference`),
//! `component`, `op`, `ticket_id`, `stage`, `duration_ms`, `model`,
//! `prompt_len`, `response_len`, `error` and `error_kind`.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Run-level failure, output will be missing or incomplete |
//! | WARN  | Per-ticket failure, retry, or a validator fallback was applied |
//! | INFO  | Run lifecycle, stage start/finish with counts, files written |
//! | DEBUG | Per-ticket stage results, backend configuration choices |
//! | TRACE | Raw prompt and response sizes, pagination steps |

pub mod config;
pub mod defaults;
pub mod derivation;
pub mod error;
pub mod ids;
pub mod models;
pub mod text;
pub mod traits;
pub mod vocab;

// Re-export commonly used types at crate root
pub use config::{
    AzureSettings, CustomFieldIds, GeminiSettings, Limits, LlmSettings, TriageConfig,
    ZendeskSettings,
};
pub use derivation::{
    derive_overall_assessment, determine_escalation, normalize_field_answer, remap_gap_area,
    OverallAssessment,
};
pub use error::{Error, ErrorKind, Result};
pub use ids::new_run_id;
pub use models::*;
pub use traits::*;
pub use vocab::{Vocabularies, Vocabulary, GAP_AREA_OTHER, NOT_CONFIDENT};
