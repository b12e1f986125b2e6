//! # triage-pipeline
//!
//! Staged, rate-limited processing of support tickets.
//!
//! This crate provides:
//! - [`RemoteCaller`]: concurrency gate with timeout, retry and pacing
//! - [`run_stage`]: per-ticket fan-out with failure and panic isolation
//! - The fetch, synthesize, categorize and diagnose stages
//! - [`Pipeline`]: runs the stages for an [`AnalysisMode`]
//! - [`RunSummary`]: aggregate counts for the export metadata
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use triage_pipeline::{AnalysisMode, Pipeline};
//!
//! let pipeline = Pipeline::new(Arc::new(zendesk), backend, &config);
//! let result = pipeline.run(records, AnalysisMode::Both).await;
//! for stats in &result.stages {
//!     println!("{}: {} ok, {} failed", stats.stage, stats.succeeded, stats.failed);
//! }
//! ```

pub mod gate;
pub mod pipeline;
pub mod runner;
pub mod stages;
pub mod summary;

pub use gate::{RemoteCaller, RetryPolicy};
pub use pipeline::{merge_analyses, AnalysisMode, Pipeline, PipelineResult};
pub use runner::{
    run_stage, NoopProgress, ProgressHook, Stage, StageKind, StageOutcome, StageStats,
};
pub use summary::{collect_errors, ErrorEntry, RunMeta, RunSummary};
