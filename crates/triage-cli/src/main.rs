//! ticket-triage: summarize and categorize helpdesk tickets with an LLM.
//!
//! Usage:
//!   ticket-triage --input tickets.csv
//!   ticket-triage --input tickets.csv --analysis-type both --model-provider azure
//!   ticket-triage --input tickets.csv --output-dir runs/ --config triage.toml

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use triage_cli::{export_run, init_tracing, load_tickets, render_summary, LogProgress};
use triage_core::text::now_display;
use triage_core::{new_run_id, TriageConfig};
use triage_inference::{build_backend, LlmProvider};
use triage_pipeline::{AnalysisMode, Pipeline, RunMeta, RunSummary};
use triage_zendesk::ZendeskClient;

#[derive(Parser)]
#[command(name = "ticket-triage")]
#[command(author, version, about = "Summarize, categorize and assess helpdesk tickets")]
struct Cli {
    /// CSV file listing ticket IDs
    #[arg(short, long)]
    input: PathBuf,

    /// Analyses to run after synthesis: pod, diagnostics or both
    #[arg(short, long, default_value = "pod")]
    analysis_type: AnalysisMode,

    /// LLM provider: gemini or azure
    #[arg(short, long, default_value = "gemini")]
    model_provider: LlmProvider,

    /// Directory for the JSON and CSV exports
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// TOML configuration file (defaults to $TRIAGE_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let run_id = new_run_id();
    run(cli, run_id)
        .instrument(info_span!("run", run_id = %run_id))
        .await
        .map_err(|e| {
            error!(error = %format!("{:#}", e), "Run failed");
            e
        })
}

async fn run(cli: Cli, run_id: Uuid) -> anyhow::Result<()> {
    let started = Instant::now();

    let config = TriageConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.validate()?;
    let backend = build_backend(cli.model_provider, &config.llm)?;
    let zendesk = ZendeskClient::new(
        config.zendesk.clone(),
        config.limits.request_timeout_secs,
        config.timezone_offset_minutes,
    )?;

    let records: Vec<_> = load_tickets(&cli.input)?
        .into_iter()
        .map(|t| t.into_record())
        .collect();
    let total = records.len();
    info!(
        tickets = total,
        mode = %cli.analysis_type,
        provider = %cli.model_provider,
        model = backend.model_name(),
        "Starting run"
    );

    let pipeline = Pipeline::new(Arc::new(zendesk), backend.clone(), &config)
        .with_progress(Arc::new(LogProgress::new(total)));

    let result = tokio::select! {
        result = pipeline.run(records, cli.analysis_type) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; no output written");
            bail!("interrupted before the run completed");
        }
    };

    let finished_at = now_display(config.timezone_offset_minutes);
    let summary = RunSummary::from_records(
        &result.records,
        cli.analysis_type,
        RunMeta {
            run_id,
            model_provider: cli.model_provider.to_string(),
            model: backend.model_name().to_string(),
            processed_at: finished_at.to_rfc3339(),
            processing_time_seconds: started.elapsed().as_secs_f64(),
        },
    );

    let outputs = export_run(&cli.output_dir, &summary, &result.records, &finished_at)?;
    print!("{}", render_summary(&summary, &result.stages, &outputs));
    info!(
        processed = summary.successfully_processed,
        failed = summary.failed,
        "Run complete"
    );
    Ok(())
}
