//! End-of-run console summary and progress logging.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use triage_core::TicketRecord;
use triage_pipeline::{ProgressHook, RunSummary, StageKind, StageStats};

/// Logs each finished ticket, with a progress line every `every` tickets per stage.
pub struct LogProgress {
    total: usize,
    every: usize,
    done: [AtomicUsize; 4],
}

impl LogProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            every: (total / 10).max(1),
            done: Default::default(),
        }
    }

    fn slot(stage: StageKind) -> usize {
        match stage {
            StageKind::Fetch => 0,
            StageKind::Synthesize => 1,
            StageKind::Categorize => 2,
            StageKind::Diagnose => 3,
        }
    }

    /// Tickets finished so far in `stage`.
    pub fn completed(&self, stage: StageKind) -> usize {
        self.done[Self::slot(stage)].load(Ordering::Relaxed)
    }
}

impl ProgressHook for LogProgress {
    fn on_item(&self, stage: StageKind, ticket_id: &str, record: &TicketRecord, success: bool) {
        let done = self.done[Self::slot(stage)].fetch_add(1, Ordering::Relaxed) + 1;
        if success {
            debug!(%stage, ticket_id, done, "Ticket stage complete");
        } else {
            let error = [
                &record.error,
                &record.categorization_error,
                &record.diagnostics_analysis_error,
            ]
            .into_iter()
            .flatten()
            .map(|f| f.message.as_str())
            .last()
            .unwrap_or_default();
            warn!(%stage, ticket_id, error, "Ticket stage failed");
        }
        if done % self.every == 0 || done == self.total {
            info!(%stage, done, total = self.total, "Progress");
        }
    }
}

/// Human-readable run summary printed after the export.
pub fn render_summary(summary: &RunSummary, stages: &[StageStats], outputs: &[PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {} ({})", summary.run_id, summary.analysis_type);
    let _ = writeln!(
        out,
        "Model: {} / {}",
        summary.model_provider, summary.model
    );
    let _ = writeln!(
        out,
        "Tickets: {} total, {} processed, {} failed in {:.2}s",
        summary.total_tickets,
        summary.successfully_processed,
        summary.failed,
        summary.processing_time_seconds
    );

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<12} {:>9} {:>9} {:>7} {:>8}",
        "stage", "succeeded", "failed", "skipped", "seconds"
    );
    for s in stages {
        let _ = writeln!(
            out,
            "{:<12} {:>9} {:>9} {:>7} {:>8.1}",
            s.stage.as_str(),
            s.succeeded,
            s.failed,
            s.skipped,
            s.duration_ms as f64 / 1000.0
        );
    }

    if let Some(pods) = &summary.pod_analysis {
        let _ = writeln!(out);
        let _ = writeln!(out, "POD distribution:");
        for (pod, n) in &pods.pod_distribution {
            let _ = writeln!(out, "  {:<24} {:>5}", pod, n);
        }
    }
    if let Some(diag) = &summary.diagnostics_breakdown {
        let _ = writeln!(out);
        let _ = writeln!(out, "Could diagnostics help:");
        for (answer, n) in &diag.could_help {
            let _ = writeln!(out, "  {:<24} {:>5}", answer, n);
        }
    }

    let escalation = &summary.escalation_breakdown;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Escalated: {} of {} ({})",
        escalation.total_escalated,
        escalation.total_escalated + escalation.total_not_escalated,
        escalation.escalation_rate
    );

    if !outputs.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Output files:");
        for path in outputs {
            let _ = writeln!(out, "  {}", path.display());
        }
    }
    out
}
