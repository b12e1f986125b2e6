//! JSON and CSV export of a finished run.
//!
//! Each export kind writes `output_{kind}_{YYYYmmdd_HHMMSS}.json` and a CSV
//! with the same stem. Files are written to a temporary file in the output
//! directory and persisted into place, so a failed write never leaves a
//! truncated export behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use triage_core::defaults::{OUTPUT_FILENAME_PREFIX, OUTPUT_TIMESTAMP_FORMAT};
use triage_core::{StageFailure, TicketRecord};
use triage_pipeline::{collect_errors, AnalysisMode, ErrorEntry, RunSummary};

/// Separator for list-valued CSV cells.
pub const LIST_SEPARATOR: &str = ", ";

pub const POD_COLUMNS: [&str; 21] = [
    "ticket_id",
    "serial_no",
    "url",
    "subject",
    "status",
    "created_at",
    "comments_count",
    "is_escalated",
    "jira_ticket_id",
    "jira_ticket_url",
    "issue_reported",
    "root_cause",
    "summary",
    "resolution",
    "primary_pod",
    "categorization_reasoning",
    "confidence",
    "alternative_pods",
    "alternative_reasoning",
    "processing_status",
    "error",
];

pub const DIAGNOSTICS_COLUMNS: [&str; 31] = [
    "ticket_id",
    "serial_no",
    "url",
    "subject",
    "status",
    "created_at",
    "comments_count",
    "is_escalated",
    "jira_ticket_id",
    "jira_ticket_url",
    "issue_reported",
    "root_cause",
    "support_root_cause",
    "summary",
    "resolution",
    "was_diagnostics_used_custom_field",
    "was_diagnostics_used_llm_assessment",
    "was_diagnostics_used_confidence",
    "was_diagnostics_used_reasoning",
    "triage_assessment",
    "triage_reasoning",
    "fix_assessment",
    "fix_reasoning",
    "overall_assessment",
    "overall_reasoning",
    "diagnostics_confidence",
    "diagnostics_capabilities_matched",
    "limitation_notes",
    "ticket_type",
    "processing_status",
    "error",
];

/// One pair of output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Pod,
    Diagnostics,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Pod => "pod",
            ExportKind::Diagnostics => "diagnostics",
        }
    }

    /// Export kinds produced by a run in `mode`.
    pub fn for_mode(mode: AnalysisMode) -> &'static [ExportKind] {
        match mode {
            AnalysisMode::Pod => &[ExportKind::Pod],
            AnalysisMode::Diagnostics => &[ExportKind::Diagnostics],
            AnalysisMode::Both => &[ExportKind::Pod, ExportKind::Diagnostics],
        }
    }

    fn analysis_mode(&self) -> AnalysisMode {
        match self {
            ExportKind::Pod => AnalysisMode::Pod,
            ExportKind::Diagnostics => AnalysisMode::Diagnostics,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ExportKind::Pod => &POD_COLUMNS,
            ExportKind::Diagnostics => &DIAGNOSTICS_COLUMNS,
        }
    }

    pub fn row(&self, record: &TicketRecord) -> Vec<String> {
        match self {
            ExportKind::Pod => pod_row(record),
            ExportKind::Diagnostics => diagnostics_row(record),
        }
    }

    /// The run summary as it appears in this kind's JSON file.
    fn metadata(&self, summary: &RunSummary) -> RunSummary {
        let mut metadata = summary.clone();
        metadata.analysis_type = self.analysis_mode();
        match self {
            ExportKind::Pod => {
                metadata.diagnostics_analysis = None;
                metadata.diagnostics_breakdown = None;
            }
            ExportKind::Diagnostics => {
                metadata.categorization = None;
                metadata.pod_analysis = None;
            }
        }
        metadata
    }

    fn keeps_error(&self, entry: &ErrorEntry) -> bool {
        match self {
            ExportKind::Pod => entry.stage != "diagnostics",
            ExportKind::Diagnostics => entry.stage != "categorization",
        }
    }
}

/// File stem such as `output_pod_20260105_101500`.
pub fn output_stem(kind: ExportKind, timestamp: &DateTime<FixedOffset>) -> String {
    format!(
        "{}{}_{}",
        OUTPUT_FILENAME_PREFIX,
        kind.as_str(),
        timestamp.format(OUTPUT_TIMESTAMP_FORMAT)
    )
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    metadata: RunSummary,
    tickets: &'a [TicketRecord],
    errors: Vec<ErrorEntry>,
}

/// Write every export file for the run; returns the written paths.
pub fn export_run(
    output_dir: &Path,
    summary: &RunSummary,
    records: &[TicketRecord],
    timestamp: &DateTime<FixedOffset>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let errors = collect_errors(records);
    let mut written = Vec::new();
    for kind in ExportKind::for_mode(summary.analysis_type) {
        let stem = output_stem(*kind, timestamp);

        let json_path = output_dir.join(format!("{}.json", stem));
        let document = ExportDocument {
            metadata: kind.metadata(summary),
            tickets: records,
            errors: errors
                .iter()
                .filter(|e| kind.keeps_error(e))
                .cloned()
                .collect(),
        };
        write_json(&json_path, &document)?;
        written.push(json_path);

        let csv_path = output_dir.join(format!("{}.csv", stem));
        write_csv(&csv_path, *kind, records)?;
        written.push(csv_path);

        info!(
            subsystem = "export",
            kind = kind.as_str(),
            tickets = records.len(),
            errors = document.errors.len(),
            "Export written"
        );
    }
    Ok(written)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, |out| {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
        Ok(())
    })
}

/// Write the CSV for `kind`: a header row then one row per record.
pub fn write_csv(path: &Path, kind: ExportKind, records: &[TicketRecord]) -> Result<()> {
    write_atomic(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(kind.columns())?;
        for record in records {
            writer.write_record(kind.row(record))?;
        }
        writer.flush()?;
        Ok(())
    })
}

fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    {
        let mut out: BufWriter<&mut File> = BufWriter::new(tmp.as_file_mut());
        write(&mut out).with_context(|| format!("failed to write {}", path.display()))?;
        out.flush()?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

// =============================================================================
// ROWS
// =============================================================================

fn ticket_columns(record: &TicketRecord) -> Vec<String> {
    let escalation = &record.custom_fields.escalation;
    vec![
        record.ticket_id.clone(),
        record.serial_no.map(|s| s.to_string()).unwrap_or_default(),
        record.url.clone(),
        record.subject.clone(),
        record.status.clone(),
        record.created_at.clone(),
        record.comments_count.to_string(),
        escalation.is_escalated.to_string(),
        escalation.jira_ticket_id.clone().unwrap_or_default(),
        escalation.jira_ticket_url.clone().unwrap_or_default(),
    ]
}

fn error_cell(record: &TicketRecord, stage_error: Option<&StageFailure>) -> String {
    record
        .error
        .as_ref()
        .or(stage_error)
        .map(|f| f.message.clone())
        .unwrap_or_default()
}

fn pod_row(record: &TicketRecord) -> Vec<String> {
    let synthesis = record.synthesis.clone().unwrap_or_default();
    let categorization = record.categorization.clone().unwrap_or_default();

    let mut row = ticket_columns(record);
    row.extend([
        synthesis.issue_reported,
        synthesis.root_cause,
        synthesis.summary,
        synthesis.resolution,
        categorization.primary_pod,
        categorization.reasoning,
        categorization.confidence,
        categorization.alternative_pods.join(LIST_SEPARATOR),
        categorization.alternative_reasoning.unwrap_or_default(),
        record.processing_status.as_str().to_string(),
        error_cell(record, record.categorization_error.as_ref()),
    ]);
    row
}

fn diagnostics_row(record: &TicketRecord) -> Vec<String> {
    let synthesis = record.synthesis.clone().unwrap_or_default();

    let mut row = ticket_columns(record);
    row.extend([
        synthesis.issue_reported,
        synthesis.root_cause,
        record
            .custom_fields
            .support_root_cause
            .clone()
            .unwrap_or_default(),
        synthesis.summary,
        synthesis.resolution,
        record.custom_fields.was_diagnostics_used.to_string(),
    ]);

    match &record.diagnostics_analysis {
        Some(analysis) => {
            let used = &analysis.was_diagnostics_used;
            let help = &analysis.could_diagnostics_help;
            row.extend([
                used.llm_assessment.to_string(),
                used.confidence.clone(),
                used.reasoning.clone(),
                help.triage_assessment.to_string(),
                help.triage_reasoning.clone(),
                help.fix_assessment.to_string(),
                help.fix_reasoning.clone(),
                help.overall_assessment.to_string(),
                help.overall_reasoning.clone(),
                help.confidence.clone(),
                help.diagnostics_capability_matched.join(LIST_SEPARATOR),
                help.limitation_notes.clone(),
                analysis.metadata.ticket_type.clone(),
            ]);
        }
        None => row.extend(std::iter::repeat(String::new()).take(13)),
    }

    row.extend([
        record.processing_status.as_str().to_string(),
        error_cell(record, record.diagnostics_analysis_error.as_ref()),
    ]);
    row
}
