//! Run summary: aggregate counts computed from the final records.
//!
//! The summary is derived from records only, never from counters kept while
//! the stages ran, so it always agrees with the exported tickets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use triage_core::{ErrorKind, ProcessingStatus, StageFailure, StageStatus, TicketRecord};

use crate::pipeline::AnalysisMode;

/// Run identity and timing, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub model_provider: String,
    pub model: String,
    /// RFC 3339 in the display offset.
    pub processed_at: String,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisCounts {
    pub success: usize,
    pub failed: usize,
    /// Never attempted because fetch or synthesis failed.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodBreakdown {
    pub confidence_breakdown: BTreeMap<String, usize>,
    pub pod_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsBreakdown {
    /// Model assessment of whether the tool was used.
    pub was_used: BTreeMap<String, usize>,
    /// Derived overall assessment.
    pub could_help: BTreeMap<String, usize>,
    pub triage: BTreeMap<String, usize>,
    pub fix: BTreeMap<String, usize>,
    pub confidence: BTreeMap<String, usize>,
    pub gap_areas: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationBreakdown {
    pub total_escalated: usize,
    pub total_not_escalated: usize,
    /// Percentage of successfully fetched tickets, e.g. `"33.33%"`.
    pub escalation_rate: String,
}

/// Metadata block written at the top of every JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub analysis_type: AnalysisMode,
    pub model_provider: String,
    pub model: String,
    pub total_tickets: usize,
    /// Tickets that completed every analysis the mode asked for.
    pub successfully_processed: usize,
    pub failed: usize,
    pub fetch: StageCounts,
    pub synthesis: StageCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorization: Option<AnalysisCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_analysis: Option<AnalysisCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_analysis: Option<PodBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_breakdown: Option<DiagnosticsBreakdown>,
    pub escalation_breakdown: EscalationBreakdown,
    pub processed_at: String,
    pub processing_time_seconds: f64,
}

/// POD key used when the model's choice was rejected.
pub const UNASSIGNED_POD: &str = "unassigned";

impl RunSummary {
    pub fn from_records(records: &[TicketRecord], mode: AnalysisMode, meta: RunMeta) -> Self {
        let fetch = StageCounts {
            success: count(records, |r| {
                matches!(
                    r.processing_status,
                    ProcessingStatus::Success | ProcessingStatus::SynthesisFailed
                )
            }),
            failed: count(records, |r| r.processing_status == ProcessingStatus::Failed),
        };
        let synthesis = StageCounts {
            success: count(records, TicketRecord::is_synthesized),
            failed: count(records, |r| {
                r.processing_status == ProcessingStatus::SynthesisFailed
            }),
        };

        let categorization = mode
            .includes_categorization()
            .then(|| analysis_counts(records, |r| r.categorization_status));
        let diagnostics_analysis = mode
            .includes_diagnostics()
            .then(|| analysis_counts(records, |r| r.diagnostics_analysis_status));

        // Per ticket: in `both` mode a ticket counts as processed only when
        // both analyses succeeded, and as failed when either one failed.
        let analyses = |r: &TicketRecord| {
            [
                mode.includes_categorization().then_some(r.categorization_status),
                mode.includes_diagnostics().then_some(r.diagnostics_analysis_status),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
        };
        let successfully_processed = count(records, |r| {
            analyses(r).iter().all(|s| *s == Some(StageStatus::Success))
        });
        let analysis_failed =
            count(records, |r| analyses(r).contains(&Some(StageStatus::Failed)));

        Self {
            run_id: meta.run_id,
            analysis_type: mode,
            model_provider: meta.model_provider,
            model: meta.model,
            total_tickets: records.len(),
            successfully_processed,
            failed: fetch.failed + synthesis.failed + analysis_failed,
            fetch,
            synthesis,
            categorization,
            diagnostics_analysis,
            pod_analysis: mode.includes_categorization().then(|| pod_breakdown(records)),
            diagnostics_breakdown: mode
                .includes_diagnostics()
                .then(|| diagnostics_breakdown(records)),
            escalation_breakdown: escalation_breakdown(records),
            processed_at: meta.processed_at,
            processing_time_seconds: round2(meta.processing_time_seconds),
        }
    }
}

fn count(records: &[TicketRecord], pred: impl Fn(&TicketRecord) -> bool) -> usize {
    records.iter().filter(|r| pred(*r)).count()
}

fn analysis_counts(
    records: &[TicketRecord],
    status: impl Fn(&TicketRecord) -> Option<StageStatus>,
) -> AnalysisCounts {
    let mut counts = AnalysisCounts::default();
    for record in records {
        match status(record) {
            Some(StageStatus::Success) => counts.success += 1,
            Some(StageStatus::Failed) => counts.failed += 1,
            None => counts.skipped += 1,
        }
    }
    counts
}

fn bump(map: &mut BTreeMap<String, usize>, key: impl Into<String>) {
    *map.entry(key.into()).or_default() += 1;
}

fn pod_breakdown(records: &[TicketRecord]) -> PodBreakdown {
    let mut out = PodBreakdown::default();
    for c in records.iter().filter_map(|r| {
        (r.categorization_status == Some(StageStatus::Success))
            .then_some(r.categorization.as_ref())
            .flatten()
    }) {
        bump(&mut out.confidence_breakdown, c.confidence.as_str());
        let pod = if c.primary_pod.is_empty() {
            UNASSIGNED_POD
        } else {
            c.primary_pod.as_str()
        };
        bump(&mut out.pod_distribution, pod);
    }
    out
}

fn diagnostics_breakdown(records: &[TicketRecord]) -> DiagnosticsBreakdown {
    let mut out = DiagnosticsBreakdown::default();
    for a in records.iter().filter_map(|r| {
        (r.diagnostics_analysis_status == Some(StageStatus::Success))
            .then_some(r.diagnostics_analysis.as_ref())
            .flatten()
    }) {
        let help = &a.could_diagnostics_help;
        bump(&mut out.was_used, a.was_diagnostics_used.llm_assessment.as_str());
        bump(&mut out.could_help, help.overall_assessment.as_str());
        bump(&mut out.triage, help.triage_assessment.as_str());
        bump(&mut out.fix, help.fix_assessment.as_str());
        bump(&mut out.confidence, help.confidence.as_str());
        for gap in &help.gaps {
            bump(&mut out.gap_areas, gap.gap_area.as_str());
        }
    }
    out
}

fn escalation_breakdown(records: &[TicketRecord]) -> EscalationBreakdown {
    let fetched: Vec<_> = records
        .iter()
        .filter(|r| r.processing_status == ProcessingStatus::Success)
        .collect();
    let escalated = fetched
        .iter()
        .filter(|r| r.custom_fields.escalation.is_escalated)
        .count();
    let rate = if fetched.is_empty() {
        0.0
    } else {
        escalated as f64 / fetched.len() as f64 * 100.0
    };
    EscalationBreakdown {
        total_escalated: escalated,
        total_not_escalated: fetched.len() - escalated,
        escalation_rate: format!("{:.2}%", rate),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One entry in the export's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub ticket_id: String,
    pub serial_no: Option<u32>,
    /// `fetch`, `synthesis`, `categorization` or `diagnostics`.
    pub stage: String,
    pub error_type: ErrorKind,
    pub message: String,
}

impl ErrorEntry {
    fn new(record: &TicketRecord, stage: &str, failure: &StageFailure) -> Self {
        Self {
            ticket_id: record.ticket_id.clone(),
            serial_no: record.serial_no,
            stage: stage.to_string(),
            error_type: failure.kind,
            message: failure.message.clone(),
        }
    }
}

/// Every stage failure recorded on `records`, in record order.
pub fn collect_errors(records: &[TicketRecord]) -> Vec<ErrorEntry> {
    let mut out = Vec::new();
    for record in records {
        if let Some(failure) = &record.error {
            let stage = match record.processing_status {
                ProcessingStatus::SynthesisFailed => "synthesis",
                _ => "fetch",
            };
            out.push(ErrorEntry::new(record, stage, failure));
        }
        if let Some(failure) = &record.categorization_error {
            out.push(ErrorEntry::new(record, "categorization", failure));
        }
        if let Some(failure) = &record.diagnostics_analysis_error {
            out.push(ErrorEntry::new(record, "diagnostics", failure));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Categorization, Error, Synthesis};

    fn meta() -> RunMeta {
        RunMeta {
            run_id: Uuid::nil(),
            model_provider: "gemini".into(),
            model: "mock-model".into(),
            processed_at: "2026-01-05T10:00:00+05:30".into(),
            processing_time_seconds: 12.3456,
        }
    }

    fn categorized(id: &str, pod: &str, confidence: &str, escalated: bool) -> TicketRecord {
        let mut r = TicketRecord::pending(id, None);
        r.processing_status = ProcessingStatus::Success;
        r.synthesis = Some(Synthesis::default());
        r.custom_fields.escalation.is_escalated = escalated;
        r.categorization = Some(Categorization {
            primary_pod: pod.into(),
            confidence: confidence.into(),
            ..Default::default()
        });
        r.categorization_status = Some(StageStatus::Success);
        r
    }

    fn fetch_failed(id: &str) -> TicketRecord {
        let mut r = TicketRecord::pending(id, None);
        r.processing_status = ProcessingStatus::Failed;
        r.error = Some(StageFailure::from(&Error::TicketNotFound(id.into())));
        r
    }

    #[test]
    fn test_pod_summary_counts() {
        let records = vec![
            categorized("1", "Guidance", "confident", true),
            categorized("2", "Guidance", "not confident", false),
            categorized("3", "", "not confident", false),
            fetch_failed("4"),
        ];
        let summary = RunSummary::from_records(&records, AnalysisMode::Pod, meta());

        assert_eq!(summary.total_tickets, 4);
        assert_eq!(summary.successfully_processed, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fetch, StageCounts { success: 3, failed: 1 });
        assert_eq!(
            summary.categorization,
            Some(AnalysisCounts {
                success: 3,
                failed: 0,
                skipped: 1
            })
        );
        assert!(summary.diagnostics_analysis.is_none());

        let pods = summary.pod_analysis.unwrap();
        assert_eq!(pods.pod_distribution["Guidance"], 2);
        assert_eq!(pods.pod_distribution[UNASSIGNED_POD], 1);
        assert_eq!(pods.confidence_breakdown["not confident"], 2);
        assert_eq!(summary.processing_time_seconds, 12.35);
    }

    #[test]
    fn test_escalation_rate_format() {
        let records = vec![
            categorized("1", "Mobile", "confident", true),
            categorized("2", "Mobile", "confident", false),
            categorized("3", "Mobile", "confident", false),
            fetch_failed("4"),
        ];
        let summary = RunSummary::from_records(&records, AnalysisMode::Pod, meta());
        assert_eq!(
            summary.escalation_breakdown,
            EscalationBreakdown {
                total_escalated: 1,
                total_not_escalated: 2,
                escalation_rate: "33.33%".into(),
            }
        );
    }

    #[test]
    fn test_escalation_rate_zero_when_nothing_fetched() {
        let summary = RunSummary::from_records(&[fetch_failed("1")], AnalysisMode::Pod, meta());
        assert_eq!(summary.escalation_breakdown.escalation_rate, "0.00%");
        assert_eq!(summary.escalation_breakdown.total_not_escalated, 0);
    }

    #[test]
    fn test_both_mode_uses_weakest_analysis() {
        let mut failed_diag = categorized("1", "WFE", "confident", false);
        failed_diag.diagnostics_analysis_status = Some(StageStatus::Failed);
        failed_diag.diagnostics_analysis_error =
            Some(StageFailure::from(&Error::Parse("bad json".into())));
        let records = vec![failed_diag, categorized("2", "WFE", "confident", false)];

        let summary = RunSummary::from_records(&records, AnalysisMode::Both, meta());
        assert_eq!(summary.categorization.unwrap().success, 2);
        let diag = summary.diagnostics_analysis.unwrap();
        assert_eq!(diag.failed, 1);
        assert_eq!(diag.skipped, 1);
        assert_eq!(summary.successfully_processed, 0);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_both_mode_counts_per_ticket_with_crossed_failures() {
        let mut diag_failed = categorized("1", "WFE", "confident", false);
        diag_failed.diagnostics_analysis_status = Some(StageStatus::Failed);
        let mut cat_failed = categorized("2", "WFE", "confident", false);
        cat_failed.categorization_status = Some(StageStatus::Failed);
        cat_failed.diagnostics_analysis_status = Some(StageStatus::Success);
        let mut both_ok = categorized("3", "WFE", "confident", false);
        both_ok.diagnostics_analysis_status = Some(StageStatus::Success);
        let records = vec![diag_failed, cat_failed, both_ok, fetch_failed("4")];

        let summary = RunSummary::from_records(&records, AnalysisMode::Both, meta());
        assert_eq!(summary.categorization.unwrap().success, 2);
        assert_eq!(summary.diagnostics_analysis.unwrap().success, 2);
        assert_eq!(summary.successfully_processed, 1);
        // Two tickets with one failed analysis each, plus one fetch failure.
        assert_eq!(summary.failed, 3);
        assert_eq!(
            summary.successfully_processed + summary.failed,
            summary.total_tickets
        );
    }

    #[test]
    fn test_serialized_shape_omits_unused_sections() {
        let summary = RunSummary::from_records(&[], AnalysisMode::Diagnostics, meta());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["analysis_type"], "diagnostics");
        assert!(json.get("pod_analysis").is_none());
        assert!(json.get("diagnostics_breakdown").is_some());
        assert_eq!(json["escalation_breakdown"]["escalation_rate"], "0.00%");
    }

    #[test]
    fn test_collect_errors_by_stage() {
        let mut synth_failed = TicketRecord::pending("2", Some(2));
        synth_failed.processing_status = ProcessingStatus::SynthesisFailed;
        synth_failed.error = Some(StageFailure::from(&Error::Inference("quota".into())));

        let mut cat_failed = categorized("3", "", "confident", false);
        cat_failed.categorization_status = Some(StageStatus::Failed);
        cat_failed.categorization_error =
            Some(StageFailure::from(&Error::Parse("empty summary".into())));

        let errors = collect_errors(&[fetch_failed("1"), synth_failed, cat_failed]);
        let stages: Vec<_> = errors.iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(stages, vec!["fetch", "synthesis", "categorization"]);
        assert_eq!(errors[0].error_type, ErrorKind::NotFound);
        assert_eq!(errors[1].serial_no, Some(2));
    }
}
