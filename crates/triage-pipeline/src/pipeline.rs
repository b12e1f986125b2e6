//! Pipeline orchestration: fetch, synthesize, then analyze.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use triage_core::{GenerationBackend, TicketRecord, TicketSource, TriageConfig};

use crate::gate::RemoteCaller;
use crate::runner::{run_stage, NoopProgress, ProgressHook, Stage, StageStats};
use crate::stages::{CategorizeStage, DiagnoseStage, FetchStage, SynthesizeStage};

/// Which analyses to run after synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// POD categorization only.
    #[default]
    Pod,
    Diagnostics,
    /// Categorization and diagnostics, run concurrently.
    Both,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Pod => "pod",
            AnalysisMode::Diagnostics => "diagnostics",
            AnalysisMode::Both => "both",
        }
    }

    pub fn includes_categorization(&self) -> bool {
        matches!(self, AnalysisMode::Pod | AnalysisMode::Both)
    }

    pub fn includes_diagnostics(&self) -> bool {
        matches!(self, AnalysisMode::Diagnostics | AnalysisMode::Both)
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pod" => Ok(AnalysisMode::Pod),
            "diagnostics" => Ok(AnalysisMode::Diagnostics),
            "both" => Ok(AnalysisMode::Both),
            other => Err(format!(
                "unknown analysis type '{}' (expected pod, diagnostics or both)",
                other
            )),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final records plus per-stage counts.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Every input record, sorted by serial number.
    pub records: Vec<TicketRecord>,
    pub stages: Vec<StageStats>,
}

/// The full ticket pipeline.
pub struct Pipeline {
    fetch: Arc<dyn Stage>,
    synthesize: Arc<dyn Stage>,
    categorize: Arc<dyn Stage>,
    diagnose: Arc<dyn Stage>,
    progress: Arc<dyn ProgressHook>,
}

impl Pipeline {
    /// Build the stages with one helpdesk gate and one LLM gate.
    ///
    /// All LLM stages share the LLM gate, so `llm_max_concurrent` bounds the
    /// run as a whole, including both analyses in `both` mode.
    pub fn new(
        source: Arc<dyn TicketSource>,
        backend: Arc<dyn GenerationBackend>,
        config: &TriageConfig,
    ) -> Self {
        let zendesk = RemoteCaller::zendesk(&config.limits);
        let llm = RemoteCaller::llm(&config.limits, &config.llm);
        let vocabs = Arc::new(config.vocabularies.clone());

        Self {
            fetch: Arc::new(FetchStage::new(source, zendesk)),
            synthesize: Arc::new(SynthesizeStage::new(backend.clone(), llm.clone())),
            categorize: Arc::new(CategorizeStage::new(
                backend.clone(),
                llm.clone(),
                vocabs.clone(),
            )),
            diagnose: Arc::new(DiagnoseStage::new(
                backend,
                llm,
                vocabs,
                config.timezone_offset_minutes,
            )),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHook>) -> Self {
        self.progress = progress;
        self
    }

    /// Run every stage over `records`. Never fails; per-ticket errors are
    /// recorded on the tickets.
    #[instrument(skip_all, fields(subsystem = "pipeline", mode = %mode, tickets = records.len()))]
    pub async fn run(&self, records: Vec<TicketRecord>, mode: AnalysisMode) -> PipelineResult {
        let progress = self.progress.as_ref();
        let mut stages = Vec::with_capacity(4);

        let fetched = run_stage(self.fetch.clone(), records, progress).await;
        stages.push(fetched.stats);
        let synthesized = run_stage(self.synthesize.clone(), fetched.records, progress).await;
        stages.push(synthesized.stats);

        let mut records = match mode {
            AnalysisMode::Pod => {
                let out = run_stage(self.categorize.clone(), synthesized.records, progress).await;
                stages.push(out.stats);
                out.records
            }
            AnalysisMode::Diagnostics => {
                let out = run_stage(self.diagnose.clone(), synthesized.records, progress).await;
                stages.push(out.stats);
                out.records
            }
            AnalysisMode::Both => {
                let (categorized, diagnosed) = tokio::join!(
                    run_stage(
                        self.categorize.clone(),
                        synthesized.records.clone(),
                        progress
                    ),
                    run_stage(self.diagnose.clone(), synthesized.records, progress),
                );
                stages.push(categorized.stats);
                stages.push(diagnosed.stats);
                merge_analyses(categorized.records, diagnosed.records)
            }
        };

        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        info!(tickets = records.len(), "Pipeline finished");
        PipelineResult { records, stages }
    }
}

/// Copy the diagnostics fields of `diagnosed` onto the matching records of
/// `categorized`.
///
/// Records are matched on `(serial_no, ticket_id)`, not position. A ticket ID
/// listed twice in the input pairs up in order of appearance.
pub fn merge_analyses(
    categorized: Vec<TicketRecord>,
    diagnosed: Vec<TicketRecord>,
) -> Vec<TicketRecord> {
    let mut by_key: HashMap<(Option<u32>, String), VecDeque<TicketRecord>> = HashMap::new();
    for record in diagnosed {
        by_key
            .entry((record.serial_no, record.ticket_id.clone()))
            .or_default()
            .push_back(record);
    }

    let mut merged = Vec::with_capacity(categorized.len());
    for mut record in categorized {
        let key = (record.serial_no, record.ticket_id.clone());
        if let Some(diag) = by_key.get_mut(&key).and_then(VecDeque::pop_front) {
            record.diagnostics_analysis = diag.diagnostics_analysis;
            record.diagnostics_analysis_status = diag.diagnostics_analysis_status;
            record.diagnostics_analysis_error = diag.diagnostics_analysis_error;
        }
        merged.push(record);
    }
    merged.extend(by_key.into_values().flatten());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Categorization, StageStatus};

    fn record(id: &str, serial: u32) -> TicketRecord {
        TicketRecord::pending(id, Some(serial))
    }

    #[test]
    fn test_analysis_mode_parse() {
        assert_eq!("pod".parse::<AnalysisMode>().unwrap(), AnalysisMode::Pod);
        assert_eq!(" Both ".parse::<AnalysisMode>().unwrap(), AnalysisMode::Both);
        assert!("everything".parse::<AnalysisMode>().is_err());
        assert_eq!(AnalysisMode::Diagnostics.to_string(), "diagnostics");
    }

    #[test]
    fn test_analysis_mode_includes() {
        assert!(AnalysisMode::Pod.includes_categorization());
        assert!(!AnalysisMode::Pod.includes_diagnostics());
        assert!(AnalysisMode::Both.includes_categorization());
        assert!(AnalysisMode::Both.includes_diagnostics());
    }

    #[test]
    fn test_merge_by_id_ignores_order() {
        let mut categorized = vec![record("10", 1), record("20", 2)];
        for r in &mut categorized {
            r.categorization = Some(Categorization {
                primary_pod: format!("pod-{}", r.ticket_id),
                ..Default::default()
            });
            r.categorization_status = Some(StageStatus::Success);
        }
        let mut diagnosed = vec![record("20", 2), record("10", 1)];
        diagnosed[0].diagnostics_analysis_status = Some(StageStatus::Success);
        diagnosed[1].diagnostics_analysis_status = Some(StageStatus::Failed);

        let merged = merge_analyses(categorized, diagnosed);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].ticket_id, "10");
        assert_eq!(merged[0].diagnostics_analysis_status, Some(StageStatus::Failed));
        assert_eq!(merged[1].diagnostics_analysis_status, Some(StageStatus::Success));
        assert_eq!(
            merged[1].categorization.as_ref().unwrap().primary_pod,
            "pod-20"
        );
    }

    #[test]
    fn test_merge_keeps_duplicate_ids() {
        let categorized = vec![record("7", 1), record("7", 2)];
        let mut diagnosed = vec![record("7", 2), record("7", 1)];
        diagnosed[0].diagnostics_analysis_status = Some(StageStatus::Failed);

        let merged = merge_analyses(categorized, diagnosed);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].diagnostics_analysis_status, None);
        assert_eq!(merged[1].diagnostics_analysis_status, Some(StageStatus::Failed));
    }

    #[test]
    fn test_merge_never_drops_unmatched() {
        let merged = merge_analyses(vec![record("1", 1)], vec![record("2", 2)]);
        assert_eq!(merged.len(), 2);
    }
}
