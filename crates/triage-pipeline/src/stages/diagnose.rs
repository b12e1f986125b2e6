use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use triage_core::text::now_display;
use triage_core::{
    Error, GenerationBackend, Result, StageFailure, StageStatus, TicketRecord, Vocabularies,
};
use triage_inference::{diagnostics_prompt, parse_diagnostics_response};

use crate::gate::RemoteCaller;
use crate::runner::{Stage, StageKind};

/// Assesses whether the diagnostics tool was used and could have helped.
pub struct DiagnoseStage {
    backend: Arc<dyn GenerationBackend>,
    gate: RemoteCaller,
    vocabs: Arc<Vocabularies>,
    timezone_offset_minutes: i32,
}

impl DiagnoseStage {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        gate: RemoteCaller,
        vocabs: Arc<Vocabularies>,
        timezone_offset_minutes: i32,
    ) -> Self {
        Self {
            backend,
            gate,
            vocabs,
            timezone_offset_minutes,
        }
    }
}

#[async_trait]
impl Stage for DiagnoseStage {
    fn kind(&self) -> StageKind {
        StageKind::Diagnose
    }

    fn is_eligible(&self, record: &TicketRecord) -> bool {
        record.is_synthesized()
    }

    async fn process(&self, record: &TicketRecord) -> Result<TicketRecord> {
        let prompt = diagnostics_prompt(record, &self.vocabs);
        let response = self
            .gate
            .call("diagnose", || self.backend.generate(&prompt))
            .await?;

        let mut analysis = parse_diagnostics_response(&response, &self.vocabs)?.into_inner();
        analysis.was_diagnostics_used.custom_field_value =
            record.custom_fields.was_diagnostics_used;
        analysis.metadata.analysis_timestamp =
            Some(now_display(self.timezone_offset_minutes).to_rfc3339());

        debug!(
            ticket_id = %record.ticket_id,
            overall = %analysis.could_diagnostics_help.overall_assessment,
            "Analyzed diagnostics applicability"
        );
        let mut updated = record.clone();
        updated.diagnostics_analysis = Some(analysis);
        updated.diagnostics_analysis_status = Some(StageStatus::Success);
        updated.diagnostics_analysis_error = None;
        Ok(updated)
    }

    fn mark_failed(&self, record: &mut TicketRecord, err: &Error) {
        record.diagnostics_analysis_status = Some(StageStatus::Failed);
        record.diagnostics_analysis_error = Some(StageFailure::from(err));
    }
}
