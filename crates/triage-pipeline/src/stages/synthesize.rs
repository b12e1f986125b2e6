use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use triage_core::{
    Error, GenerationBackend, ProcessingStatus, Result, StageFailure, TicketRecord,
};
use triage_inference::{parse_synthesis_response, synthesis_prompt};

use crate::gate::RemoteCaller;
use crate::runner::{Stage, StageKind};

/// Condenses the ticket thread into issue, root cause, summary and resolution.
pub struct SynthesizeStage {
    backend: Arc<dyn GenerationBackend>,
    gate: RemoteCaller,
}

impl SynthesizeStage {
    pub fn new(backend: Arc<dyn GenerationBackend>, gate: RemoteCaller) -> Self {
        Self { backend, gate }
    }
}

#[async_trait]
impl Stage for SynthesizeStage {
    fn kind(&self) -> StageKind {
        StageKind::Synthesize
    }

    fn is_eligible(&self, record: &TicketRecord) -> bool {
        record.processing_status == ProcessingStatus::Success && record.synthesis.is_none()
    }

    async fn process(&self, record: &TicketRecord) -> Result<TicketRecord> {
        let prompt = synthesis_prompt(record);
        let response = self
            .gate
            .call("synthesize", || self.backend.generate(&prompt))
            .await?;

        let parsed = parse_synthesis_response(&response);
        debug!(
            ticket_id = %record.ticket_id,
            prompt_len = prompt.len(),
            response_len = response.len(),
            warnings = parsed.warnings.len(),
            "Synthesized ticket"
        );
        let mut updated = record.clone();
        updated.synthesis = Some(parsed.into_inner());
        Ok(updated)
    }

    fn mark_failed(&self, record: &mut TicketRecord, err: &Error) {
        record.processing_status = ProcessingStatus::SynthesisFailed;
        record.error = Some(StageFailure::from(err));
    }
}
