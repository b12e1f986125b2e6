use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use triage_core::{
    Error, GenerationBackend, Result, StageFailure, StageStatus, TicketRecord, Vocabularies,
};
use triage_inference::{categorization_prompt, parse_categorization_response};

use crate::gate::RemoteCaller;
use crate::runner::{Stage, StageKind};

/// Assigns a synthesized ticket to a POD.
pub struct CategorizeStage {
    backend: Arc<dyn GenerationBackend>,
    gate: RemoteCaller,
    vocabs: Arc<Vocabularies>,
}

impl CategorizeStage {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        gate: RemoteCaller,
        vocabs: Arc<Vocabularies>,
    ) -> Self {
        Self {
            backend,
            gate,
            vocabs,
        }
    }
}

#[async_trait]
impl Stage for CategorizeStage {
    fn kind(&self) -> StageKind {
        StageKind::Categorize
    }

    fn is_eligible(&self, record: &TicketRecord) -> bool {
        record.is_synthesized()
    }

    async fn process(&self, record: &TicketRecord) -> Result<TicketRecord> {
        let synthesis = record
            .synthesis
            .as_ref()
            .ok_or_else(|| Error::Parse("ticket has no synthesis".to_string()))?;
        if synthesis.summary.trim().is_empty() {
            return Err(Error::Parse(
                "synthesis summary is empty, nothing to categorize".to_string(),
            ));
        }

        let prompt = categorization_prompt(&record.subject, synthesis, &self.vocabs);
        let response = self
            .gate
            .call("categorize", || self.backend.generate(&prompt))
            .await?;

        let parsed = parse_categorization_response(&response, &self.vocabs);
        debug!(
            ticket_id = %record.ticket_id,
            pod = %parsed.value.primary_pod,
            confidence = %parsed.value.confidence,
            warnings = parsed.warnings.len(),
            "Categorized ticket"
        );
        let mut updated = record.clone();
        updated.categorization = Some(parsed.into_inner());
        updated.categorization_status = Some(StageStatus::Success);
        updated.categorization_error = None;
        Ok(updated)
    }

    fn mark_failed(&self, record: &mut TicketRecord, err: &Error) {
        record.categorization_status = Some(StageStatus::Failed);
        record.categorization_error = Some(StageFailure::from(err));
    }
}
