use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use triage_core::defaults::MAX_COMMENT_PAGES;
use triage_core::{
    Comment, Error, ProcessingStatus, Result, StageFailure, TicketRecord, TicketSource,
};

use crate::gate::RemoteCaller;
use crate::runner::{Stage, StageKind};

/// Loads the ticket header and comment thread from the helpdesk.
pub struct FetchStage {
    source: Arc<dyn TicketSource>,
    gate: RemoteCaller,
}

impl FetchStage {
    pub fn new(source: Arc<dyn TicketSource>, gate: RemoteCaller) -> Self {
        Self { source, gate }
    }

    /// Whole comment thread, one gated call per page.
    ///
    /// Each page gets its own timeout and retry budget, so a failing page is
    /// retried alone instead of restarting the thread from page one.
    async fn fetch_thread(&self, id: &str) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();
        let mut cursor: Option<String> = None;
        for page in 1..=MAX_COMMENT_PAGES {
            let after = cursor.as_deref();
            let batch = self
                .gate
                .call("fetch_comments", || self.source.fetch_comment_page(id, after))
                .await?;
            comments.extend(batch.comments);
            cursor = batch.next;
            if cursor.is_none() {
                return Ok(comments);
            }
            if page == MAX_COMMENT_PAGES {
                warn!(
                    ticket_id = id,
                    pages = page,
                    "Comment pagination limit reached, thread truncated"
                );
            }
        }
        Ok(comments)
    }
}

#[async_trait]
impl Stage for FetchStage {
    fn kind(&self) -> StageKind {
        StageKind::Fetch
    }

    fn is_eligible(&self, record: &TicketRecord) -> bool {
        record.processing_status == ProcessingStatus::Pending
    }

    async fn process(&self, record: &TicketRecord) -> Result<TicketRecord> {
        let id = record.ticket_id.as_str();
        let (details, comments) = futures::try_join!(
            self.gate
                .call("fetch_ticket", || self.source.fetch_ticket(id)),
            self.fetch_thread(id),
        )?;

        debug!(ticket_id = id, comments = comments.len(), "Fetched ticket");
        let mut updated = record.clone();
        updated.apply_fetched(self.source.ticket_url(id), details, comments);
        Ok(updated)
    }

    fn mark_failed(&self, record: &mut TicketRecord, err: &Error) {
        record.processing_status = ProcessingStatus::Failed;
        record.error = Some(StageFailure::from(err));
    }
}
