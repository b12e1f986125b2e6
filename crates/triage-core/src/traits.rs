//! Core traits for ticket-triage abstractions.
//!
//! These traits define the seams between the pipeline and its remote systems,
//! so the helpdesk and the LLM can be replaced by in-memory fakes in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Comment, CommentBatch, TicketDetails};

// =============================================================================
// TICKET SOURCE
// =============================================================================

/// Read access to the helpdesk.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Fetch the ticket header and custom fields.
    ///
    /// Returns [`crate::Error::TicketNotFound`] when the ticket does not exist.
    async fn fetch_ticket(&self, ticket_id: &str) -> Result<TicketDetails>;

    /// Fetch every comment on the ticket, oldest first, following pagination.
    async fn fetch_comments(&self, ticket_id: &str) -> Result<Vec<Comment>>;

    /// Fetch one page of comments, oldest first.
    ///
    /// `cursor` is `None` for the first page and the previous batch's `next`
    /// afterwards. Sources without pagination return the whole thread as one
    /// batch.
    async fn fetch_comment_page(
        &self,
        ticket_id: &str,
        cursor: Option<&str>,
    ) -> Result<CommentBatch> {
        let _ = cursor;
        Ok(CommentBatch {
            comments: self.fetch_comments(ticket_id).await?,
            next: None,
        })
    }

    /// Human-facing link to the ticket.
    fn ticket_url(&self, ticket_id: &str) -> String;
}

// =============================================================================
// INFERENCE
// =============================================================================

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
