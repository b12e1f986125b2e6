//! Zendesk REST client implementing [`TicketSource`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace, warn};

use triage_core::defaults::{MAX_COMMENT_PAGES, ZENDESK_API_PREFIX};
use triage_core::{
    Comment, CommentBatch, Error, Result, TicketDetails, TicketSource, ZendeskSettings,
};

use crate::mapping::{to_comment, to_details};
use crate::types::{CommentPage, TicketEnvelope};

/// Zendesk ticket client authenticated with an API token.
pub struct ZendeskClient {
    client: Client,
    settings: ZendeskSettings,
    api_key: String,
    timezone_offset_minutes: i32,
}

impl ZendeskClient {
    /// Create a client; fails with [`Error::Config`] when the API token is missing.
    pub fn new(
        settings: ZendeskSettings,
        request_timeout_secs: u64,
        timezone_offset_minutes: i32,
    ) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("ZENDESK_API_KEY is required but not set".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "zendesk",
            api_root = %settings.api_root(),
            timeout_secs = request_timeout_secs,
            "Initializing Zendesk client"
        );
        Ok(Self {
            client,
            settings,
            api_key,
            timezone_offset_minutes,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.settings.api_root(), ZENDESK_API_PREFIX, path)
    }

    /// GET `url` and decode the JSON body, classifying failures.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, ticket_id: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .basic_auth(format!("{}/token", self.settings.email), Some(&self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, ticket_id, &body));
        }
        response.json::<T>().await.map_err(|e| {
            Error::Request(format!(
                "Invalid Zendesk response for ticket {}: {}",
                ticket_id, e
            ))
        })
    }
}

/// Map a non-2xx Zendesk response onto the triage error taxonomy.
fn classify_status(status: StatusCode, ticket_id: &str, body: &str) -> Error {
    let detail: String = body.chars().take(200).collect();
    match status {
        StatusCode::NOT_FOUND => Error::TicketNotFound(ticket_id.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Config(format!(
            "Zendesk rejected credentials ({}): {}",
            status, detail
        )),
        _ => Error::Request(format!(
            "Zendesk returned {} for ticket {}: {}",
            status, ticket_id, detail
        )),
    }
}

#[async_trait]
impl TicketSource for ZendeskClient {
    #[instrument(skip(self), fields(subsystem = "zendesk", component = "client", op = "fetch_ticket"))]
    async fn fetch_ticket(&self, ticket_id: &str) -> Result<TicketDetails> {
        let start = Instant::now();
        let url = self.api_url(&format!("/tickets/{}.json", ticket_id));
        let envelope: TicketEnvelope = self.get_json(&url, ticket_id).await?;
        debug!(
            custom_fields = envelope.ticket.custom_fields.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched ticket"
        );
        Ok(to_details(
            envelope.ticket,
            &self.settings.field_ids,
            self.timezone_offset_minutes,
        ))
    }

    #[instrument(skip(self), fields(subsystem = "zendesk", component = "client", op = "fetch_comments"))]
    async fn fetch_comments(&self, ticket_id: &str) -> Result<Vec<Comment>> {
        let start = Instant::now();
        let mut comments = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let batch = self.fetch_comment_page(ticket_id, cursor.as_deref()).await?;
            comments.extend(batch.comments);
            pages += 1;
            cursor = batch.next;
            if cursor.is_none() {
                break;
            }
            if pages >= MAX_COMMENT_PAGES {
                warn!(pages, "Comment pagination limit reached, thread truncated");
                break;
            }
        }

        debug!(
            count = comments.len(),
            pages,
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched comments"
        );
        Ok(comments)
    }

    /// One `comments.json` page; `cursor` is the previous page's `next_page` URL.
    async fn fetch_comment_page(
        &self,
        ticket_id: &str,
        cursor: Option<&str>,
    ) -> Result<CommentBatch> {
        let url = match cursor {
            Some(next) => next.to_string(),
            None => self.api_url(&format!("/tickets/{}/comments.json", ticket_id)),
        };
        let page: CommentPage = self.get_json(&url, ticket_id).await?;
        trace!(
            ticket_id,
            comments = page.comments.len(),
            has_next = page.next_page.is_some(),
            "Fetched comment page"
        );
        Ok(CommentBatch {
            comments: page
                .comments
                .into_iter()
                .map(|c| to_comment(c, self.timezone_offset_minutes))
                .collect(),
            // A page linking to itself would loop forever.
            next: page.next_page.filter(|n| *n != url),
        })
    }

    fn ticket_url(&self, ticket_id: &str) -> String {
        self.settings.agent_ticket_url(ticket_id)
    }
}
