//! Zendesk REST API wire types.
//!
//! Only the fields the triage pipeline reads are modelled. Unknown fields are
//! ignored, and most known ones default so a sparse payload still parses.

use serde::Deserialize;
use serde_json::Value;

/// `GET /api/v2/tickets/{id}.json`
#[derive(Debug, Deserialize)]
pub struct TicketEnvelope {
    pub ticket: ZendeskTicket,
}

#[derive(Debug, Deserialize)]
pub struct ZendeskTicket {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
}

/// One entry of a ticket's `custom_fields` array.
///
/// `value` is a string for text and dropdown fields, a bool for checkboxes
/// and null when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldValue {
    pub id: u64,
    #[serde(default)]
    pub value: Value,
}

impl CustomFieldValue {
    /// The value as text. Checkboxes become `yes`/`no`; null and empty are `None`.
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Bool(true) => Some("yes".to_string()),
            Value::Bool(false) => Some("no".to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// `GET /api/v2/tickets/{id}/comments.json`, one page.
#[derive(Debug, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<ZendeskComment>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ZendeskComment {
    pub id: u64,
    #[serde(default)]
    pub author_id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_public")]
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub via: Option<Via>,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Via {
    #[serde(default)]
    pub source: Option<ViaSource>,
}

#[derive(Debug, Deserialize)]
pub struct ViaSource {
    #[serde(default)]
    pub from: Option<ViaParty>,
}

#[derive(Debug, Deserialize)]
pub struct ViaParty {
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_ticket_parses() {
        let envelope: TicketEnvelope =
            serde_json::from_str(r#"{"ticket": {"id": 42}}"#).unwrap();
        assert_eq!(envelope.ticket.id, 42);
        assert!(envelope.ticket.subject.is_none());
        assert!(envelope.ticket.custom_fields.is_empty());
    }

    #[test]
    fn test_custom_field_as_text() {
        let field = |value: Value| CustomFieldValue { id: 1, value };
        assert_eq!(
            field(Value::from(" diagnostics_used_yes ")).as_text().as_deref(),
            Some("diagnostics_used_yes")
        );
        assert_eq!(field(Value::Bool(true)).as_text().as_deref(), Some("yes"));
        assert_eq!(field(Value::Bool(false)).as_text().as_deref(), Some("no"));
        assert_eq!(field(Value::Null).as_text(), None);
        assert_eq!(field(Value::from("")).as_text(), None);
    }

    #[test]
    fn test_comment_defaults_to_public() {
        let comment: ZendeskComment =
            serde_json::from_str(r#"{"id": 1, "author_id": 7, "body": "hi"}"#).unwrap();
        assert!(comment.public);
        assert!(comment.via.is_none());
    }
}
