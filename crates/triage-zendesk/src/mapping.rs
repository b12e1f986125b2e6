//! Mapping from Zendesk wire types to triage records.

use tracing::debug;

use triage_core::text::to_display_timestamp;
use triage_core::{
    determine_escalation, normalize_field_answer, Comment, CustomFieldIds, CustomFields,
    TicketDetails,
};

use crate::types::{CustomFieldValue, ZendeskComment, ZendeskTicket};

/// Display name of a comment's author.
///
/// Zendesk only embeds a name for channel-originated comments
/// (`via.source.from.name`); everything else falls back to the user ID.
pub fn author_name(comment: &ZendeskComment) -> String {
    comment
        .via
        .as_ref()
        .and_then(|via| via.source.as_ref())
        .and_then(|source| source.from.as_ref())
        .and_then(|from| from.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("User {}", comment.author_id))
}

pub fn to_comment(comment: ZendeskComment, offset_minutes: i32) -> Comment {
    Comment {
        id: comment.id,
        author_id: comment.author_id,
        author_name: author_name(&comment),
        created_at: to_display_timestamp(
            comment.created_at.as_deref().unwrap_or(""),
            offset_minutes,
        ),
        public: comment.public,
        body: comment.body,
    }
}

fn field_text(fields: &[CustomFieldValue], id: Option<u64>) -> Option<String> {
    let id = id?;
    fields.iter().find(|f| f.id == id).and_then(CustomFieldValue::as_text)
}

/// Resolve the configured custom fields into their semantic meaning.
///
/// Fields whose ID is not configured, or that are absent on the ticket, read
/// as unset: diagnostics usage becomes `unknown` and the ticket counts as not
/// escalated.
pub fn map_custom_fields(fields: &[CustomFieldValue], ids: &CustomFieldIds) -> CustomFields {
    let diagnostics = field_text(fields, ids.diagnostics_used);
    let cross_team = field_text(fields, ids.cross_team);
    let jira_link = field_text(fields, ids.jira_link);

    let mapped = CustomFields {
        was_diagnostics_used: normalize_field_answer(diagnostics.as_deref()),
        escalation: determine_escalation(cross_team.as_deref(), jira_link.as_deref()),
        support_root_cause: field_text(fields, ids.support_root_cause),
    };
    debug!(
        diagnostics_used = %mapped.was_diagnostics_used,
        is_escalated = mapped.escalation.is_escalated,
        "Mapped custom fields"
    );
    mapped
}

pub fn to_details(
    ticket: ZendeskTicket,
    ids: &CustomFieldIds,
    offset_minutes: i32,
) -> TicketDetails {
    let custom_fields = map_custom_fields(&ticket.custom_fields, ids);
    TicketDetails {
        subject: ticket.subject.unwrap_or_default(),
        description: ticket.description.unwrap_or_default(),
        status: ticket.status.unwrap_or_default(),
        created_at: to_display_timestamp(
            ticket.created_at.as_deref().unwrap_or(""),
            offset_minutes,
        ),
        updated_at: to_display_timestamp(
            ticket.updated_at.as_deref().unwrap_or(""),
            offset_minutes,
        ),
        custom_fields,
    }
}
