//! Ticket thread synthesis: prompt and response parsing.

use triage_core::defaults::NO_COMMENTS_PLACEHOLDER;
use triage_core::text::strip_markup;
use triage_core::{Comment, Synthesis, TicketRecord};

use crate::sections::extract_section;
use crate::validation::{Validated, Warnings};

/// Section labels, in the order the model is asked to produce them.
pub const SYNTHESIS_LABELS: [&str; 4] = ["Issue Reported", "Root Cause", "Summary", "Resolution"];

/// Render the comment thread the way the synthesis prompt presents it.
///
/// ```text
/// Comment #1 (Public)
/// Author: Jane Agent
/// Time: 2026-01-05T10:00:00+05:30
/// ---
/// body
/// ---
/// ```
pub fn format_comment_thread(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return NO_COMMENTS_PLACEHOLDER.to_string();
    }
    comments
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "Comment #{} ({})\nAuthor: {}\nTime: {}\n---\n{}\n---",
                i + 1,
                if c.public { "Public" } else { "Internal" },
                c.author_name,
                c.created_at,
                strip_markup(&c.body)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Generates the synthesis prompt for a fetched ticket.
pub fn synthesis_prompt(record: &TicketRecord) -> String {
    format!(
        r#"Analyze this support ticket, including every comment in the thread. The problem
first reported can differ from the one found during troubleshooting; report what
actually happened and what actually fixed it.

TICKET
Subject: {subject}

Description:
{description}

COMMENT THREAD
{thread}

Respond using exactly these sections:

**Issue Reported:**
<one line: the issue the customer reported or that was identified>

**Root Cause:**
<one line: the underlying technical cause>

**Summary:**
<3-4 lines: key troubleshooting steps and how the solution was reached>

**Resolution:**
<one line: how the issue was resolved>
"#,
        subject = record.subject,
        description = strip_markup(&record.description),
        thread = format_comment_thread(&record.comments),
    )
}

/// Parse a synthesis response. Missing sections become empty strings.
pub fn parse_synthesis_response(response: &str) -> Validated<Synthesis> {
    let mut warnings = Warnings::new("synthesis_parser");
    let mut field = |label: &str| match extract_section(response, label) {
        Some(value) => {
            if value.is_empty() {
                warnings.push(format!("Section '{}' is empty", label));
            }
            value
        }
        None => {
            warnings.push(format!("Missing section '{}'", label));
            String::new()
        }
    };

    let synthesis = Synthesis {
        issue_reported: field(SYNTHESIS_LABELS[0]),
        root_cause: field(SYNTHESIS_LABELS[1]),
        summary: field(SYNTHESIS_LABELS[2]),
        resolution: field(SYNTHESIS_LABELS[3]),
    };
    warnings.finish(synthesis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: u64, public: bool, body: &str) -> Comment {
        Comment {
            id,
            author_id: 100 + id,
            author_name: format!("Author {}", id),
            created_at: "2026-01-05T10:00:00+05:30".to_string(),
            body: body.to_string(),
            public,
        }
    }

    #[test]
    fn test_format_comment_thread() {
        let thread = format_comment_thread(&[
            comment(1, true, "<p>It broke</p>"),
            comment(2, false, "Looking into it"),
        ]);
        assert_eq!(
            thread,
            "Comment #1 (Public)\nAuthor: Author 1\nTime: 2026-01-05T10:00:00+05:30\n---\nIt broke\n---\n\n\
             Comment #2 (Internal)\nAuthor: Author 2\nTime: 2026-01-05T10:00:00+05:30\n---\nLooking into it\n---"
        );
    }

    #[test]
    fn test_format_empty_thread() {
        assert_eq!(format_comment_thread(&[]), "No comments available.");
    }

    #[test]
    fn test_prompt_contains_ticket_content() {
        let mut record = TicketRecord::pending("1", Some(1));
        record.subject = "Flow not loading".to_string();
        record.description = "<b>Steps</b> to reproduce".to_string();
        let prompt = synthesis_prompt(&record);
        assert!(prompt.contains("Subject: Flow not loading"));
        assert!(prompt.contains("Steps to reproduce"));
        assert!(prompt.contains("No comments available."));
        for label in SYNTHESIS_LABELS {
            assert!(prompt.contains(&format!("**{}:**", label)));
        }
    }

    #[test]
    fn test_parse_full_response() {
        let response = "**Issue Reported:**\nFlow not visible\n\n**Root Cause:**\nCSS selector changed\n\n\
                        **Summary:**\nCustomer reported flow.\nAgent found selector drift.\n\n**Resolution:**\nSelector updated";
        let parsed = parse_synthesis_response(response);
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.issue_reported, "Flow not visible");
        assert_eq!(parsed.value.root_cause, "CSS selector changed");
        assert_eq!(
            parsed.value.summary,
            "Customer reported flow.\nAgent found selector drift."
        );
        assert_eq!(parsed.value.resolution, "Selector updated");
    }

    #[test]
    fn test_parse_missing_sections_warns() {
        let parsed = parse_synthesis_response("**Summary:**\nOnly a summary");
        assert_eq!(parsed.value.summary, "Only a summary");
        assert_eq!(parsed.value.root_cause, "");
        assert_eq!(parsed.warnings.len(), 3);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let response = "**Issue Reported:**\nA\n**Summary:**\nB";
        assert_eq!(
            parse_synthesis_response(response),
            parse_synthesis_response(response)
        );
    }
}
