//! Text helpers shared by the helpdesk client and prompt builders.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(br|/p|/div|/li|/tr|/h[1-6])\s*/?\s*>").expect("valid regex")
});
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// Strip HTML markup from helpdesk text, keeping line structure.
pub fn strip_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let with_breaks = BLOCK_TAG.replace_all(text, "\n");
    let without_tags = ANY_TAG.replace_all(&with_breaks, "");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let collapsed = SPACE_RUN.replace_all(&decoded, " ");
    let collapsed = BLANK_RUN.replace_all(&collapsed, "\n\n");
    collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Display offset from a minute count, falling back to UTC when out of range.
pub fn display_offset(offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| {
        warn!(offset_minutes, "Invalid display offset, using UTC");
        Utc.fix()
    })
}

/// Re-render an RFC 3339 timestamp in the display offset.
///
/// Unparseable input is returned unchanged.
pub fn to_display_timestamp(utc: &str, offset_minutes: i32) -> String {
    match DateTime::parse_from_rfc3339(utc) {
        Ok(parsed) => parsed
            .with_timezone(&display_offset(offset_minutes))
            .to_rfc3339(),
        Err(e) => {
            if !utc.is_empty() {
                warn!(timestamp = %utc, error = %e, "Could not parse timestamp");
            }
            utc.to_string()
        }
    }
}

/// Current time in the display offset.
pub fn now_display(offset_minutes: i32) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&display_offset(offset_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup_removes_tags() {
        let html = "<p>Hello <b>world</b></p><p>Second&nbsp;line</p>";
        assert_eq!(strip_markup(html), "Hello world\nSecond line");
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        assert_eq!(strip_markup("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
    }

    #[test]
    fn test_strip_markup_collapses_blank_lines() {
        let html = "one<br><br><br><br>two";
        assert_eq!(strip_markup(html), "one\n\ntwo");
    }

    #[test]
    fn test_strip_markup_plain_text_untouched() {
        assert_eq!(strip_markup("just text"), "just text");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_to_display_timestamp_ist() {
        assert_eq!(
            to_display_timestamp("2026-03-01T10:00:00Z", 330),
            "2026-03-01T15:30:00+05:30"
        );
    }

    #[test]
    fn test_to_display_timestamp_passthrough_on_garbage() {
        assert_eq!(to_display_timestamp("yesterday", 330), "yesterday");
    }

    #[test]
    fn test_display_offset_out_of_range_is_utc() {
        assert_eq!(display_offset(100_000).local_minus_utc(), 0);
    }
}
