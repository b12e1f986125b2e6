//! Labeled-section extraction from free-text model output.
//!
//! Responses look like:
//!
//! ```text
//! **Primary POD:**
//! Guidance
//!
//! **Reasoning:**
//! The customer's flow did not render ...
//! ```
//!
//! A section runs from its label to the next line starting with `**` or the
//! end of the text. Missing sections are reported as `None`, never as an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Any bold label: `**Label:**` or `**Label**:`.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*\s*([^*\n:]+?)\s*(?::\s*\*\*|\*\*\s*:)").expect("valid regex")
});

/// Text under `**{label}:**`, trimmed.
///
/// Label matching is case-insensitive and tolerates `**Label**:` as well as
/// `**Label:**`. Returns `None` when the label is absent and `Some("")` when
/// it is present with an empty body.
pub fn extract_section(text: &str, label: &str) -> Option<String> {
    let label = label.trim();
    let found = LABEL_RE.captures_iter(text).find(|c| {
        c.get(1)
            .is_some_and(|name| name.as_str().trim().to_lowercase() == label.to_lowercase())
    })?;
    let rest = &text[found.get(0)?.end()..];
    let end = rest.find("\n**").unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Whether a section body means "nothing here".
pub fn is_none_marker(value: &str) -> bool {
    let v = value.trim().trim_end_matches('.').to_ascii_lowercase();
    matches!(v.as_str(), "" | "none" | "n/a" | "na" | "null")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "**Primary POD:**\nGuidance\n\n**Reasoning:**\nThe flow broke on step 3.\nIt uses smart tips.\n\n**Confidence:**\nconfident\n\n**Alternative PODs:**\nNone";

    #[test]
    fn test_extracts_each_section() {
        assert_eq!(extract_section(RESPONSE, "Primary POD").as_deref(), Some("Guidance"));
        assert_eq!(
            extract_section(RESPONSE, "Reasoning").as_deref(),
            Some("The flow broke on step 3.\nIt uses smart tips.")
        );
        assert_eq!(extract_section(RESPONSE, "Confidence").as_deref(), Some("confident"));
        assert_eq!(extract_section(RESPONSE, "Alternative PODs").as_deref(), Some("None"));
    }

    #[test]
    fn test_missing_section_is_none() {
        assert_eq!(extract_section(RESPONSE, "Alternative Reasoning"), None);
    }

    #[test]
    fn test_same_line_value() {
        let text = "**Confidence:** not confident\n**Confidence Reason:** thin thread";
        assert_eq!(
            extract_section(text, "Confidence").as_deref(),
            Some("not confident")
        );
        assert_eq!(
            extract_section(text, "Confidence Reason").as_deref(),
            Some("thin thread")
        );
    }

    #[test]
    fn test_label_prefix_does_not_swallow_longer_label() {
        let text = "**Confidence Reason:**\nbecause\n**Confidence:**\nconfident";
        assert_eq!(extract_section(text, "Confidence").as_deref(), Some("confident"));
    }

    #[test]
    fn test_colon_outside_bold() {
        let text = "**Summary**: Customer could not log in.";
        assert_eq!(
            extract_section(text, "Summary").as_deref(),
            Some("Customer could not log in.")
        );
    }

    #[test]
    fn test_case_insensitive_label() {
        let text = "**ROOT CAUSE:**\nExpired token";
        assert_eq!(extract_section(text, "Root Cause").as_deref(), Some("Expired token"));
    }

    #[test]
    fn test_empty_body() {
        let text = "**Reasoning:**\n\n**Confidence:**\nconfident";
        assert_eq!(extract_section(text, "Reasoning").as_deref(), Some(""));
    }

    #[test]
    fn test_label_with_regex_metacharacters_matches_literally() {
        let text = "**Alternative PODs (if any):**\nPlatform\n**Alternative PODs:**\nMobile";
        assert_eq!(
            extract_section(text, "Alternative PODs (if any)").as_deref(),
            Some("Platform")
        );
        assert_eq!(extract_section(text, "Alternative PODs").as_deref(), Some("Mobile"));
        assert_eq!(extract_section(text, "Alternative PODs (.*)"), None);
    }

    #[test]
    fn test_repeated_calls_share_one_pattern() {
        for _ in 0..1000 {
            assert_eq!(extract_section(RESPONSE, "Confidence").as_deref(), Some("confident"));
        }
        assert!(Lazy::get(&LABEL_RE).is_some());
    }

    #[test]
    fn test_is_none_marker() {
        assert!(is_none_marker("None"));
        assert!(is_none_marker(" N/A. "));
        assert!(is_none_marker(""));
        assert!(!is_none_marker("Guidance"));
    }
}
