//! Pure derivation rules.
//!
//! Nothing here performs I/O or holds state. Every function returns the same
//! output for the same input, so the results are safe to recompute when a
//! record is re-exported.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Assessment, EscalationInfo, FieldAnswer};
use crate::vocab::{Vocabulary, GAP_AREA_OTHER};

// =============================================================================
// OVERALL ASSESSMENT
// =============================================================================

/// Overall "could diagnostics help" result with its justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverallAssessment {
    pub assessment: Assessment,
    pub reasoning: &'static str,
}

/// Derive the overall assessment from the triage (identify) and fix axes.
///
/// | identify | fix         | overall |
/// |----------|-------------|---------|
/// | yes      | yes         | yes     |
/// | yes      | no or maybe | maybe   |
/// | maybe    | any         | maybe   |
/// | no       | any         | no      |
pub fn derive_overall_assessment(triage: Assessment, fix: Assessment) -> OverallAssessment {
    let (assessment, reasoning) = match (triage, fix) {
        (Assessment::Yes, Assessment::Yes) => (
            Assessment::Yes,
            "Diagnostics could identify the issue and point directly to the fix.",
        ),
        (Assessment::Yes, Assessment::No) => (
            Assessment::Maybe,
            "Diagnostics could identify the issue, but the fix needed work outside its scope.",
        ),
        (Assessment::Yes, Assessment::Maybe) => (
            Assessment::Maybe,
            "Diagnostics could identify the issue; whether it would guide the fix is unclear.",
        ),
        (Assessment::Maybe, _) => (
            Assessment::Maybe,
            "It is unclear whether diagnostics could identify the issue.",
        ),
        (Assessment::No, _) => (
            Assessment::No,
            "Diagnostics could not identify the issue, so it could not help resolve it.",
        ),
    };
    OverallAssessment {
        assessment,
        reasoning,
    }
}

// =============================================================================
// HELPDESK FIELD NORMALIZATION
// =============================================================================

/// Normalize a helpdesk dropdown or checkbox value to yes/no/unknown.
///
/// Dropdown tags look like `diagnostics_used_yes` or `cross_team_no`, so the
/// value is split into tokens and the first yes/no style token wins.
pub fn normalize_field_answer(raw: Option<&str>) -> FieldAnswer {
    let Some(raw) = raw else {
        return FieldAnswer::Unknown;
    };
    let lowered = raw.trim().to_ascii_lowercase();
    for token in lowered.split(|c: char| !c.is_ascii_alphanumeric()) {
        match token {
            "yes" | "true" | "y" => return FieldAnswer::Yes,
            "no" | "false" | "n" => return FieldAnswer::No,
            _ => {}
        }
    }
    FieldAnswer::Unknown
}

static ISSUE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][A-Z0-9]+-\d+)\b").expect("static regex"));

/// Extract an issue-tracker key such as `PROJ-123` from a URL or bare key.
pub fn extract_issue_key(value: &str) -> Option<String> {
    ISSUE_KEY
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Derive escalation state from the cross-team flag and the issue link.
///
/// A ticket counts as escalated when the cross-team flag says yes or an issue
/// link is present.
pub fn determine_escalation(cross_team: Option<&str>, jira_url: Option<&str>) -> EscalationInfo {
    let cross_team_status = normalize_field_answer(cross_team);
    let jira_url = jira_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let jira_ticket_id = jira_url.as_deref().and_then(extract_issue_key);
    let is_escalated = cross_team_status == FieldAnswer::Yes || jira_url.is_some();

    EscalationInfo {
        is_escalated,
        cross_team_status,
        jira_ticket_id,
        jira_ticket_url: jira_url,
    }
}

// =============================================================================
// GAP TAXONOMY
// =============================================================================

/// Validate a gap-area tag, remapping unknown tags to the `other` sentinel.
///
/// When a tag is remapped the original value is kept verbatim at the front of
/// the description so nothing the model said is lost. Returns the tag, the
/// description and whether a remap happened.
pub fn remap_gap_area(
    gap_area: &str,
    description: &str,
    taxonomy: &Vocabulary,
) -> (String, String, bool) {
    if let Some(canonical) = taxonomy.canonical(gap_area) {
        return (canonical.to_string(), description.to_string(), false);
    }
    let remapped_description = if description.trim().is_empty() {
        format!("[Auto-remapped from '{}']", gap_area)
    } else {
        format!("[Auto-remapped from '{}'] {}", gap_area, description)
    };
    let sentinel = taxonomy
        .canonical(GAP_AREA_OTHER)
        .unwrap_or(GAP_AREA_OTHER)
        .to_string();
    (sentinel, remapped_description, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocabularies;

    #[test]
    fn test_overall_assessment_table() {
        use Assessment::*;
        let expected = [
            (Yes, Yes, Yes),
            (Yes, No, Maybe),
            (Yes, Maybe, Maybe),
            (Maybe, Yes, Maybe),
            (Maybe, No, Maybe),
            (Maybe, Maybe, Maybe),
            (No, Yes, No),
            (No, No, No),
            (No, Maybe, No),
        ];
        for (triage, fix, overall) in expected {
            assert_eq!(
                derive_overall_assessment(triage, fix).assessment,
                overall,
                "triage={triage} fix={fix}"
            );
        }
    }

    #[test]
    fn test_overall_assessment_covers_all_combinations() {
        let mut seen = 0;
        for triage in Assessment::ALL {
            for fix in Assessment::ALL {
                let result = derive_overall_assessment(triage, fix);
                assert!(!result.reasoning.is_empty());
                seen += 1;
            }
        }
        assert_eq!(seen, 9);
    }

    #[test]
    fn test_overall_assessment_is_idempotent() {
        for triage in Assessment::ALL {
            for fix in Assessment::ALL {
                assert_eq!(
                    derive_overall_assessment(triage, fix),
                    derive_overall_assessment(triage, fix)
                );
            }
        }
    }

    #[test]
    fn test_normalize_field_answer() {
        assert_eq!(normalize_field_answer(Some("diagnostics_used_yes")), FieldAnswer::Yes);
        assert_eq!(normalize_field_answer(Some("Yes")), FieldAnswer::Yes);
        assert_eq!(normalize_field_answer(Some("cross_team_no")), FieldAnswer::No);
        assert_eq!(normalize_field_answer(Some("true")), FieldAnswer::Yes);
        assert_eq!(normalize_field_answer(Some("not_sure")), FieldAnswer::Unknown);
        assert_eq!(normalize_field_answer(Some("")), FieldAnswer::Unknown);
        assert_eq!(normalize_field_answer(None), FieldAnswer::Unknown);
    }

    #[test]
    fn test_extract_issue_key() {
        assert_eq!(
            extract_issue_key("https://acme.atlassian.net/browse/SUP-1234"),
            Some("SUP-1234".to_string())
        );
        assert_eq!(extract_issue_key("WF2-77"), Some("WF2-77".to_string()));
        assert_eq!(extract_issue_key("https://example.com/nothing"), None);
    }

    #[test]
    fn test_determine_escalation_from_jira_link() {
        let info = determine_escalation(None, Some("https://acme.atlassian.net/browse/ENG-9"));
        assert!(info.is_escalated);
        assert_eq!(info.cross_team_status, FieldAnswer::Unknown);
        assert_eq!(info.jira_ticket_id.as_deref(), Some("ENG-9"));
    }

    #[test]
    fn test_determine_escalation_from_cross_team_flag() {
        let info = determine_escalation(Some("cross_team_yes"), None);
        assert!(info.is_escalated);
        assert!(info.jira_ticket_id.is_none());
        assert!(info.jira_ticket_url.is_none());
    }

    #[test]
    fn test_determine_escalation_not_escalated() {
        let info = determine_escalation(Some("cross_team_no"), Some("   "));
        assert!(!info.is_escalated);
        assert_eq!(info.cross_team_status, FieldAnswer::No);
        assert!(info.jira_ticket_url.is_none());
    }

    #[test]
    fn test_remap_gap_area_keeps_valid_tag() {
        let vocabs = Vocabularies::default();
        let (area, desc, remapped) = remap_gap_area("Performance", "slow page", &vocabs.gap_areas);
        assert_eq!(area, "performance");
        assert_eq!(desc, "slow page");
        assert!(!remapped);
    }

    #[test]
    fn test_remap_gap_area_preserves_invalid_value() {
        let vocabs = Vocabularies::default();
        let (area, desc, remapped) =
            remap_gap_area("quantum_flux", "backend returned 500", &vocabs.gap_areas);
        assert_eq!(area, GAP_AREA_OTHER);
        assert_eq!(desc, "[Auto-remapped from 'quantum_flux'] backend returned 500");
        assert!(remapped);
    }

    #[test]
    fn test_remap_gap_area_with_empty_description() {
        let vocabs = Vocabularies::default();
        let (_, desc, _) = remap_gap_area("mystery", "", &vocabs.gap_areas);
        assert_eq!(desc, "[Auto-remapped from 'mystery']");
    }
}
