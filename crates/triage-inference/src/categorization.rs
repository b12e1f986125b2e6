//! POD categorization: prompt and labeled-section response parsing.

use triage_core::{Categorization, Synthesis, Vocabularies};

use crate::sections::{extract_section, is_none_marker};
use crate::validation::{split_list, validate_enum, validate_list, Validated, Warnings};

/// Generates the categorization prompt from a ticket's synthesis.
pub fn categorization_prompt(subject: &str, synthesis: &Synthesis, vocabs: &Vocabularies) -> String {
    format!(
        r#"Assign this support ticket to the product team (POD) that owns the problem.

Valid PODs: {pods}

Subject: {subject}
Issue Reported: {issue}
Root Cause: {root_cause}
Summary: {summary}
Resolution: {resolution}

Respond using exactly these sections:

**Primary POD:**
<one POD from the list above>

**Reasoning:**
<why this POD owns the issue>

**Confidence:**
<one of: {confidence}>

**Confidence Reason:**
<what made the decision easy or hard>

**Alternative PODs:**
<comma-separated PODs from the list, or None>

**Alternative Reasoning:**
<why the alternatives were considered, or N/A>
"#,
        pods = vocabs.categories.values.join(", "),
        subject = subject,
        issue = synthesis.issue_reported,
        root_cause = synthesis.root_cause,
        summary = synthesis.summary,
        resolution = synthesis.resolution,
        confidence = vocabs.confidence.values.join(", "),
    )
}

/// Parse a categorization response.
///
/// Never fails. An out-of-vocabulary primary POD becomes `""`, an unknown
/// confidence becomes the confidence fallback, and invalid alternatives are
/// dropped. Each substitution is reported in the returned warnings.
pub fn parse_categorization_response(
    response: &str,
    vocabs: &Vocabularies,
) -> Validated<Categorization> {
    let mut warnings = Warnings::new("categorization_parser");

    let primary_raw = extract_section(response, "Primary POD");
    let primary_pod = validate_enum(
        primary_raw.as_deref(),
        &vocabs.categories,
        "primary POD",
        &mut warnings,
    );

    let mut text_field = |label: &str| {
        extract_section(response, label).unwrap_or_else(|| {
            warnings.push(format!("Missing section '{}'", label));
            String::new()
        })
    };
    let reasoning = text_field("Reasoning");
    let confidence_reason = text_field("Confidence Reason");

    let confidence = validate_enum(
        extract_section(response, "Confidence").as_deref(),
        &vocabs.confidence,
        "confidence",
        &mut warnings,
    );

    let alternative_pods = match extract_section(response, "Alternative PODs") {
        Some(raw) => {
            let mut pods = validate_list(
                split_list(&raw),
                &vocabs.categories,
                "alternative POD",
                &mut warnings,
            );
            pods.retain(|p| *p != primary_pod);
            pods
        }
        None => Vec::new(),
    };

    let alternative_reasoning =
        extract_section(response, "Alternative Reasoning").filter(|r| !is_none_marker(r));

    warnings.finish(Categorization {
        primary_pod,
        reasoning,
        confidence,
        confidence_reason,
        alternative_pods,
        alternative_reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "**Primary POD:**\nGuidance\n\n**Reasoning:**\nSmart tip did not render.\n\n\
                        **Confidence:**\nconfident\n\n**Confidence Reason:**\nClear thread.\n\n\
                        **Alternative PODs:**\nPlatform\n\n**Alternative Reasoning:**\nCould be a platform regression.";

    #[test]
    fn test_parse_full_response() {
        let parsed = parse_categorization_response(FULL, &Vocabularies::default());
        assert!(parsed.is_clean(), "{:?}", parsed.warnings);
        let c = parsed.value;
        assert_eq!(c.primary_pod, "Guidance");
        assert_eq!(c.reasoning, "Smart tip did not render.");
        assert_eq!(c.confidence, "confident");
        assert_eq!(c.confidence_reason, "Clear thread.");
        assert_eq!(c.alternative_pods, vec!["Platform".to_string()]);
        assert_eq!(
            c.alternative_reasoning.as_deref(),
            Some("Could be a platform regression.")
        );
    }

    #[test]
    fn test_missing_reasoning_is_empty_with_warning() {
        let response = "**Primary POD:**\nMobile\n**Confidence:**\nconfident\n**Confidence Reason:**\nok";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert_eq!(parsed.value.reasoning, "");
        assert_eq!(parsed.value.primary_pod, "Mobile");
        assert!(parsed.warnings.iter().any(|w| w.contains("Reasoning")));
    }

    #[test]
    fn test_alternative_pods_none_is_empty() {
        let response = "**Primary POD:**\nWFE\n**Alternative PODs:**\nNone";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert!(parsed.value.alternative_pods.is_empty());
    }

    #[test]
    fn test_invalid_alternative_dropped() {
        let response = "**Primary POD:**\nMobile\n**Alternative PODs:**\nGuidance, NotARealPod";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert_eq!(parsed.value.alternative_pods, vec!["Guidance".to_string()]);
        assert!(parsed.warnings.iter().any(|w| w.contains("NotARealPod")));
    }

    #[test]
    fn test_invalid_primary_pod_falls_back_to_empty() {
        let response = "**Primary POD:**\nBilling\n**Confidence:**\nconfident";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert_eq!(parsed.value.primary_pod, "");
        assert!(parsed.warnings.iter().any(|w| w.contains("Billing")));
    }

    #[test]
    fn test_invalid_confidence_fails_closed() {
        let response = "**Primary POD:**\nGuidance\n**Confidence:**\nabsolutely certain";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert_eq!(parsed.value.confidence, "not confident");
    }

    #[test]
    fn test_na_alternative_reasoning_is_none() {
        let response = "**Primary POD:**\nGuidance\n**Alternative Reasoning:**\nN/A";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert_eq!(parsed.value.alternative_reasoning, None);
    }

    #[test]
    fn test_primary_not_repeated_in_alternatives() {
        let response = "**Primary POD:**\nGuidance\n**Alternative PODs:**\nguidance, Mobile";
        let parsed = parse_categorization_response(response, &Vocabularies::default());
        assert_eq!(parsed.value.alternative_pods, vec!["Mobile".to_string()]);
    }

    #[test]
    fn test_custom_vocabulary() {
        let mut vocabs = Vocabularies::default();
        vocabs.categories = triage_core::Vocabulary::new(["Billing"]);
        let response = "**Primary POD:**\nbilling";
        let parsed = parse_categorization_response(response, &vocabs);
        assert_eq!(parsed.value.primary_pod, "Billing");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let vocabs = Vocabularies::default();
        assert_eq!(
            parse_categorization_response(FULL, &vocabs),
            parse_categorization_response(FULL, &vocabs)
        );
    }

    #[test]
    fn test_prompt_lists_vocabulary() {
        let synthesis = Synthesis {
            summary: "Flow broke".to_string(),
            ..Default::default()
        };
        let prompt = categorization_prompt("Subject line", &synthesis, &Vocabularies::default());
        assert!(prompt.contains("Content Management"));
        assert!(prompt.contains("Summary: Flow broke"));
        assert!(prompt.contains("**Alternative PODs:**"));
    }
}
