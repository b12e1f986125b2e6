//! Diagnostics applicability analysis: prompt and JSON response validation.
//!
//! Unlike the labeled-section parsers, this one can fail. The response must be
//! a JSON object with three sub-objects:
//!
//! ```json
//! {
//!   "was_diagnostics_used": { "llm_assessment": "yes|no|unknown", "confidence": "...", "reasoning": "..." },
//!   "could_diagnostics_help": {
//!     "triage_assessment": "yes|no|maybe", "triage_reasoning": "...",
//!     "fix_assessment": "yes|no|maybe", "fix_reasoning": "...",
//!     "confidence": "...", "diagnostics_capability_matched": ["..."],
//!     "limitation_notes": "...", "gaps": [{ "gap_area": "...", "gap_description": "..." }]
//!   },
//!   "metadata": { "ticket_type": "..." }
//! }
//! ```
//!
//! Soft problems (unknown confidence, unknown capability, unknown gap area) are
//! repaired and reported as warnings. Hard problems (missing sub-object,
//! invalid assessment, empty reasoning, unknown ticket type) fail the whole
//! analysis with [`Error::Parse`].

use serde_json::{Map, Value};

use triage_core::{
    derive_overall_assessment, remap_gap_area, AnalysisMetadata, Assessment, DiagnosticsAnalysis,
    DiagnosticsGap, DiagnosticsHelp, DiagnosticsUsage, Error, FieldAnswer, Result, TicketRecord,
    Vocabularies,
};

use crate::embedded_json::parse_json_object;
use crate::validation::{split_list, validate_enum, validate_list, Validated, Warnings};

/// Generates the diagnostics prompt for a synthesized ticket.
pub fn diagnostics_prompt(record: &TicketRecord, vocabs: &Vocabularies) -> String {
    let synthesis = record.synthesis.clone().unwrap_or_default();
    format!(
        r#"Assess whether the Diagnostics tool was used on this support ticket and whether
it could have helped identify (triage) and resolve (fix) the issue.

Subject: {subject}
Issue Reported: {issue}
Root Cause: {root_cause}
Summary: {summary}
Resolution: {resolution}
Helpdesk "Diagnostics used" field: {custom_field}

Diagnostics capabilities: {capabilities}
Gap areas: {gap_areas}
Ticket types: {ticket_types}
Confidence levels: {confidence}

Respond with a single JSON object in a ```json fenced block:

{{
  "was_diagnostics_used": {{
    "llm_assessment": "yes | no | unknown",
    "confidence": "<confidence level>",
    "reasoning": "<evidence from the thread>"
  }},
  "could_diagnostics_help": {{
    "triage_assessment": "yes | no | maybe",
    "triage_reasoning": "<could Diagnostics have identified the issue>",
    "fix_assessment": "yes | no | maybe",
    "fix_reasoning": "<could Diagnostics have guided the fix>",
    "confidence": "<confidence level>",
    "diagnostics_capability_matched": ["<capability>"],
    "limitation_notes": "<what Diagnostics cannot see here>",
    "gaps": [{{ "gap_area": "<gap area>", "gap_description": "<detail>" }}]
  }},
  "metadata": {{
    "ticket_type": "<ticket type>"
  }}
}}
"#,
        subject = record.subject,
        issue = synthesis.issue_reported,
        root_cause = synthesis.root_cause,
        summary = synthesis.summary,
        resolution = synthesis.resolution,
        custom_field = record.custom_fields.was_diagnostics_used,
        capabilities = vocabs.capabilities.values.join(", "),
        gap_areas = vocabs.gap_areas.values.join(", "),
        ticket_types = vocabs.ticket_types.values.join(", "),
        confidence = vocabs.confidence.values.join(", "),
    )
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn non_empty(obj: &Map<String, Value>, key: &str) -> Option<String> {
    str_field(obj, key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    match root.get(key) {
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            errors.push(format!("'{}' is not an object", key));
            None
        }
        None => {
            errors.push(format!("Missing '{}'", key));
            None
        }
    }
}

fn assessment(raw: Option<&str>, field: &str, errors: &mut Vec<String>) -> Assessment {
    match raw.and_then(Assessment::parse) {
        Some(a) => a,
        None => {
            errors.push(format!(
                "Invalid {} '{}', expected yes, no or maybe",
                field,
                raw.unwrap_or("")
            ));
            Assessment::No
        }
    }
}

fn required_text(
    obj: &Map<String, Value>,
    keys: &[&str],
    field: &str,
    errors: &mut Vec<String>,
) -> String {
    match keys.iter().find_map(|k| non_empty(obj, k)) {
        Some(text) => text,
        None => {
            errors.push(format!("Empty {}", field));
            String::new()
        }
    }
}

fn parse_gaps(
    help: &Map<String, Value>,
    vocabs: &Vocabularies,
    warnings: &mut Warnings,
) -> Vec<DiagnosticsGap> {
    let mut raw: Vec<(String, String)> = Vec::new();
    if let Some(Value::Array(items)) = help.get("gaps") {
        for item in items.iter().filter_map(Value::as_object) {
            raw.push((
                str_field(item, "gap_area").unwrap_or("").trim().to_string(),
                str_field(item, "gap_description").unwrap_or("").trim().to_string(),
            ));
        }
    } else if help.contains_key("gap_area") || help.contains_key("gap_description") {
        raw.push((
            str_field(help, "gap_area").unwrap_or("").trim().to_string(),
            str_field(help, "gap_description").unwrap_or("").trim().to_string(),
        ));
    }

    raw.into_iter()
        .filter(|(area, description)| !(area.is_empty() && description.is_empty()))
        .map(|(area, description)| {
            if area.is_empty() {
                warnings.push("Gap without gap_area, tagging as other");
                return DiagnosticsGap {
                    gap_area: vocabs.gap_areas.fallback_value().to_string(),
                    gap_description: description,
                };
            }
            let (gap_area, gap_description, remapped) =
                remap_gap_area(&area, &description, &vocabs.gap_areas);
            if remapped {
                warnings.push(format!("Remapped invalid gap_area '{}' to '{}'", area, gap_area));
            }
            DiagnosticsGap {
                gap_area,
                gap_description,
            }
        })
        .collect()
}

fn capabilities(
    help: &Map<String, Value>,
    vocabs: &Vocabularies,
    warnings: &mut Warnings,
) -> Vec<String> {
    let field = "diagnostics capability";
    match help.get("diagnostics_capability_matched") {
        Some(Value::Array(items)) => validate_list(
            items.iter().filter_map(Value::as_str),
            &vocabs.capabilities,
            field,
            warnings,
        ),
        Some(Value::String(raw)) => {
            validate_list(split_list(raw), &vocabs.capabilities, field, warnings)
        }
        _ => Vec::new(),
    }
}

/// Parse and validate a diagnostics response.
///
/// `custom_field_value` is left at its default and `analysis_timestamp` at
/// `None`; both are stamped by the caller, which owns the helpdesk record and
/// the clock.
pub fn parse_diagnostics_response(
    response: &str,
    vocabs: &Vocabularies,
) -> Result<Validated<DiagnosticsAnalysis>> {
    let root = parse_json_object(response)?;
    let mut errors: Vec<String> = Vec::new();
    let mut warnings = Warnings::new("diagnostics_parser");

    let used = object(&root, "was_diagnostics_used", &mut errors);
    let help = object(&root, "could_diagnostics_help", &mut errors);
    let metadata = object(&root, "metadata", &mut errors);
    let (Some(used), Some(help), Some(metadata)) = (used, help, metadata) else {
        return Err(invalid(errors));
    };

    let llm_raw = str_field(used, "llm_assessment");
    let llm_assessment = match llm_raw.and_then(FieldAnswer::parse) {
        Some(answer) => answer,
        None => {
            errors.push(format!(
                "Invalid llm_assessment '{}', expected yes, no or unknown",
                llm_raw.unwrap_or("")
            ));
            FieldAnswer::Unknown
        }
    };
    let used_confidence = validate_enum(
        str_field(used, "confidence"),
        &vocabs.confidence,
        "was_diagnostics_used confidence",
        &mut warnings,
    );
    let used_reasoning = required_text(
        used,
        &["reasoning"],
        "was_diagnostics_used reasoning",
        &mut errors,
    );

    let triage_raw = str_field(help, "triage_assessment").or_else(|| str_field(help, "assessment"));
    let triage_assessment = assessment(triage_raw, "triage_assessment", &mut errors);
    let triage_reasoning = required_text(
        help,
        &["triage_reasoning", "reasoning"],
        "triage_reasoning",
        &mut errors,
    );
    let fix_assessment = assessment(
        str_field(help, "fix_assessment"),
        "fix_assessment",
        &mut errors,
    );
    let fix_reasoning = required_text(help, &["fix_reasoning"], "fix_reasoning", &mut errors);

    let ticket_type_raw = str_field(metadata, "ticket_type").unwrap_or("");
    let ticket_type = match vocabs.ticket_types.canonical(ticket_type_raw) {
        Some(t) => t.to_string(),
        None => {
            errors.push(format!(
                "Invalid ticket_type '{}', expected one of: {}",
                ticket_type_raw,
                vocabs.ticket_types.values.join(", ")
            ));
            String::new()
        }
    };

    if !errors.is_empty() {
        return Err(invalid(errors));
    }

    let overall = derive_overall_assessment(triage_assessment, fix_assessment);
    if let Some(claimed) = str_field(help, "overall_assessment").and_then(Assessment::parse) {
        if claimed != overall.assessment {
            warnings.push(format!(
                "Model overall_assessment '{}' replaced by derived '{}'",
                claimed, overall.assessment
            ));
        }
    }

    let help_confidence = validate_enum(
        str_field(help, "confidence"),
        &vocabs.confidence,
        "could_diagnostics_help confidence",
        &mut warnings,
    );
    let diagnostics_capability_matched = capabilities(help, vocabs, &mut warnings);
    let gaps = parse_gaps(help, vocabs, &mut warnings);

    let analysis = DiagnosticsAnalysis {
        was_diagnostics_used: DiagnosticsUsage {
            custom_field_value: FieldAnswer::default(),
            llm_assessment,
            confidence: used_confidence,
            reasoning: used_reasoning,
        },
        could_diagnostics_help: DiagnosticsHelp {
            triage_assessment,
            triage_reasoning,
            fix_assessment,
            fix_reasoning,
            overall_assessment: overall.assessment,
            overall_reasoning: overall.reasoning.to_string(),
            confidence: help_confidence,
            diagnostics_capability_matched,
            limitation_notes: non_empty(help, "limitation_notes").unwrap_or_default(),
            gaps,
        },
        metadata: AnalysisMetadata {
            ticket_type,
            analysis_timestamp: None,
        },
    };
    Ok(warnings.finish(analysis))
}

fn invalid(errors: Vec<String>) -> Error {
    Error::Parse(format!("Invalid diagnostics analysis: {}", errors.join("; ")))
}
