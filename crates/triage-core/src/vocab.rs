//! Closed vocabularies used to validate model output.
//!
//! Every enumerated field the model is asked to fill (category, confidence,
//! gap area, capability, ticket type) is checked against one of these lists.
//! The lists come from configuration, so categories can be added or renamed
//! without touching the validators.

use serde::{Deserialize, Serialize};

/// A closed set of valid string values, matched case-insensitively.
///
/// Lookups return the canonical spelling stored in the vocabulary, so
/// `"guidance"` validated against `["Guidance"]` comes back as `"Guidance"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub values: Vec<String>,
    /// Value substituted when validation fails. `None` means the field falls
    /// back to an empty string.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl Vocabulary {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Canonical spelling of `candidate`, or `None` if it is not in the set.
    pub fn canonical(&self, candidate: &str) -> Option<&str> {
        let needle = candidate.trim();
        if needle.is_empty() {
            return None;
        }
        self.values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(needle))
            .map(String::as_str)
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.canonical(candidate).is_some()
    }

    /// The fallback value, or the empty string.
    pub fn fallback_value(&self) -> &str {
        self.fallback.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reserved gap-area tag for values outside the taxonomy.
pub const GAP_AREA_OTHER: &str = "other";

/// Fail-closed confidence level.
pub const NOT_CONFIDENT: &str = "not confident";

/// All vocabularies consumed by the validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabularies {
    /// Product-area buckets (PODs) a ticket can be categorized into.
    pub categories: Vocabulary,
    /// Confidence levels. The fallback must be the most conservative level.
    pub confidence: Vocabulary,
    /// Gap-area taxonomy. Must contain the `other` sentinel.
    pub gap_areas: Vocabulary,
    /// Diagnostics capabilities that can be cited as matching a ticket.
    pub capabilities: Vocabulary,
    /// Ticket type classification.
    pub ticket_types: Vocabulary,
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self {
            categories: Vocabulary::new([
                "Guidance",
                "Analytics",
                "Content Management",
                "Integrations",
                "Mobile",
                "Platform",
                "Self Help",
                "WFE",
            ]),
            confidence: Vocabulary::new(["confident", NOT_CONFIDENT]).with_fallback(NOT_CONFIDENT),
            gap_areas: Vocabulary::new([
                "browser_support",
                "network_visibility",
                "backend_logic",
                "configuration_access",
                "performance",
                "data_sync",
                "authentication",
                GAP_AREA_OTHER,
            ])
            .with_fallback(GAP_AREA_OTHER),
            capabilities: Vocabulary::new([
                "element_detection",
                "visibility_rules",
                "display_rules",
                "css_selector_validation",
                "flow_step_diagnosis",
                "smart_tip_diagnosis",
                "beacon_diagnosis",
                "launcher_diagnosis",
            ]),
            ticket_types: Vocabulary::new([
                "troubleshooting",
                "feature_request",
                "technical_request",
                "unclear",
            ]),
        }
    }
}

impl Vocabularies {
    /// Check the invariants the validators rely on.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("categories", &self.categories),
            ("confidence", &self.confidence),
            ("gap_areas", &self.gap_areas),
            ("capabilities", &self.capabilities),
            ("ticket_types", &self.ticket_types),
        ];
        for (name, vocab) in named {
            if vocab.is_empty() {
                return Err(format!("vocabulary '{}' is empty", name));
            }
            if let Some(fallback) = &vocab.fallback {
                if !vocab.contains(fallback) {
                    return Err(format!(
                        "vocabulary '{}' fallback '{}' is not one of its values",
                        name, fallback
                    ));
                }
            }
        }
        if !self.gap_areas.contains(GAP_AREA_OTHER) {
            return Err(format!(
                "vocabulary 'gap_areas' must contain the '{}' sentinel",
                GAP_AREA_OTHER
            ));
        }
        if self.confidence.fallback.is_none() {
            return Err("vocabulary 'confidence' needs a fallback level".to_string());
        }
        Ok(())
    }
}
