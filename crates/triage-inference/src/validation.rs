//! Field-level validation against closed vocabularies.
//!
//! Validators never panic and never discard a whole result because of one bad
//! field. Each fallback they apply is logged at WARN and also returned in
//! [`Validated::warnings`] so callers and tests can inspect it.

use tracing::warn;

use triage_core::Vocabulary;

use crate::sections::is_none_marker;

/// A validated value plus every fallback that was applied to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Validated<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Collects validation warnings and mirrors them to the log.
#[derive(Debug, Default)]
pub struct Warnings {
    context: &'static str,
    items: Vec<String>,
}

impl Warnings {
    pub fn new(context: &'static str) -> Self {
        Self {
            context,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(component = self.context, "{}", message);
        self.items.push(message);
    }

    pub fn finish<T>(self, value: T) -> Validated<T> {
        Validated {
            value,
            warnings: self.items,
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Canonical value of an enumerated field, or the vocabulary's fallback.
pub fn validate_enum(
    raw: Option<&str>,
    vocab: &Vocabulary,
    field: &str,
    warnings: &mut Warnings,
) -> String {
    match raw {
        None => {
            warnings.push(format!(
                "Missing '{}', using '{}'",
                field,
                vocab.fallback_value()
            ));
            vocab.fallback_value().to_string()
        }
        Some(value) => match vocab.canonical(value) {
            Some(canonical) => canonical.to_string(),
            None => {
                warnings.push(format!(
                    "Invalid {} '{}', using '{}'",
                    field,
                    value.trim(),
                    vocab.fallback_value()
                ));
                vocab.fallback_value().to_string()
            }
        },
    }
}

/// Validate a comma-separated list, dropping entries outside the vocabulary.
///
/// A "none" marker means an empty list. Each dropped entry adds a warning,
/// but valid entries are kept.
pub fn validate_list<'a, I>(
    entries: I,
    vocab: &Vocabulary,
    field: &str,
    warnings: &mut Warnings,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.trim().trim_start_matches(['-', '*']).trim();
        if is_none_marker(entry) {
            continue;
        }
        match vocab.canonical(entry) {
            Some(canonical) => {
                if !out.iter().any(|v| v == canonical) {
                    out.push(canonical.to_string());
                }
            }
            None => warnings.push(format!("Dropping invalid {} entry '{}'", field, entry)),
        }
    }
    out
}

/// Split a free-text list on commas and newlines.
pub fn split_list(raw: &str) -> Vec<&str> {
    if is_none_marker(raw) {
        return Vec::new();
    }
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
