//! Authoring aid: guess which logical answer key a PDF field name stands for.
//!
//! Only the introspection tool calls this. Runtime lookups stay exact.

use std::collections::BTreeSet;

use crate::documents::DocumentRegistry;

/// Minimum normalized Levenshtein similarity for a fuzzy suggestion.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

const MIN_SUBSTRING_LEN: usize = 3;

/// Lowercases and strips everything except ASCII letters and digits.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Every question id the registry knows, sorted and deduplicated.
pub fn known_keys(registry: &DocumentRegistry) -> Vec<String> {
    registry
        .question_sets()
        .flat_map(|set| set.questions.iter().map(|question| question.id.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Suggests a logical key for `field_name`, trying an exact normalized match,
/// then containment, then fuzzy similarity.
pub fn suggest_logical_key<S: AsRef<str>>(field_name: &str, candidates: &[S]) -> Option<String> {
    let field = normalize(field_name);
    if field.is_empty() {
        return None;
    }
    let normalized: Vec<(&str, String)> = candidates
        .iter()
        .map(|key| (key.as_ref(), normalize(key.as_ref())))
        .filter(|(_, norm)| !norm.is_empty())
        .collect();

    if let Some((key, _)) = normalized.iter().find(|(_, norm)| *norm == field) {
        return Some(key.to_string());
    }

    // A field label that spells out a whole key ("Buyer Name (print)") beats
    // a short label that a key happens to contain ("Year").
    let contained = normalized
        .iter()
        .filter(|(_, norm)| norm.len() >= MIN_SUBSTRING_LEN && field.contains(norm.as_str()))
        .max_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| b.0.cmp(a.0)));
    if let Some((key, _)) = contained {
        return Some(key.to_string());
    }
    if field.len() >= MIN_SUBSTRING_LEN {
        let containing = normalized
            .iter()
            .filter(|(_, norm)| norm.contains(field.as_str()))
            .min_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| a.0.cmp(b.0)));
        if let Some((key, _)) = containing {
            return Some(key.to_string());
        }
    }

    normalized
        .iter()
        .map(|(key, norm)| (*key, strsim::normalized_levenshtein(&field, norm)))
        .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(key, _)| key.to_string())
}
