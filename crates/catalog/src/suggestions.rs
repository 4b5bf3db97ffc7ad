//! Suggestion set records.
//!
//! A single, process-wide record of suggestion strings grouped by field
//! name (flavors, fillings, ...). Its lifecycle is create-on-first-write,
//! replace-on-subsequent-writes, clear-on-delete.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed identifier of the singleton suggestion record.
pub const SUGGESTION_SET_ID: &str = "suggestions";

/// The singleton suggestion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSet {
    /// Always [`SUGGESTION_SET_ID`].
    pub id: String,
    /// Suggestion strings per field name, deduplicated case-insensitively
    /// with insertion order preserved.
    pub suggestions: BTreeMap<String, Vec<String>>,
    /// Creation time (preserved across replacements).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last replacement time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Deduplicates suggestion values case-insensitively.
///
/// The first occurrence wins and insertion order is preserved; values are
/// stored as given (original casing), only the comparison is folded.
#[must_use]
pub fn dedupe_case_insensitive(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.trim().to_lowercase()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_occurrence_and_order() {
        let values = vec![
            "Chocolate".to_string(),
            "Vanilla".to_string(),
            "chocolate".to_string(),
            "  VANILLA  ".to_string(),
            "Pistachio".to_string(),
        ];
        assert_eq!(dedupe_case_insensitive(values), vec!["Chocolate", "Vanilla", "Pistachio"]);
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_case_insensitive(Vec::new()).is_empty());
    }

    #[test]
    fn test_suggestion_set_wire_format() {
        let mut suggestions = BTreeMap::new();
        suggestions.insert("flavors".to_string(), vec!["Mocha".to_string()]);
        let set = SuggestionSet {
            id: SUGGESTION_SET_ID.into(),
            suggestions,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };

        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["suggestions"]["flavors"][0], "Mocha");
    }
}
