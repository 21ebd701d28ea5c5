use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::sanitize::sanitize;
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub category: String,
    pub confidence: f64,
}

/// An optional outside source of ranked category suggestions.
pub trait Advisor {
    /// Suggestions for `transaction`, best first. May be empty.
    fn suggest(&self, transaction: &Transaction) -> Vec<Suggestion>;
}

#[derive(Debug, Deserialize)]
struct SuggestionEntry {
    description: String,
    suggestions: Vec<Suggestion>,
}

/// Suggestions read from a JSON file of the form
/// `[{"description": "...", "suggestions": [{"category": "...", "confidence": 0.9}]}]`,
/// matched by sanitized description.
#[derive(Debug, Default)]
pub struct SuggestionsFile {
    by_description: HashMap<String, Vec<Suggestion>>,
}

impl SuggestionsFile {
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading suggestions...");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suggestions file {}", path.display()))?;
        let result = Self::parse(&content)
            .with_context(|| format!("Failed to parse suggestions file {}", path.display()))?;
        log::info!("Loading suggestions...done");
        Ok(result)
    }

    fn parse(content: &str) -> Result<Self> {
        let entries: Vec<SuggestionEntry> = serde_json::from_str(content)?;
        let mut by_description: HashMap<String, Vec<Suggestion>> = HashMap::new();
        for entry in entries {
            let suggestions = entry
                .suggestions
                .into_iter()
                .filter(|s| {
                    let valid = !s.category.is_empty() && s.confidence.is_finite();
                    if !valid {
                        log::warn!("Ignoring invalid suggestion {s:?} for '{}'", entry.description);
                    }
                    valid
                });
            by_description
                .entry(sanitize(&entry.description))
                .or_default()
                .extend(suggestions);
        }
        for suggestions in by_description.values_mut() {
            suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        }
        Ok(Self { by_description })
    }
}

impl Advisor for SuggestionsFile {
    fn suggest(&self, transaction: &Transaction) -> Vec<Suggestion> {
        self.by_description
            .get(&sanitize(&transaction.description))
            .cloned()
            .unwrap_or_default()
    }
}

/// Suggested categories first, then classifier hits, without repeating a label.
pub fn merge_shortlist(suggestions: &[Suggestion], hits: &[&str]) -> Vec<String> {
    let mut result: Vec<String> = vec![];
    let labels = suggestions
        .iter()
        .map(|s| s.category.as_str())
        .chain(hits.iter().copied());
    for label in labels {
        if !result.iter().any(|existing| existing == label) {
            result.push(label.to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::testutils::{date, transaction};

    fn suggestion(category: &str, confidence: f64) -> Suggestion {
        Suggestion {
            category: category.to_string(),
            confidence,
        }
    }

    #[test]
    fn merge_keeps_order_and_dedups() {
        let suggestions = [
            suggestion("Expenses:Food", 0.9),
            suggestion("Expenses:Wants", 0.4),
        ];
        assert_eq!(
            vec!["Expenses:Food", "Expenses:Wants", "Expenses:Travel"],
            merge_shortlist(&suggestions, &["Expenses:Travel", "Expenses:Food"])
        );
        assert_eq!(vec!["Expenses:Home"], merge_shortlist(&[], &["Expenses:Home"]));
    }

    #[test]
    fn file_matches_by_sanitized_description() {
        let file = SuggestionsFile::parse(
            r#"[
                {"description": "STARBUCKS #12", "suggestions": [
                    {"category": "Expenses:Wants", "confidence": 0.2},
                    {"category": "Expenses:Food", "confidence": 0.95},
                    {"category": "", "confidence": 0.5}
                ]}
            ]"#,
        )
        .unwrap();
        let t = transaction("1", date(2024, 1, 1), "STARBUCKS 12", -100);
        assert_eq!(
            vec![
                suggestion("Expenses:Food", 0.95),
                suggestion("Expenses:Wants", 0.2)
            ],
            file.suggest(&t)
        );
        let other = transaction("2", date(2024, 1, 1), "PEETS", -100);
        assert!(file.suggest(&other).is_empty());
    }

    #[test]
    fn invalid_json() {
        assert!(SuggestionsFile::parse("{").is_err());
    }

    #[test]
    fn load_from_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("suggestions.json");
        std::fs::write(
            &path,
            r#"[{"description": "RENT", "suggestions": [{"category": "Expenses:Home", "confidence": 1.0}]}]"#,
        )
        .unwrap();
        let file = SuggestionsFile::load(&path).unwrap();
        let t = transaction("1", date(2024, 1, 1), "RENT", -100000);
        assert_eq!(vec![suggestion("Expenses:Home", 1.0)], file.suggest(&t));
        assert!(SuggestionsFile::load(&tempdir.path().join("missing.json")).is_err());
    }
}
