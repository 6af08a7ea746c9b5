//! Fuzzy duplicate removal.
//!
//! Two listings are considered the same opportunity when the first five
//! significant words of their titles and their countries agree. Distinct
//! scholarships that share a long common prefix do collapse; that trade-off is
//! accepted because the same listing reaches us from several portals with
//! slightly different titles.

use crate::model::{RawRecord, Record};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "scholarship",
    "scholarships",
    "program",
    "programme",
    "the",
    "and",
    "for",
];

const SIGNIFICANT_TOKENS: usize = 5;

/// Anything that can be reduced to a dedupe signature.
pub trait Signed {
    fn signature_title(&self) -> &str;
    fn signature_country(&self) -> &str;

    fn signature(&self) -> String {
        signature(self.signature_title(), self.signature_country())
    }
}

impl Signed for RawRecord {
    fn signature_title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    fn signature_country(&self) -> &str {
        self.country.as_deref().unwrap_or_default()
    }
}

impl Signed for Record {
    fn signature_title(&self) -> &str {
        &self.title
    }

    fn signature_country(&self) -> &str {
        &self.country
    }
}

/// SHA-256 (hex) of the significant title words followed by the country.
pub fn signature(title: &str, country: &str) -> String {
    let title = title.trim().to_lowercase();
    let key_words = title
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .take(SIGNIFICANT_TOKENS)
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(key_words.as_bytes());
    hasher.update(country.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Keep the first record seen for every signature, preserving order.
pub fn dedupe<T: Signed>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();

    let unique: Vec<T> = records
        .into_iter()
        .filter(|record| seen.insert(record.signature()))
        .collect();

    tracing::debug!(
        target: "scholarsift::pipeline",
        before,
        after = unique.len(),
        "dedupe complete"
    );
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daad_variants_collapse() {
        let records = vec![
            RawRecord::new("DAAD Scholarship Program 2024", "germany").with_url("a"),
            RawRecord::new("Daad   scholarship", "Germany").with_url("b"),
        ];
        let unique = dedupe(records);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].url.as_deref(), Some("a"));
    }

    #[test]
    fn test_country_separates_listings() {
        let records = vec![
            RawRecord::new("Research Grants", "Germany"),
            RawRecord::new("Research Grants", "Austria"),
        ];
        assert_eq!(dedupe(records).len(), 2);
    }

    #[test]
    fn test_only_first_five_significant_words_count() {
        // shared prefix beyond five words collapses; documented false positive
        let a = signature("Global Leaders Masters Fellowship Award Engineering", "Japan");
        let b = signature("Global Leaders Masters Fellowship Award Medicine", "Japan");
        assert_eq!(a, b);
        assert_ne!(a, signature("Global Leaders Masters Fellowship", "Japan"));
    }

    #[test]
    fn test_dedupe_is_idempotent_and_ordered() {
        let records = vec![
            RawRecord::new("Chevening", "UK").with_source("1"),
            RawRecord::new("Fulbright", "USA").with_source("2"),
            RawRecord::new("the Chevening scholarship", "uk").with_source("3"),
            RawRecord::new("Erasmus Mundus", "Belgium").with_source("4"),
        ];
        let once = dedupe(records);
        let order: Vec<_> = once.iter().filter_map(|r| r.source.as_deref()).collect();
        assert_eq!(order, vec!["1", "2", "4"]);
        assert_eq!(dedupe(once.clone()), once);
    }

    #[test]
    fn test_missing_fields_hash_as_empty() {
        let raw = RawRecord::default();
        assert_eq!(raw.signature(), signature("", ""));
        assert_eq!(raw.signature().len(), 64);
    }
}
