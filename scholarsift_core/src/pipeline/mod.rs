//! Post-collection stages: validity filter, dedupe, normalization, matching.

pub mod dedupe;
pub mod matcher;
pub mod normalize;

pub use dedupe::{dedupe, signature, Signed};
pub use matcher::{
    filter, match_and_rank, profile_affinity, ArrivalOrder, ProfileAffinity, Ranker, ScoreRanker,
};
pub use normalize::{clean_text, normalize_url, standardize, standardize_country};

use crate::model::{RawRecord, Record};

/// Drop raw records lacking a title or a country.
pub fn retain_valid(raw: Vec<RawRecord>) -> Vec<RawRecord> {
    let before = raw.len();
    let valid: Vec<RawRecord> = raw.into_iter().filter(RawRecord::is_valid).collect();
    if valid.len() < before {
        tracing::debug!(
            target: "scholarsift::pipeline",
            dropped = before - valid.len(),
            "dropped raw records without title or country"
        );
    }
    valid
}

/// Dedupe valid raw records and standardize what remains.
pub fn consolidate(raw: Vec<RawRecord>) -> Vec<Record> {
    dedupe(retain_valid(raw))
        .into_iter()
        .map(|raw| standardize(Record::from(raw)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NOT_SPECIFIED;

    #[test]
    fn test_records_without_country_never_survive() {
        let raw = vec![
            RawRecord::new("Chevening", "uk"),
            RawRecord {
                title: Some("No country".into()),
                ..RawRecord::default()
            },
            RawRecord::new("Blank country", " "),
        ];
        let records = consolidate(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country, "United Kingdom");
        assert_eq!(records[0].deadline, NOT_SPECIFIED);
    }
}
