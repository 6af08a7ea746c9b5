//! Profile filtering and pluggable ranking.

use crate::model::{DegreeLevel, Profile, Record, RECORD_ALL_FIELDS};

/// Keep the records compatible with the profile, in their current order.
pub fn filter(records: Vec<Record>, profile: &Profile) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| matches_profile(record, profile))
        .collect()
}

/// Filter, then rank.
pub fn match_and_rank(records: Vec<Record>, profile: &Profile, ranker: &dyn Ranker) -> Vec<Record> {
    ranker.rank(filter(records, profile), profile)
}

pub fn matches_profile(record: &Record, profile: &Profile) -> bool {
    degree_matches(record, profile) && country_matches(record, profile) && field_matches(record, profile)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn degree_matches(record: &Record, profile: &Profile) -> bool {
    match profile.degree_level() {
        Some(wanted) if !record.degree_level.is_open() => {
            contains_ci(record.degree_level.label(), wanted)
        }
        _ => true,
    }
}

fn country_matches(record: &Record, profile: &Profile) -> bool {
    match profile.preferred_country() {
        Some(wanted) if !record.country.trim().is_empty() => contains_ci(&record.country, wanted),
        _ => true,
    }
}

fn field_matches(record: &Record, profile: &Profile) -> bool {
    let Some(wanted) = profile.preferred_field() else {
        return true;
    };
    // only the explicit "All fields" listing is exempt; "Not specified" must match like any text
    if record.field_of_study.trim().eq_ignore_ascii_case(RECORD_ALL_FIELDS) {
        return true;
    }
    match wanted.split_whitespace().next() {
        Some(first_word) => contains_ci(&record.field_of_study, first_word),
        None => true,
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Orders an already filtered list of records for a profile.
pub trait Ranker: Send + Sync {
    fn name(&self) -> &str;
    fn rank(&self, records: Vec<Record>, profile: &Profile) -> Vec<Record>;
}

/// Leaves records in arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalOrder;

impl Ranker for ArrivalOrder {
    fn name(&self) -> &str {
        "arrival"
    }

    fn rank(&self, records: Vec<Record>, _profile: &Profile) -> Vec<Record> {
        records
    }
}

/// Stable descending sort by an arbitrary score function.
pub struct ScoreRanker<F> {
    name: String,
    score: F,
}

impl<F> ScoreRanker<F>
where
    F: Fn(&Record, &Profile) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, score: F) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl<F> Ranker for ScoreRanker<F>
where
    F: Fn(&Record, &Profile) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn rank(&self, records: Vec<Record>, profile: &Profile) -> Vec<Record> {
        let mut scored: Vec<(f64, Record)> = records
            .into_iter()
            .map(|record| ((self.score)(&record, profile), record))
            .collect();
        // sort_by is stable, so equal scores keep arrival order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, record)| record).collect()
    }
}

const MERIT_TERMS: &[&str] = &["merit", "gpa", "academic excellence", "outstanding academic"];

/// Heuristic affinity between a record and the profile that asked for it.
///
/// Rewards an exact degree match, a country match, a field match and full
/// funding. Nationality mentioned in the eligibility text and a strong
/// academic score on merit-based awards add smaller bonuses.
pub fn profile_affinity(record: &Record, profile: &Profile) -> f64 {
    let mut score = 0.0;

    if let Some(wanted) = profile.degree_level() {
        let wanted = DegreeLevel::classify(wanted);
        if record.degree_level == wanted {
            score += 3.0;
        } else if record.degree_level.is_open() {
            score += 1.0;
        }
    }

    if let Some(country) = profile.preferred_country() {
        if contains_ci(&record.country, country) {
            score += 2.0;
        }
    }

    if let Some(first_word) = profile
        .preferred_field()
        .and_then(|field| field.split_whitespace().next())
    {
        if contains_ci(&record.field_of_study, first_word) {
            score += 2.0;
        } else if record.field_of_study.eq_ignore_ascii_case(RECORD_ALL_FIELDS) {
            score += 0.5;
        }
    }

    let funding = record.funding.to_lowercase();
    if funding.contains("fully funded") || funding.contains("full funding") {
        score += 1.5;
    } else if funding.contains("partial") {
        score += 0.5;
    }

    if let Some(nationality) = profile.nationality() {
        if contains_ci(&record.eligibility, nationality) {
            score += 1.0;
        }
    }

    if let Some(academic) = profile.academic_score {
        let eligibility = record.eligibility.to_lowercase();
        if MERIT_TERMS.iter().any(|term| eligibility.contains(term)) {
            // GPA-style scores up to 4.0, percentages above that
            let normalized = if academic <= 4.0 {
                academic / 4.0
            } else {
                academic / 100.0
            };
            score += normalized.clamp(0.0, 1.0);
        }
    }

    score
}

/// [`profile_affinity`] packaged as a ranker.
pub struct ProfileAffinity;

impl ProfileAffinity {
    pub fn ranker() -> ScoreRanker<fn(&Record, &Profile) -> f64> {
        ScoreRanker::new("affinity", profile_affinity as fn(&Record, &Profile) -> f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawRecord;
    use crate::pipeline::normalize::standardize;

    fn record(title: &str, country: &str, degree: &str, field: &str) -> Record {
        standardize(Record::from(
            RawRecord::new(title, country)
                .with_degree(degree)
                .with_field_of_study(field),
        ))
    }

    #[test]
    fn test_country_filter_uses_substring() {
        let records = vec![
            record("A", "Federal Republic of Germany", "", ""),
            record("B", "France", "", ""),
        ];
        let profile = Profile::new().with_country("germany");
        let kept = filter(records, &profile);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "A");
    }

    #[test]
    fn test_any_country_keeps_everything() {
        let records = vec![record("A", "Japan", "", ""), record("B", "France", "", "")];
        let profile = Profile::new().with_country("Any Country");
        assert_eq!(filter(records, &profile).len(), 2);
    }

    #[test]
    fn test_degree_filter_respects_open_records() {
        let records = vec![
            record("A", "Japan", "Master", ""),
            record("B", "Japan", "PhD programme", ""),
            record("C", "Japan", "All levels", ""),
            record("D", "Japan", "", ""),
        ];
        let profile = Profile::new().with_degree_level("master");
        let titles: Vec<_> = filter(records, &profile)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_field_filter_uses_first_word() {
        let records = vec![
            record("A", "Japan", "", "Computer Engineering"),
            record("B", "Japan", "", "Medicine"),
            record("C", "Japan", "", "All fields"),
            record("D", "Japan", "", ""),
        ];
        let profile = Profile::new().with_field_of_study("Computer Science");
        let titles: Vec<_> = filter(records, &profile)
            .into_iter()
            .map(|r| r.title)
            .collect();
        // D normalizes to "Not specified", which is not a wildcard
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn test_unlisted_country_is_dropped_by_country_filter() {
        let records = vec![
            record("A", "Germany", "", ""),
            record("B", "&nbsp;", "", ""),
        ];
        assert_eq!(records[1].country, crate::model::NOT_SPECIFIED);

        let kept = filter(records.clone(), &Profile::new().with_country("Germany"));
        let titles: Vec<_> = kept.into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["A"]);

        // without a country preference nothing is dropped
        assert_eq!(filter(records, &Profile::new()).len(), 2);
    }

    #[test]
    fn test_empty_record_country_passes_country_filter() {
        let mut blank = record("A", "Japan", "", "");
        blank.country = String::new();
        let kept = filter(vec![blank], &Profile::new().with_country("Germany"));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_arrival_order_is_identity() {
        let records = vec![record("A", "Japan", "", ""), record("B", "Japan", "", "")];
        let ranked = ArrivalOrder.rank(records.clone(), &Profile::new());
        assert_eq!(ranked, records);
    }

    #[test]
    fn test_score_ranker_is_stable_descending() {
        let records = vec![
            record("low", "Japan", "", ""),
            record("high-1", "Japan", "", ""),
            record("mid", "Japan", "", ""),
            record("high-2", "Japan", "", ""),
        ];
        let ranker = ScoreRanker::new("by-title", |r: &Record, _: &Profile| {
            if r.title.starts_with("high") {
                2.0
            } else if r.title == "mid" {
                1.0
            } else {
                0.0
            }
        });
        let titles: Vec<_> = ranker
            .rank(records, &Profile::new())
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["high-1", "high-2", "mid", "low"]);
    }

    #[test]
    fn test_profile_affinity_prefers_exact_matches() {
        let profile = Profile::new()
            .with_degree_level("Master's")
            .with_country("Germany")
            .with_field_of_study("Engineering")
            .with_nationality("Pakistani");

        let mut strong = record("Strong", "Germany", "Master", "Engineering");
        strong.funding = "Fully funded".into();
        strong.eligibility = "Open to Pakistani graduates".into();
        let weak = record("Weak", "Germany", "All levels", "All fields");

        assert!(profile_affinity(&strong, &profile) > profile_affinity(&weak, &profile));

        let ranked = match_and_rank(vec![weak, strong], &profile, &ProfileAffinity::ranker());
        assert_eq!(ranked[0].title, "Strong");
    }

    #[test]
    fn test_academic_score_only_counts_for_merit_awards() {
        let profile = Profile::new().with_academic_score(3.6);
        let mut merit = record("Merit", "Japan", "", "");
        merit.eligibility = "Minimum GPA of 3.0".into();
        let plain = record("Plain", "Japan", "", "");
        assert!(profile_affinity(&merit, &profile) > 0.8);
        assert_eq!(profile_affinity(&plain, &profile), 0.0);
    }
}
