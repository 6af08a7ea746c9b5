use scholarsift_core::model::NOT_SPECIFIED;
use scholarsift_core::pipeline::{self, consolidate, dedupe, filter, standardize};
use scholarsift_core::{DegreeLevel, Profile, RawRecord, Record};

fn scraped() -> Vec<RawRecord> {
    vec![
        RawRecord::new("  Erasmus Mundus&nbsp;Joint Masters ", "belgium")
            .with_degree("Master")
            .with_field_of_study("Engineering & Technology")
            .with_url("erasmus-plus.ec.europa.eu"),
        RawRecord::new("DAAD Scholarship Program 2024", "germany"),
        RawRecord::new("Daad   scholarship", "Germany").with_url("https://daad.de"),
        RawRecord::new("Orphan", ""),
        RawRecord::new("Commonwealth Shared Scholarships", "Britain")
            .with_degree("Postgraduate taught"),
    ]
}

#[test]
fn test_consolidate_end_to_end() {
    let records = consolidate(scraped());
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Erasmus Mundus Joint Masters",
            "DAAD Scholarship Program 2024",
            "Commonwealth Shared Scholarships",
        ]
    );
    assert_eq!(records[0].url, "https://erasmus-plus.ec.europa.eu");
    assert_eq!(records[1].url, "");
    assert_eq!(records[1].degree_level, DegreeLevel::Unspecified);
    assert_eq!(records[2].country, "United Kingdom");
    assert_eq!(records[2].degree_level, DegreeLevel::Master);
}

#[test]
fn test_every_text_field_is_filled() {
    for record in consolidate(scraped()) {
        for field in [
            &record.title,
            &record.country,
            &record.field_of_study,
            &record.duration,
            &record.funding,
            &record.eligibility,
            &record.documents,
            &record.deadline,
        ] {
            assert!(!field.is_empty());
        }
        assert!(record.url.is_empty() || record.url.contains("://"));
    }
}

#[test]
fn test_standardize_and_dedupe_are_idempotent() {
    let once = consolidate(scraped());
    let again: Vec<Record> = dedupe(once.clone()).into_iter().map(standardize).collect();
    assert_eq!(again, once);
}

#[test]
fn test_filter_sentinels() {
    let records = consolidate(scraped());
    let profile = Profile::new()
        .with_country("Any Country")
        .with_field_of_study("All Fields");
    assert_eq!(filter(records.clone(), &profile).len(), records.len());

    let profile = Profile::new().with_field_of_study("Engineering Management");
    let kept = filter(records, &profile);
    let titles: Vec<&str> = kept.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Erasmus Mundus Joint Masters"]);
}

#[test]
fn test_field_filter_drops_unlisted_fields() {
    let records = consolidate(vec![
        RawRecord::new("Medicine Award", "Germany"),
        RawRecord::new("Open Research Grant", "Germany").with_field_of_study("All fields"),
        RawRecord::new("Fine Arts Residency", "Germany").with_field_of_study("Painting &amp; Sculpture"),
    ]);
    assert_eq!(records[0].field_of_study, NOT_SPECIFIED);

    let kept = filter(records, &Profile::new().with_field_of_study("Computer Science"));
    let titles: Vec<&str> = kept.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Open Research Grant"]);
}

#[test]
fn test_signature_ignores_case_and_spacing() {
    assert_eq!(
        pipeline::signature("  The Chevening Scholarship ", "UK "),
        pipeline::signature("chevening", "uk")
    );
}
