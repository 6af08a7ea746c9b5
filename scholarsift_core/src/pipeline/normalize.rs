//! Vocabulary standardization and free-text cleanup.
//!
//! Every function here is total and idempotent: feeding an already
//! standardized record back in returns it unchanged.

use crate::model::{DegreeLevel, Record, NOT_SPECIFIED};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static COUNTRY_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("usa", "United States"),
        ("us", "United States"),
        ("u.s.", "United States"),
        ("u.s.a.", "United States"),
        ("united states of america", "United States"),
        ("uk", "United Kingdom"),
        ("u.k.", "United Kingdom"),
        ("britain", "United Kingdom"),
        ("great britain", "United Kingdom"),
        ("england", "United Kingdom"),
        ("deutschland", "Germany"),
        ("holland", "Netherlands"),
        ("the netherlands", "Netherlands"),
        ("türkiye", "Turkey"),
        ("turkiye", "Turkey"),
    ])
});

// `host:8080` is a port, not a scheme
static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:(?://|[^\d])").expect("valid scheme regex"));

/// Standardize every field of a record.
pub fn standardize(record: Record) -> Record {
    Record {
        title: clean_text(&record.title),
        country: standardize_country(&record.country),
        degree_level: standardize_degree(record.degree_level),
        field_of_study: clean_text(&record.field_of_study),
        duration: clean_text(&record.duration),
        funding: clean_text(&record.funding),
        eligibility: clean_text(&record.eligibility),
        documents: clean_text(&record.documents),
        deadline: clean_text(&record.deadline),
        url: normalize_url(&record.url),
        source: record.source.trim().to_string(),
    }
}

/// Map a country name or abbreviation onto its canonical English name.
pub fn standardize_country(country: &str) -> String {
    let cleaned = clean_text(country);
    match COUNTRY_SYNONYMS.get(cleaned.to_lowercase().as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => cleaned,
    }
}

/// Apply the degree rules to text that has not been classified yet.
pub fn standardize_degree(degree: DegreeLevel) -> DegreeLevel {
    match degree {
        DegreeLevel::Other(text) => DegreeLevel::classify(&clean_text(&text)),
        known => known,
    }
}

/// Decode the two entities scraped pages leak most, collapse whitespace and
/// trim. Empty input becomes [`NOT_SPECIFIED`].
pub fn clean_text(text: &str) -> String {
    let mut decoded = text.to_string();
    // "&amp;nbsp;" decodes in two steps
    loop {
        let next = decoded.replace("&nbsp;", " ").replace("&amp;", "&");
        if next == decoded {
            break;
        }
        decoded = next;
    }

    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        collapsed
    }
}

/// Trim a URL and give it `https://` when it has no scheme. Opaque schemes
/// such as `mailto:` are kept as they are.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() || URL_SCHEME.is_match(trimmed) {
        trimmed.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", trimmed)
    }
}
