//! Text heuristics shared by the HTML and feed collectors.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

/// Keyword → country, checked in order on word boundaries.
const COUNTRY_KEYWORDS: &[(&str, &str)] = &[
    ("germany", "Germany"),
    ("united states", "United States"),
    ("usa", "United States"),
    ("united kingdom", "United Kingdom"),
    ("uk", "United Kingdom"),
    ("canada", "Canada"),
    ("australia", "Australia"),
    ("new zealand", "New Zealand"),
    ("netherlands", "Netherlands"),
    ("belgium", "Belgium"),
    ("sweden", "Sweden"),
    ("norway", "Norway"),
    ("denmark", "Denmark"),
    ("finland", "Finland"),
    ("switzerland", "Switzerland"),
    ("france", "France"),
    ("italy", "Italy"),
    ("spain", "Spain"),
    ("hungary", "Hungary"),
    ("turkey", "Turkey"),
    ("japan", "Japan"),
    ("china", "China"),
    ("singapore", "Singapore"),
    ("korea", "South Korea"),
    ("pakistan", "Pakistan"),
];

static COUNTRY_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    COUNTRY_KEYWORDS
        .iter()
        .map(|(keyword, country)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
            (Regex::new(&pattern).expect("valid country pattern"), *country)
        })
        .collect()
});

static DEADLINE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b\d{1,2}[-/]\d{1,2}[-/]\d{4}\b",
        r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b",
        r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
        r"(?i)\b\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December),?\s+\d{4}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid deadline pattern"))
    .collect()
});

const LINK_KEYWORDS: &[&str] = &[
    "scholarship",
    "fellowship",
    "grant",
    "funding",
    "bursary",
    "award",
];

/// Shortest link text treated as a listing title.
const MIN_LINK_TITLE_CHARS: usize = 16;

/// First country named in the text.
pub fn extract_country(text: &str) -> Option<&'static str> {
    COUNTRY_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, country)| *country)
}

/// Degree level mentioned in the text, as a display label.
pub fn extract_degree(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if lower.contains("postdoc") {
        Some("Postdoctoral")
    } else if lower.contains("phd") || lower.contains("doctoral") {
        Some("PhD")
    } else if lower.contains("master") || lower.contains("postgraduate") || lower.contains("mphil") {
        Some("Master's")
    } else if lower.contains("bachelor") || lower.contains("undergraduate") {
        Some("Bachelor's")
    } else {
        None
    }
}

pub fn extract_funding(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains("fully funded") || lower.contains("full funding") {
        "Fully funded"
    } else if lower.contains("partial") {
        "Partial funding"
    } else {
        "See official website"
    }
}

// Matched on the original text so offsets stay valid for any script
static DEADLINE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)deadline").expect("valid deadline word regex"));

/// A date, a rolling-deadline note, or the sentence starting at "deadline".
pub fn extract_deadline(text: &str) -> Option<String> {
    if let Some(found) = DEADLINE_PATTERNS.iter().find_map(|p| p.find(text)) {
        return Some(found.as_str().to_string());
    }

    let lower = text.to_lowercase();
    if lower.contains("rolling") {
        return Some("Rolling deadline".to_string());
    }

    if let Some(found) = DEADLINE_WORD.find(text) {
        let snippet: String = text[found.start()..].chars().take(100).collect();
        let sentence = snippet.split('.').next().unwrap_or_default().trim();
        if !sentence.is_empty() {
            return Some(sentence.to_string());
        }
    }
    None
}

/// Link text that looks like a scholarship listing.
pub fn is_scholarship_link(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.chars().count() >= MIN_LINK_TITLE_CHARS && LINK_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Resolve `href` against the page URL, keeping only http(s) targets.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    base.join(href)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
}

/// Decode HTML entities left in scraped snippets.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Visible text of an element with whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of an HTML fragment, e.g. a feed summary.
pub fn fragment_text(fragment: &str) -> String {
    let parsed = scraper::Html::parse_fragment(fragment);
    element_text(parsed.root_element())
}
