//! Records, degree levels and search profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for a field a source did not provide.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Profile country meaning "no country preference".
pub const ANY_COUNTRY: &str = "Any Country";

/// Profile field of study meaning "no field preference".
pub const ALL_FIELDS: &str = "All Fields";

/// Record field of study meaning "open to every field".
pub const RECORD_ALL_FIELDS: &str = "All fields";

/// Record degree meaning "open to every level".
pub const ALL_LEVELS: &str = "All levels";

// ============================================================================
// DegreeLevel
// ============================================================================

/// Academic level a scholarship is offered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DegreeLevel {
    Bachelor,
    Master,
    PhD,
    Postdoctoral,
    #[default]
    Unspecified,
    Other(String),
}

impl DegreeLevel {
    /// Classify free text with the ordered substring rules.
    ///
    /// The first matching rule wins; text matching no rule is kept verbatim
    /// (trimmed) as [`DegreeLevel::Other`].
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == NOT_SPECIFIED {
            return DegreeLevel::Unspecified;
        }

        let lower = trimmed.to_lowercase();
        if lower.contains("bachelor") || lower.contains("undergraduate") {
            DegreeLevel::Bachelor
        } else if lower.contains("master") || lower.contains("postgraduate") {
            DegreeLevel::Master
        } else if lower.contains("phd") || lower.contains("doctoral") || lower.contains("doctorate")
        {
            DegreeLevel::PhD
        } else if lower.contains("postdoc") {
            DegreeLevel::Postdoctoral
        } else {
            DegreeLevel::Other(trimmed.to_string())
        }
    }

    /// Display label, e.g. `"Master's"`.
    pub fn label(&self) -> &str {
        match self {
            DegreeLevel::Bachelor => "Bachelor's",
            DegreeLevel::Master => "Master's",
            DegreeLevel::PhD => "PhD",
            DegreeLevel::Postdoctoral => "Postdoctoral",
            DegreeLevel::Unspecified => NOT_SPECIFIED,
            DegreeLevel::Other(text) => text,
        }
    }

    /// True when the record is open to any level (or does not say).
    pub fn is_open(&self) -> bool {
        match self {
            DegreeLevel::Unspecified => true,
            DegreeLevel::Other(text) => text.eq_ignore_ascii_case(ALL_LEVELS),
            _ => false,
        }
    }
}

impl fmt::Display for DegreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for DegreeLevel {
    fn from(value: String) -> Self {
        match value.trim() {
            "" | NOT_SPECIFIED => DegreeLevel::Unspecified,
            "Bachelor's" => DegreeLevel::Bachelor,
            "Master's" => DegreeLevel::Master,
            "PhD" => DegreeLevel::PhD,
            "Postdoctoral" => DegreeLevel::Postdoctoral,
            other => DegreeLevel::Other(other.to_string()),
        }
    }
}

impl From<DegreeLevel> for String {
    fn from(value: DegreeLevel) -> Self {
        value.label().to_string()
    }
}

// ============================================================================
// RawRecord
// ============================================================================

/// A listing exactly as a collector scraped it.
///
/// Every field is optional; nothing is cleaned yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Collector that produced the record; filled in by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RawRecord {
    /// Create a raw record with the two mandatory fields.
    pub fn new(title: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            country: Some(country.into()),
            ..Self::default()
        }
    }

    pub fn with_degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = Some(degree.into());
        self
    }

    pub fn with_field_of_study(mut self, field: impl Into<String>) -> Self {
        self.field_of_study = Some(field.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_funding(mut self, funding: impl Into<String>) -> Self {
        self.funding = Some(funding.into());
        self
    }

    pub fn with_eligibility(mut self, eligibility: impl Into<String>) -> Self {
        self.eligibility = Some(eligibility.into());
        self
    }

    pub fn with_documents(mut self, documents: impl Into<String>) -> Self {
        self.documents = Some(documents.into());
        self
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A raw record is usable only when it has a title and a country.
    pub fn is_valid(&self) -> bool {
        fn present(field: &Option<String>) -> bool {
            field.as_deref().is_some_and(|v| !v.trim().is_empty())
        }
        present(&self.title) && present(&self.country)
    }
}

// ============================================================================
// Record
// ============================================================================

/// A listing in the shared vocabulary, ready for matching and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub country: String,
    #[serde(rename = "degree")]
    pub degree_level: DegreeLevel,
    pub field_of_study: String,
    pub duration: String,
    pub funding: String,
    pub eligibility: String,
    pub documents: String,
    pub deadline: String,
    pub url: String,
    #[serde(default)]
    pub source: String,
}

impl From<RawRecord> for Record {
    /// Structural conversion only; vocabulary is left for the normalizer.
    fn from(raw: RawRecord) -> Self {
        let degree_level = match raw.degree {
            Some(text) if !text.trim().is_empty() => DegreeLevel::Other(text),
            _ => DegreeLevel::Unspecified,
        };

        Self {
            title: raw.title.unwrap_or_default(),
            country: raw.country.unwrap_or_default(),
            degree_level,
            field_of_study: raw.field_of_study.unwrap_or_default(),
            duration: raw.duration.unwrap_or_default(),
            funding: raw.funding.unwrap_or_default(),
            eligibility: raw.eligibility.unwrap_or_default(),
            documents: raw.documents.unwrap_or_default(),
            deadline: raw.deadline.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            source: raw.source.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Search criteria for one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_level: Option<String>,

    /// Defaults to [`ALL_FIELDS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,

    /// Defaults to [`ANY_COUNTRY`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_score: Option<f64>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_degree_level(mut self, degree: impl Into<String>) -> Self {
        self.degree_level = Some(degree.into());
        self
    }

    pub fn with_field_of_study(mut self, field: impl Into<String>) -> Self {
        self.field_of_study = Some(field.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_nationality(mut self, nationality: impl Into<String>) -> Self {
        self.nationality = Some(nationality.into());
        self
    }

    pub fn with_academic_score(mut self, score: f64) -> Self {
        self.academic_score = Some(score);
        self
    }

    /// Requested degree level, if any.
    pub fn degree_level(&self) -> Option<&str> {
        non_blank(&self.degree_level)
    }

    /// Requested country, or the [`ANY_COUNTRY`] sentinel.
    pub fn country(&self) -> &str {
        non_blank(&self.country).unwrap_or(ANY_COUNTRY)
    }

    /// Requested field of study, or the [`ALL_FIELDS`] sentinel.
    pub fn field_of_study(&self) -> &str {
        non_blank(&self.field_of_study).unwrap_or(ALL_FIELDS)
    }

    pub fn nationality(&self) -> Option<&str> {
        non_blank(&self.nationality)
    }

    /// Country preference with the sentinel filtered out.
    pub fn preferred_country(&self) -> Option<&str> {
        Some(self.country()).filter(|c| !c.eq_ignore_ascii_case(ANY_COUNTRY))
    }

    /// Field preference with the sentinel filtered out.
    pub fn preferred_field(&self) -> Option<&str> {
        Some(self.field_of_study()).filter(|f| !f.eq_ignore_ascii_case(ALL_FIELDS))
    }
}
