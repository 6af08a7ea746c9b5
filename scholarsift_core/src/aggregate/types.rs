//! Progress events and run reports.

use crate::error::CollectorError;
use crate::model::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress notification emitted by the engine loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub message: String,

    /// Fraction of the run completed, in `[0, 1]`.
    pub fraction: f64,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>, fraction: f64) -> Self {
        Self {
            message: message.into(),
            fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

/// Callback receiving progress events, invoked synchronously.
pub type ProgressFn<'a> = &'a (dyn Fn(&ProgressEvent) + Send + Sync);

/// A collector that delivered a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Collector name
    pub source: String,

    pub display_name: String,

    /// Valid records contributed (before dedupe)
    pub count: usize,

    pub duration_ms: u64,
}

/// A collector that contributed nothing because it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,

    pub display_name: String,

    /// Error message
    pub error: String,

    /// Stable machine code, e.g. `"timeout"`
    pub code: String,

    #[serde(default)]
    pub is_timeout: bool,
}

/// Everything a run produced, not just the ranked records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Ranked records
    pub records: Vec<Record>,

    /// Collectors dispatched for this run
    pub dispatched: usize,

    /// Collectors that delivered a batch, in dispatch order
    pub completed: Vec<SourceSummary>,

    /// Collectors that failed or timed out, in dispatch order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceFailure>,

    /// Whether at least one collector failed
    #[serde(default)]
    pub partial: bool,

    /// Valid raw records merged from all batches
    pub raw_count: usize,

    /// Records left after dedupe, before matching
    pub unique_count: usize,

    pub duration_ms: u64,

    pub finished_at: DateTime<Utc>,
}

impl AggregationReport {
    pub fn new(dispatched: usize) -> Self {
        Self {
            records: Vec::new(),
            dispatched,
            completed: Vec::new(),
            errors: Vec::new(),
            partial: false,
            raw_count: 0,
            unique_count: 0,
            duration_ms: 0,
            finished_at: Utc::now(),
        }
    }

    pub fn add_source(&mut self, summary: SourceSummary) {
        self.completed.push(summary);
    }

    pub fn add_error(&mut self, display_name: impl Into<String>, error: &CollectorError) {
        self.errors.push(SourceFailure {
            source: error.collector().to_string(),
            display_name: display_name.into(),
            error: error.cause(),
            code: error.code_str().to_string(),
            is_timeout: error.is_timeout(),
        });
        self.partial = true;
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_progress_fraction_is_clamped() {
        assert_eq!(ProgressEvent::new("x", 1.2).fraction, 1.0);
        assert_eq!(ProgressEvent::new("x", -0.5).fraction, 0.0);
    }

    #[test]
    fn test_add_error_marks_partial() {
        let mut report = AggregationReport::new(2);
        report.add_source(SourceSummary {
            source: "daad".into(),
            display_name: "DAAD".into(),
            count: 4,
            duration_ms: 12,
        });
        assert!(!report.partial);

        report.add_error(
            "HEC Pakistan",
            &CollectorError::failure("hec", FetchError::Parse("empty page".into())),
        );
        assert!(report.partial);
        assert_eq!(report.errors[0].source, "hec");
        assert_eq!(report.errors[0].code, "parse_error");
        assert!(!report.errors[0].is_timeout);
    }
}
