//! Concurrent aggregation across scholarship collectors.
//!
//! This module provides:
//! - `AggregationEngine`: fan-out over collectors with bounded concurrency,
//!   per-collector timeouts and cancellation
//! - `ProgressEvent`: ordered progress notifications
//! - `AggregationReport`: ranked records plus per-collector outcomes
//!
//! # Example
//!
//! ```ignore
//! use scholarsift_core::{AggregationEngine, Profile, ScholarConfig};
//!
//! let engine = AggregationEngine::from_config(&ScholarConfig::builtin())?;
//! let profile = Profile::new().with_country("Germany").with_degree_level("Master");
//! let records = engine.run(&profile, None).await?;
//! ```

mod engine;
mod types;

pub use engine::AggregationEngine;
pub use types::{AggregationReport, ProgressEvent, ProgressFn, SourceFailure, SourceSummary};
