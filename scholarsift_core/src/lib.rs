// src/lib.rs
pub mod aggregate;
pub mod collectors;
pub mod config;
pub mod cpu_pool;
pub mod error;
pub mod model;
pub mod pipeline;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

pub use crate::aggregate::{AggregationEngine, AggregationReport, ProgressEvent};
pub use crate::config::{ConfigStore, EngineSettings, ScholarConfig, SourceConfig, SourceKind};
pub use crate::error::{CollectorError, EngineError, FetchError};
pub use crate::model::{DegreeLevel, Profile, RawRecord, Record};
pub use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Collector: Send + Sync {
    /// Unique name of the collector, also its registry key.
    fn name(&self) -> &str;

    /// Name used in progress messages and listings.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Fetch one batch of raw records for the profile.
    ///
    /// Implementations return everything they found or an error; the engine
    /// never sees half a batch.
    async fn collect(&self, profile: &Profile) -> Result<Vec<RawRecord>, FetchError>;
}

/// Read-only dispatch metadata for a collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    pub name: String,
    pub display_name: String,
    pub priority: u32,
    pub source_country: Option<String>,
    pub enabled: bool,
}

impl From<&SourceConfig> for SourceMeta {
    fn from(source: &SourceConfig) -> Self {
        Self {
            name: source.name.clone(),
            display_name: source.display_name.clone(),
            priority: source.priority,
            source_country: source.country.clone(),
            enabled: source.enabled,
        }
    }
}

/// A collector paired with its metadata, cheap to clone into a task.
#[derive(Clone)]
pub struct CollectorHandle {
    meta: SourceMeta,
    collector: Arc<dyn Collector>,
}

impl std::fmt::Debug for CollectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorHandle").field("meta", &self.meta).finish()
    }
}

impl CollectorHandle {
    pub fn new(meta: SourceMeta, collector: Arc<dyn Collector>) -> Self {
        Self { meta, collector }
    }

    /// Wrap a collector with metadata taken from its own names.
    pub fn from_collector<C: Collector + 'static>(collector: C) -> Self {
        let meta = SourceMeta {
            name: collector.name().to_string(),
            display_name: collector.display_name().to_string(),
            priority: 0,
            source_country: None,
            enabled: true,
        };
        Self::new(meta, Arc::new(collector))
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.meta.priority = priority;
        self
    }

    pub fn with_source_country(mut self, country: impl Into<String>) -> Self {
        self.meta.source_country = Some(country.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.meta.enabled = enabled;
        self
    }

    pub fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn display_name(&self) -> &str {
        &self.meta.display_name
    }

    pub fn is_enabled(&self) -> bool {
        self.meta.enabled
    }

    /// Run the collector under a wall-clock budget.
    ///
    /// Disabled collectors succeed immediately with nothing. Errors and panics
    /// come back as a [`CollectorError`] naming the collector; a result that
    /// arrives after the budget is dropped.
    pub async fn invoke(
        &self,
        profile: &Profile,
        budget: Duration,
    ) -> Result<Vec<RawRecord>, CollectorError> {
        if !self.meta.enabled {
            return Ok(Vec::new());
        }

        let call = AssertUnwindSafe(self.collector.collect(profile)).catch_unwind();
        match tokio::time::timeout(budget, call).await {
            Ok(Ok(Ok(batch))) => Ok(batch),
            Ok(Ok(Err(cause))) => Err(CollectorError::failure(&self.meta.name, cause)),
            Ok(Err(payload)) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(CollectorError::failure(
                    &self.meta.name,
                    FetchError::Internal(format!("collector panicked: {}", reason)),
                ))
            }
            Err(_) => Err(CollectorError::timeout(
                &self.meta.name,
                budget.as_millis() as u64,
            )),
        }
    }
}

/// Builds a collector for one configured source.
pub type CollectorFactory = fn(&SourceConfig, &reqwest::Client) -> Box<dyn Collector>;

/// Flat name → factory table. Sources without a dedicated entry use the
/// fallback factory.
pub struct CollectorRegistry {
    factories: HashMap<String, CollectorFactory>,
    fallback: CollectorFactory,
}

impl CollectorRegistry {
    /// Empty registry; every source gets the generic collector.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            fallback: collectors::generic::factory,
        }
    }

    /// Registry with the dedicated DAAD and HEC collectors.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("daad", collectors::daad::factory);
        registry.register("hec", collectors::hec::factory);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: CollectorFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn with_fallback(mut self, fallback: CollectorFactory) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn has_dedicated(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn build_one(&self, source: &SourceConfig, client: &reqwest::Client) -> CollectorHandle {
        let factory = self
            .factories
            .get(&source.name)
            .copied()
            .unwrap_or(self.fallback);
        CollectorHandle::new(SourceMeta::from(source), Arc::from(factory(source, client)))
    }

    /// Build a handle for every configured source, sharing one HTTP client.
    pub fn build(&self, config: &ScholarConfig) -> Result<Vec<CollectorHandle>, FetchError> {
        let client = collectors::build_client(&config.engine)?;
        Ok(config
            .sources
            .iter()
            .map(|source| self.build_one(source, &client))
            .collect())
    }
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
