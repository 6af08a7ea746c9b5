//! Source and engine configuration.
//!
//! A [`ScholarConfig`] is an immutable value handed to the engine. It is
//! either the built-in table or a user file loaded through [`ConfigStore`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of collectors allowed to run at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Default wall-clock budget for a single collector invocation.
pub const DEFAULT_COLLECTOR_TIMEOUT_MS: u64 = 30_000;

/// Default number of records a single source may contribute.
pub const DEFAULT_SOURCE_LIMIT: usize = 20;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; scholarsift/",
    env!("CARGO_PKG_VERSION"),
    "; +https://github.com/scholarsift/scholarsift)"
);

// ============================================================================
// EngineSettings
// ============================================================================

/// Knobs for the aggregation engine and the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_collector_timeout_ms")]
    pub collector_timeout_ms: u64,

    /// Wall-clock budget for a whole run, off by default. Per-collector
    /// budgets already bound a run to `ceil(sources / concurrency)` budgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_ms: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_collector_timeout_ms() -> u64 {
    DEFAULT_COLLECTOR_TIMEOUT_MS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            collector_timeout_ms: DEFAULT_COLLECTOR_TIMEOUT_MS,
            run_timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

impl EngineSettings {
    /// Concurrency ceiling, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

// ============================================================================
// SourceConfig
// ============================================================================

/// How a source publishes its listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Html,
    /// Partially rendered with JavaScript; static HTML is still attempted.
    HtmlJs,
    Rss,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Html => "html",
            SourceKind::HtmlJs => "html_js",
            SourceKind::Rss => "rss",
        }
    }
}

/// Static metadata for one scholarship source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Registry key, e.g. `"daad"`.
    pub name: String,

    pub display_name: String,

    pub url: String,

    #[serde(default)]
    pub kind: SourceKind,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Lower runs first.
    #[serde(default)]
    pub priority: u32,

    /// Country the source's awards are hosted in, if it has a single one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feeds: Vec<String>,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_limit() -> usize {
    DEFAULT_SOURCE_LIMIT
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            url: url.into(),
            kind: SourceKind::Html,
            enabled: true,
            priority: 0,
            country: None,
            feeds: Vec::new(),
            limit: DEFAULT_SOURCE_LIMIT,
        }
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_feeds(mut self, feeds: &[&str]) -> Self {
        self.feeds = feeds.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

// ============================================================================
// ScholarConfig
// ============================================================================

/// Everything the engine needs to know before a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScholarConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

static BUILTIN_SOURCES: Lazy<Vec<SourceConfig>> = Lazy::new(|| {
    use SourceKind::HtmlJs;

    vec![
        SourceConfig::new(
            "daad",
            "DAAD (German Academic Exchange Service)",
            "https://www2.daad.de/deutschland/stipendium/datenbank/en/21148-scholarship-database/",
        )
        .with_priority(1)
        .with_country("Germany")
        .with_limit(50),
        SourceConfig::new(
            "hec",
            "HEC Pakistan",
            "https://hec.gov.pk/english/scholarshipsgrants/Pages/default.aspx",
        )
        .with_priority(2)
        .with_country("Pakistan"),
        SourceConfig::new(
            "scholarshipportal",
            "ScholarshipPortal (EU)",
            "https://www.scholarshipportal.com/scholarships",
        )
        .with_priority(3)
        .with_feeds(&["https://www.scholarshipportal.com/feed"]),
        SourceConfig::new(
            "scholars4dev",
            "Scholars4Dev",
            "https://www.scholars4dev.com/category/scholarships/",
        )
        .with_priority(4)
        .with_feeds(&["https://www.scholars4dev.com/feed/"]),
        SourceConfig::new(
            "opportunitiescorners",
            "Opportunities Corners",
            "https://opportunitiescorners.com/",
        )
        .with_priority(5)
        .with_feeds(&["https://opportunitiescorners.com/feed/"]),
        SourceConfig::new(
            "youthopportunities",
            "Youth Opportunities",
            "https://www.youthopportunities.com/category/scholarships",
        )
        .with_priority(6)
        .with_feeds(&["https://www.youthopportunities.com/feed/"]),
        SourceConfig::new("nuffic", "Study in NL (Nuffic)", "https://www.studyinnl.org/scholarships")
            .with_priority(7)
            .with_country("Netherlands"),
        SourceConfig::new(
            "swedish_institute",
            "Swedish Institute Scholarships",
            "https://si.se/en/apply/scholarships/",
        )
        .with_priority(8)
        .with_country("Sweden"),
        SourceConfig::new(
            "turkiye_burslari",
            "Türkiye Bursları Scholarships",
            "https://www.turkiyeburslari.gov.tr/",
        )
        .with_priority(9)
        .with_country("Turkey"),
        SourceConfig::new("oas", "OAS Scholarships", "https://www.oas.org/en/scholarships/")
            .with_priority(10),
        SourceConfig::new("maeci", "MAECI Scholarships - Spain", "https://www.aecid.es/")
            .with_priority(11)
            .with_country("Spain"),
        SourceConfig::new(
            "australia_awards",
            "Australia Awards Scholarships",
            "https://www.dfat.gov.au/people-to-people/australia-awards",
        )
        .with_priority(12)
        .with_country("Australia"),
        SourceConfig::new(
            "manaaki",
            "Manaaki New Zealand Scholarships",
            "https://www.nzscholarships.govt.nz/",
        )
        .with_priority(13)
        .with_country("New Zealand"),
        SourceConfig::new(
            "vlir",
            "VLIR-UOS Belgium Scholarships",
            "https://www.vliruos.be/en/scholarships/",
        )
        .with_priority(14)
        .with_country("Belgium"),
        SourceConfig::new("chevening", "Chevening Scholarships", "https://www.chevening.org/scholarships/")
            .with_kind(HtmlJs)
            .with_priority(15)
            .with_country("United Kingdom"),
        SourceConfig::new("fulbright", "Fulbright Program", "https://foreign.fulbrightonline.org/")
            .with_kind(HtmlJs)
            .with_priority(16)
            .with_country("United States"),
        SourceConfig::new(
            "commonwealth",
            "Commonwealth Scholarships",
            "https://cscuk.fcdo.gov.uk/scholarships/",
        )
        .with_kind(HtmlJs)
        .with_priority(17)
        .with_country("United Kingdom"),
        SourceConfig::new(
            "erasmus",
            "Erasmus+ Study Abroad",
            "https://erasmus-plus.ec.europa.eu/opportunities",
        )
        .with_kind(HtmlJs)
        .with_priority(18),
    ]
});

impl ScholarConfig {
    /// The built-in table of scholarship sources with default engine settings.
    pub fn builtin() -> Self {
        Self {
            engine: EngineSettings::default(),
            sources: BUILTIN_SOURCES.clone(),
        }
    }

    /// Built-in source metadata.
    pub fn builtin_sources() -> &'static [SourceConfig] {
        &BUILTIN_SOURCES
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Keep only the named sources enabled. Unknown names are ignored.
    pub fn only_sources(mut self, names: &[String]) -> Self {
        for source in &mut self.sources {
            source.enabled = source.enabled && names.iter().any(|n| n.eq_ignore_ascii_case(&source.name));
        }
        self
    }

    /// Disable the named sources.
    pub fn without_sources(mut self, names: &[String]) -> Self {
        for source in &mut self.sources {
            if names.iter().any(|n| n.eq_ignore_ascii_case(&source.name)) {
                source.enabled = false;
            }
        }
        self
    }

    /// Parse YAML or TOML, picked by the file extension (`.toml` or YAML otherwise).
    pub fn from_str_for_path(content: &str, path: &Path) -> Result<Self, ConfigStoreError> {
        if is_toml(path) {
            toml::from_str(content).map_err(|e| ConfigStoreError::Parse(e.to_string()))
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigStoreError::Parse(e.to_string()))
        }
    }

    pub fn to_string_for_path(&self, path: &Path) -> Result<String, ConfigStoreError> {
        if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| ConfigStoreError::Serialize(e.to_string()))
        } else {
            serde_yaml::to_string(self).map_err(|e| ConfigStoreError::Serialize(e.to_string()))
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// ============================================================================
// ConfigStore
// ============================================================================

/// On-disk location of the user's source configuration.
///
/// Defaults to `~/.config/scholarsift/sources.yaml`.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("scholarsift").join("sources.yaml"),
        }
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the file, or the built-in configuration when there is none.
    ///
    /// A file that exists but does not parse is an error rather than a silent
    /// fallback.
    pub fn load(&self) -> Result<ScholarConfig, ConfigStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let config = ScholarConfig::from_str_for_path(&content, &self.path)?;
                tracing::debug!(
                    path = %self.path.display(),
                    sources = config.sources.len(),
                    "loaded source configuration"
                );
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ScholarConfig::builtin()),
            Err(e) => Err(ConfigStoreError::Io(e.to_string())),
        }
    }

    pub fn save(&self, config: &ScholarConfig) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigStoreError::Io(e.to_string()))?;
        }
        let content = config.to_string_for_path(&self.path)?;
        std::fs::write(&self.path, content).map_err(|e| ConfigStoreError::Io(e.to_string()))?;
        Ok(())
    }

    /// Write the built-in configuration unless a file already exists.
    ///
    /// Returns `Ok(false)` when the file was left untouched.
    pub fn init(&self, force: bool) -> Result<bool, ConfigStoreError> {
        if self.exists() && !force {
            return Ok(false);
        }
        self.save(&ScholarConfig::builtin())?;
        Ok(true)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Errors from configuration storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sources() {
        let config = ScholarConfig::builtin();
        assert_eq!(config.sources.len(), 18);
        assert_eq!(config.engine.max_concurrency, DEFAULT_MAX_CONCURRENCY);

        let daad = config.source("daad").unwrap();
        assert_eq!(daad.priority, 1);
        assert_eq!(daad.country.as_deref(), Some("Germany"));

        let chevening = config.source("chevening").unwrap();
        assert_eq!(chevening.kind, SourceKind::HtmlJs);

        let priorities: Vec<u32> = config.sources.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, (1..=18).collect::<Vec<u32>>());
    }

    #[test]
    fn test_source_defaults_from_yaml() {
        let yaml = r#"
sources:
  - name: custom
    display_name: Custom Portal
    url: https://custom.example.org
"#;
        let config: ScholarConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine, EngineSettings::default());
        let source = &config.sources[0];
        assert!(source.enabled);
        assert_eq!(source.kind, SourceKind::Html);
        assert_eq!(source.limit, DEFAULT_SOURCE_LIMIT);
        assert!(source.feeds.is_empty());
    }

    #[test]
    fn test_run_timeout_is_off_unless_set() {
        let config: ScholarConfig = serde_yaml::from_str("engine: {}\n").unwrap();
        assert_eq!(config.engine.run_timeout_ms, None);

        let yaml = "engine:\n  run_timeout_ms: 90000\n";
        let config: ScholarConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine.run_timeout_ms, Some(90_000));
        assert_eq!(config.engine.collector_timeout_ms, DEFAULT_COLLECTOR_TIMEOUT_MS);
    }

    #[test]
    fn test_source_selection() {
        let config = ScholarConfig::builtin()
            .only_sources(&["DAAD".to_string(), "hec".to_string()])
            .without_sources(&["hec".to_string()]);
        let enabled: Vec<&str> = config
            .sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["daad"]);
    }

    #[test]
    fn test_concurrency_floor() {
        let settings = EngineSettings {
            max_concurrency: 0,
            ..EngineSettings::default()
        };
        assert_eq!(settings.concurrency(), 1);
    }
}
