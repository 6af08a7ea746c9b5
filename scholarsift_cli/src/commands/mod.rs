pub mod config;
pub mod search;
pub mod sources;

use crate::cli::Cli;
use scholarsift_core::config::ConfigStoreError;
use scholarsift_core::{ConfigStore, EngineError, FetchError, ScholarConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown source(s): {0}")]
    UnknownSource(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Search cancelled")]
    Cancelled,

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Could not set up sources: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Store selected by `--config`, or the default location.
pub fn config_store(cli: &Cli) -> ConfigStore {
    match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default(),
    }
}

pub fn load_config(cli: &Cli) -> Result<ScholarConfig> {
    Ok(config_store(cli).load()?)
}
