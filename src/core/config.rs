//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::generator::GeneratorSizes;

/// Environment variable naming the snapshot store
pub const STORE_ENV: &str = "VMANAGER_STORE";

/// vmanager configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the SQLite store holding the working state and snapshots
    pub store: Option<PathBuf>,

    /// Sizes used when `init` generates a state
    pub generator: Option<GeneratorSizes>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/vmanager/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Environment variables
        if let Ok(store) = std::env::var(STORE_ENV) {
            if !store.is_empty() {
                config.store = Some(PathBuf::from(store));
            }
        }

        config
    }

    /// Parse one config file, warning instead of failing on bad YAML
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "vmanager")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.generator.is_some() {
            self.generator = other.generator;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Store path, falling back to the platform data directory
    pub fn store_path(&self) -> PathBuf {
        if let Some(ref store) = self.store {
            return store.clone();
        }
        directories::ProjectDirs::from("", "", "vmanager")
            .map(|dirs| dirs.data_dir().join("state.db"))
            .unwrap_or_else(|| PathBuf::from("vmanager.db"))
    }

    /// Generator sizes, falling back to the built-in defaults
    pub fn generator_sizes(&self) -> GeneratorSizes {
        self.generator.unwrap_or_default()
    }
}
