//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use clap::ValueEnum;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::core::{Config, Workspace};

/// Store path: `--store` first, then config and environment
pub fn store_path(global: &GlobalOpts, config: &Config) -> PathBuf {
    global
        .store
        .clone()
        .unwrap_or_else(|| config.store_path())
}

/// Open the workspace the global options point at
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let config = Config::load();
    let path = store_path(global, &config);
    Workspace::open(&path).map_err(|e| miette::miette!("{}", e))
}

/// Resolve `--format auto` through the configured default
///
/// `fallback` is used when neither the flag nor the config picks a format.
pub fn output_format(global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    Config::load()
        .default_format
        .and_then(|f| <OutputFormat as ValueEnum>::from_str(&f, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(fallback)
}

/// Print a success line unless `--quiet` is set
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Comma-separated id list, or "-" when empty
pub fn format_ids(ids: &[EntityId]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A file reference for display, "-" for none
pub fn format_file_ref(id: Option<EntityId>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Optional file reference on the command line
///
/// Accepts an id, or `none` / `-1` to clear the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRef(pub Option<EntityId>);

impl std::str::FromStr for FileRef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "-1" | "-" => Ok(FileRef(None)),
            other => other
                .parse::<EntityId>()
                .map(|id| FileRef(Some(id)))
                .map_err(|e| e.to_string()),
        }
    }
}
