//! CLI configuration lookup

use anyhow::{Context, Result};
use datapilot_core::AppConfig;
use std::path::{Path, PathBuf};

/// Loads settings from `explicit`, else the per-user config file if present,
/// else environment variables and defaults only.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }

    match config_path().filter(|path| path.exists()) {
        Some(path) => AppConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => AppConfig::load().context("Failed to load configuration from environment"),
    }
}

/// Get the default configuration file path
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("datapilot").join("config.toml"))
}
