//! # Configuration Loader
//!
//! Reads a TOML file and maps it onto [`ClubhouseConfig`]. Missing keys take
//! the model's defaults; no other validation happens here.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ch_core::ClubhouseConfig;

pub const DEFAULT_CONFIG_FILE: &str = "clubhouse.toml";

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid TOML, or does not
/// map onto the configuration model.
pub fn load_config(config_path: &Path) -> anyhow::Result<ClubhouseConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    ClubhouseConfig::from_toml(&toml_value)
}

/// Platform location of the default config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clubhouse").join(DEFAULT_CONFIG_FILE))
}

/// An explicit path must load; the default path is used only if present.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<(ClubhouseConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }
    match default_config_path() {
        Some(path) if path.exists() => Ok((load_config(&path)?, Some(path))),
        _ => Ok((ClubhouseConfig::default(), None)),
    }
}
