//! Configuration file management for Brainstorm.
//!
//! Reads `~/.config/brainstorm/config.toml` when present. A missing file is
//! not an error; every section falls back to its defaults. The environment
//! variables `BRAINSTORM_ENDPOINT` and `BRAINSTORM_MODEL` override the
//! generator endpoint and default model.

use brainstorm_core::config::BrainstormConfig;
use brainstorm_core::{BrainstormError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENDPOINT_ENV: &str = "BRAINSTORM_ENDPOINT";
pub const MODEL_ENV: &str = "BRAINSTORM_MODEL";

/// Returns the path to the configuration file: ~/.config/brainstorm/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BrainstormError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("brainstorm").join("config.toml"))
}

/// Loads the configuration from the default path and applies environment
/// overrides.
pub fn load_config() -> Result<BrainstormConfig> {
    let mut config = load_config_from(&config_path()?)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Loads the configuration from `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<BrainstormConfig> {
    if !path.exists() {
        tracing::debug!("[Config] No config file at {}, using defaults", path.display());
        return Ok(BrainstormConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        BrainstormError::config(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        BrainstormError::config(format!(
            "Failed to parse configuration file at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Applies overrides read through `lookup`. Empty values are ignored.
pub fn apply_env_overrides(config: &mut BrainstormConfig, lookup: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(endpoint) = read(ENDPOINT_ENV) {
        tracing::info!("[Config] Generator endpoint overridden by {}", ENDPOINT_ENV);
        config.generator.endpoint = endpoint;
    }
    if let Some(model) = read(MODEL_ENV) {
        tracing::info!("[Config] Default model overridden by {}", MODEL_ENV);
        config.generator.default_model = model;
    }
}
