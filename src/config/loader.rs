// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_LOG_LEVEL;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime configuration for a [`Flow`](crate::engine::Flow).
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// usable configuration.
///
/// # Fields
/// * `unrouted_errors` - What `exec` does with errors when no error queue was named
/// * `log_level` - Default level for the binary's log subscriber
/// * `max_buffered` - Soft per-queue buffer limit; crossing it logs a warning
///
/// # Example
/// ```yaml
/// unrouted_errors: warn
/// log_level: debug
/// max_buffered: 10000
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub unrouted_errors: UnroutedErrors,
    pub log_level: String,
    pub max_buffered: Option<usize>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            unrouted_errors: UnroutedErrors::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            max_buffered: None,
        }
    }
}

/// Policy for `exec` errors that have no error queue to land on.
///
/// # Variants
/// * `Warn` - Log each dropped error at `warn` level
/// * `Drop` - Discard silently
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnroutedErrors {
    #[default]
    Warn,
    Drop,
}

/// Load a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FlowConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => {
            if content.trim().is_empty() {
                return Ok(FlowConfig::default());
            }
            Ok(serde_yaml::from_str(&content)?)
        }
        "toml" => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat { extension }),
    }
}

/// Load a config file and validate it.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<FlowConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
