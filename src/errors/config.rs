// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// A single problem found while validating a [`FlowConfig`](crate::config::FlowConfig).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    /// `log_level` is not one of the levels the subscriber understands
    UnknownLogLevel {
        /// The rejected value
        level: String,
    },
    /// `max_buffered` was set to zero, which would warn on every push
    ZeroBufferLimit,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::UnknownLogLevel { level } => {
                write!(
                    f,
                    "Unknown log level '{}': expected one of trace, debug, info, warn, error",
                    level
                )
            }
            ConfigIssue::ZeroBufferLimit => {
                write!(f, "max_buffered must be greater than zero when set")
            }
        }
    }
}

impl std::error::Error for ConfigIssue {}

/// Errors that can occur while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format '{extension}': expected .yaml, .yml or .toml")]
    UnsupportedFormat { extension: String },

    #[error("Configuration validation failed:\n{}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
