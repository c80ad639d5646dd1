// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::LOG_LEVELS;
use crate::config::FlowConfig;
use crate::errors::ConfigIssue;

/// Check a loaded configuration, collecting every issue instead of stopping at the first.
pub fn validate_config(cfg: &FlowConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    let level = cfg.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        issues.push(ConfigIssue::UnknownLogLevel {
            level: cfg.log_level.clone(),
        });
    }

    if cfg.max_buffered == Some(0) {
        issues.push(ConfigIssue::ZeroBufferLimit);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_table_driven() {
        struct TestCase {
            name: &'static str,
            config: FlowConfig,
            expected: Result<(), Vec<ConfigIssue>>,
        }

        let test_cases = vec![
            TestCase {
                name: "defaults are valid",
                config: FlowConfig::default(),
                expected: Ok(()),
            },
            TestCase {
                name: "upper case level is accepted",
                config: FlowConfig {
                    log_level: "DEBUG".to_string(),
                    ..FlowConfig::default()
                },
                expected: Ok(()),
            },
            TestCase {
                name: "unknown level",
                config: FlowConfig {
                    log_level: "chatty".to_string(),
                    ..FlowConfig::default()
                },
                expected: Err(vec![ConfigIssue::UnknownLogLevel {
                    level: "chatty".to_string(),
                }]),
            },
            TestCase {
                name: "both issues reported together",
                config: FlowConfig {
                    log_level: "loud".to_string(),
                    max_buffered: Some(0),
                    ..FlowConfig::default()
                },
                expected: Err(vec![
                    ConfigIssue::UnknownLogLevel {
                        level: "loud".to_string(),
                    },
                    ConfigIssue::ZeroBufferLimit,
                ]),
            },
        ];

        for case in test_cases {
            assert_eq!(validate_config(&case.config), case.expected, "case: {}", case.name);
        }
    }
}
