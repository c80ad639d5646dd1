/// Log level used when neither the config file nor `RUST_LOG` names one
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Levels accepted by `log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
/// Message recorded when a callback-style external function drops its completion
pub const COMPLETION_DROPPED: &str = "completion dropped";
