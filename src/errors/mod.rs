// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod flow;

pub use config::{ConfigError, ConfigIssue};
pub use flow::{FlowError, FlowResult};
