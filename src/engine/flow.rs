// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Entry point for building pipelines.
//!
//! A [`Flow`] is a constructor bound to one [`Namespace`]. [`Flow::global`] is
//! the process-wide default; [`ns`] (or [`Flow::new`]) creates an isolated one.
//!
//! # Examples
//!
//! ```
//! use queueflow::engine::{Flow, Sink};
//! use queueflow::traits::Transform;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let flow = Flow::new();
//! let doubled = flow
//!     .seed(vec![json!(1), json!(2), json!(3)])
//!     .map(Transform::sync(|v| json!(v.as_i64().unwrap_or(0) * 2)))
//!     .collect()
//!     .await;
//!
//! assert_eq!(doubled, vec![json!(2), json!(4), json!(6)]);
//! # }
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::config::FlowConfig;
use crate::engine::{Namespace, Queue};

static GLOBAL: Lazy<Flow> = Lazy::new(Flow::new);

/// Context-bound constructor for queues.
#[derive(Clone, Debug)]
pub struct Flow {
    namespace: Namespace,
}

impl Flow {
    /// A fresh flow with its own namespace and default configuration.
    pub fn new() -> Self {
        Self::with_config(FlowConfig::default())
    }

    pub fn with_config(config: FlowConfig) -> Self {
        Self {
            namespace: Namespace::new(config),
        }
    }

    /// The process-wide default flow.
    pub fn global() -> Flow {
        GLOBAL.clone()
    }

    /// A fresh, isolated flow sharing this flow's configuration.
    pub fn ns(&self) -> Flow {
        Self::with_config(self.namespace.config().clone())
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn config(&self) -> &FlowConfig {
        self.namespace.config()
    }

    /// An anonymous queue pre-loaded with `values` that closes once drained.
    pub fn seed<I>(&self, values: I) -> Queue
    where
        I: IntoIterator<Item = Value>,
    {
        self.namespace.seeded(values.into_iter().collect(), true)
    }

    /// Look up or create the named queue. It stays open until closed explicitly.
    pub fn queue(&self, name: &str) -> Queue {
        self.namespace.get_or_create(name)
    }

    pub fn anonymous(&self) -> Queue {
        self.namespace.anonymous()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.namespace.exists(name)
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fresh flow with an isolated namespace.
pub fn ns() -> Flow {
    Flow::new()
}
