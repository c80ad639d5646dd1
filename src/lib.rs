// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A single-process, pull-based dataflow engine.
//!
//! Pipelines are chains of operator stages connected by buffered [`Queue`]s.
//! Values move one at a time, only when a downstream stage pulls, so long
//! pipelines stream instead of materializing intermediate results.
//!
//! ```
//! use queueflow::{ns, Sink, Transform};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let flow = ns();
//! let total = flow
//!     .seed(vec![json!(1), json!(2), json!(3)])
//!     .map(Transform::sync(|v| json!(v.as_i64().unwrap_or(0) * 10)))
//!     .reduce(|acc, v| json!(acc.as_i64().unwrap_or(0) + v.as_i64().unwrap_or(0)), Sink::Anonymous, json!(0))
//!     .collect()
//!     .await;
//!
//! assert_eq!(total, vec![json!(60)]);
//! # }
//! ```

pub mod config;         // flow configuration + loading
pub mod engine;         // queues, namespaces, operator stages
pub mod errors;         // error handling
pub mod observability;
pub mod traits;         // transform and external-function conventions
pub mod utils;

pub use config::FlowConfig;
pub use engine::{ns, ErrorSink, Flow, Queue, QueueEvent, Sink, Verdict};
pub use traits::{asynchronous, Completion, External, Transform};
pub use utils::values::tuple;
