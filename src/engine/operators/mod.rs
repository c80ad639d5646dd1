// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operator stages.
//!
//! Every operator is a method on [`Queue`] that spawns one task consuming the
//! queue and returns the queue its output lands in. Stages pull one value at a
//! time and finish processing it before pulling the next, so ordering within a
//! stage is the source's FIFO order.
//!
//! | operator            | output                                         |
//! |---------------------|------------------------------------------------|
//! | `map`, `map_into`   | transformed values                             |
//! | `filter`            | values passing the predicate                   |
//! | `flatten`           | array elements, one level deep                 |
//! | `each`              | the same values, after a side effect           |
//! | `for_each`          | nothing (terminal)                             |
//! | `chain`             | the same values, into a named queue            |
//! | `branch`            | each value into the named queue its key picks  |
//! | `reduce`            | the fold result, via a [`Sink`]                |
//! | `to_array`          | all values as one array, via a [`Sink`]        |
//! | `every`, `some`     | a boolean, via a [`Sink`]                      |
//! | `exec`              | external function results; errors to an [`ErrorSink`] |

mod collect;
mod exec;
mod forward;
mod route;

use serde_json::Value;
use std::fmt;

use crate::engine::{Queue, Scope};

/// Where a terminal operator (`reduce`, `to_array`, `every`, `some`) delivers its result.
pub enum Sink {
    /// Call the function once with the result.
    Callback(Box<dyn FnOnce(Value) + Send>),
    /// Push the result into the named queue, then close it.
    Named(String),
    /// Push the result into a new anonymous queue, then close it.
    Anonymous,
}

impl Sink {
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        Sink::Callback(Box::new(f))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Sink::Named(name.into())
    }

    /// The queue returned to the caller. For callback sinks it is an anonymous
    /// queue that closes empty once the callback has run.
    pub(crate) fn destination(&self, scope: &Scope) -> Queue {
        match self {
            Sink::Named(name) => scope.get_or_create(name),
            Sink::Callback(_) | Sink::Anonymous => scope.anonymous(),
        }
    }

    pub(crate) fn deliver(self, result: Value, destination: &Queue) {
        match self {
            Sink::Callback(f) => f(result),
            Sink::Named(_) | Sink::Anonymous => {
                destination.push([result]);
            }
        }
    }
}

impl Default for Sink {
    fn default() -> Self {
        Sink::Anonymous
    }
}

impl From<&str> for Sink {
    fn from(name: &str) -> Self {
        Sink::named(name)
    }
}

impl From<String> for Sink {
    fn from(name: String) -> Self {
        Sink::Named(name)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Callback(_) => f.write_str("Sink::Callback"),
            Sink::Named(name) => write!(f, "Sink::Named({:?})", name),
            Sink::Anonymous => f.write_str("Sink::Anonymous"),
        }
    }
}

/// Where `exec` sends `[error, result, args]` records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorSink {
    /// Push into the named queue. The queue is shared and never closed by `exec`.
    Named(String),
    /// No error queue: apply the namespace's `unrouted_errors` policy.
    #[default]
    Unrouted,
}

impl ErrorSink {
    pub fn named(name: impl Into<String>) -> Self {
        ErrorSink::Named(name.into())
    }
}

impl From<&str> for ErrorSink {
    fn from(name: &str) -> Self {
        ErrorSink::named(name)
    }
}
