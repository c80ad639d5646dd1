// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The dataflow engine: queues, the namespaces that name them, and the
//! operator stages that move values between them.

mod flow;
mod namespace;
mod queue;
mod stage;

pub mod operators;

#[cfg(test)]
mod integration_tests;

pub use flow::{ns, Flow};
pub use namespace::Namespace;
pub(crate) use namespace::Scope;
pub use operators::{ErrorSink, Sink};
pub use queue::{Queue, QueueEvent, QueueId, QueueStatus, Verdict};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared engine state, recovering the data if a user callback panicked
/// while the lock was held elsewhere.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
