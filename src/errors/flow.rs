// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by queues, namespaces and operator stages.

use thiserror::Error;

/// Failures surfaced by the dataflow engine itself.
///
/// Errors produced by external functions run through `exec` are *not* represented
/// here: those travel through the pipeline as data and land on an error queue.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// The queue already completed its close transition and accepts no more values.
    #[error("Queue '{queue}' is closed and no longer accepts values")]
    QueueClosed { queue: String },

    /// `as_named` was asked to bind a name already held by a different queue.
    #[error("Queue name '{name}' is already bound in this namespace")]
    NameTaken { name: String },

    /// `as_named` was called after every handle to the queue's namespace was dropped.
    #[error("Cannot bind '{name}': the namespace no longer exists")]
    NamespaceDropped { name: String },

    /// An asynchronous transform dropped its callback without ever calling it.
    #[error("Stage '{stage}' lost its callback before a result was produced")]
    CallbackDropped { stage: String },
}

pub type FlowResult<T> = Result<T, FlowError>;
