// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plumbing shared by every operator stage: spawning, pacing and the guard
//! that closes a stage's outputs however its task ends.

use std::future::Future;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::engine::Queue;
use crate::observability::messages::operator::{StageAttached, StageFinished, StageTerminated};
use crate::observability::messages::StructuredLog;

/// Spawn `task` as the consumer of `source`.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn attach<F>(stage: &'static str, source: &Queue, destination: &str, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    source.register_consumer(stage);
    let source_label = source.label();
    let msg = StageAttached {
        stage,
        source: &source_label,
        destination,
    };
    msg.log();
    let span = msg.span(stage);
    tokio::spawn(task.instrument(span))
}

/// Give downstream stages a turn after forwarding a value, so stages interleave
/// item by item instead of one draining its whole source first.
pub(crate) async fn cooperate() {
    tokio::task::yield_now().await;
}

/// Closes the tracked output queues when dropped.
///
/// Dropped without [`finish`](Self::finish) means the task ended abnormally
/// (a panic inside a user function, or an abandoned callback); that is logged
/// before the outputs close so downstream consumers are released either way.
pub(crate) struct StageGuard {
    stage: &'static str,
    source: String,
    outputs: Vec<Queue>,
    processed: usize,
    termination: Option<String>,
    finished: bool,
}

impl StageGuard {
    pub(crate) fn new(stage: &'static str, source: &Queue) -> Self {
        Self {
            stage,
            source: source.label(),
            outputs: Vec::new(),
            processed: 0,
            termination: None,
            finished: false,
        }
    }

    pub(crate) fn output(mut self, queue: &Queue) -> Self {
        self.track(queue);
        self
    }

    /// Add an output discovered while running (e.g. a new branch key).
    pub(crate) fn track(&mut self, queue: &Queue) {
        if !self.outputs.contains(queue) {
            self.outputs.push(queue.clone());
        }
    }

    pub(crate) fn processed(&mut self) {
        self.processed += 1;
    }

    /// Record why the stage is stopping early; the guard logs it on drop.
    pub(crate) fn terminate(&mut self, reason: String) {
        self.termination = Some(reason);
    }

    pub(crate) fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let outputs = self
            .outputs
            .iter()
            .map(Queue::label)
            .collect::<Vec<_>>()
            .join(", ");

        if self.finished && self.termination.is_none() {
            StageFinished {
                stage: self.stage,
                source: &self.source,
                processed: self.processed,
            }
            .log();
        } else {
            let reason = self
                .termination
                .as_deref()
                .unwrap_or("stage task ended before its source closed");
            StageTerminated {
                stage: self.stage,
                destination: &outputs,
                reason,
            }
            .log();
        }

        for output in &self.outputs {
            output.close();
        }
    }
}
