// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Terminal stages that fold a whole stream into one result: `reduce`,
//! `to_array`, `every` and `some`.

use serde_json::Value;
use tokio::sync::oneshot;

use crate::engine::operators::Sink;
use crate::engine::stage::{attach, StageGuard};
use crate::engine::Queue;

impl Queue {
    /// Left-fold the stream, starting from `initial`.
    ///
    /// The accumulator is updated as each value arrives; only the final value is
    /// delivered to `sink`, once the source closes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn reduce<F>(&self, f: F, sink: Sink, initial: Value) -> Queue
    where
        F: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        let destination = sink.destination(self.scope());
        let source = self.clone();
        let output = destination.clone();
        attach("reduce", self, &destination.label(), async move {
            let mut guard = StageGuard::new("reduce", &source).output(&output);
            let mut acc = initial;
            while let Some(value) = source.pull().await {
                acc = f(acc, value);
                guard.processed();
            }
            sink.deliver(acc, &output);
            guard.finish();
        });
        destination
    }

    /// Gather every value, in arrival order, into one array.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn to_array(&self, sink: Sink) -> Queue {
        let destination = sink.destination(self.scope());
        let source = self.clone();
        let output = destination.clone();
        attach("to_array", self, &destination.label(), async move {
            let mut guard = StageGuard::new("to_array", &source).output(&output);
            let mut items = Vec::new();
            while let Some(value) = source.pull().await {
                items.push(value);
                guard.processed();
            }
            sink.deliver(Value::Array(items), &output);
            guard.finish();
        });
        destination
    }

    /// Await every value of the stream.
    ///
    /// Never resolves if a close listener keeps vetoing the close.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub async fn collect(&self) -> Vec<Value> {
        let (tx, rx) = oneshot::channel();
        self.to_array(Sink::callback(move |result| {
            let _ = tx.send(result);
        }));
        match rx.await {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// True unless some value fails `predicate`. Stops pulling at the first failure.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn every<F>(&self, predicate: F, sink: Sink) -> Queue
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.scan("every", true, predicate, sink)
    }

    /// False unless some value passes `predicate`. Stops pulling at the first match.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn some<F>(&self, predicate: F, sink: Sink) -> Queue
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.scan("some", false, predicate, sink)
    }

    /// Scan until `predicate` disagrees with `start`, then report `!start`.
    fn scan<F>(&self, stage: &'static str, start: bool, predicate: F, sink: Sink) -> Queue
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let destination = sink.destination(self.scope());
        let source = self.clone();
        let output = destination.clone();
        attach(stage, self, &destination.label(), async move {
            let mut guard = StageGuard::new(stage, &source).output(&output);
            let mut result = start;
            while let Some(value) = source.pull().await {
                guard.processed();
                if predicate(&value) != start {
                    result = !start;
                    break;
                }
            }
            sink.deliver(Value::Bool(result), &output);
            guard.finish();
        });
        destination
    }
}
