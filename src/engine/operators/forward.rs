// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-value stages: `map`, `filter`, `flatten`, `each` and `for_each`.

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::engine::stage::{attach, cooperate, StageGuard};
use crate::engine::Queue;
use crate::errors::FlowError;
use crate::traits::Transform;

impl Queue {
    /// Transform every value into a new anonymous queue.
    ///
    /// A [`Transform::Async`] function is awaited for each value before the next
    /// one is pulled.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn map(&self, transform: Transform) -> Queue {
        self.map_to("map", self.scope().anonymous(), transform)
    }

    /// Like [`map`](Self::map), but into the named queue.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn map_into(&self, name: &str, transform: Transform) -> Queue {
        self.map_to("map", self.scope().get_or_create(name), transform)
    }

    fn map_to(&self, stage: &'static str, destination: Queue, transform: Transform) -> Queue {
        let source = self.clone();
        let output = destination.clone();
        attach(stage, self, &destination.label(), async move {
            let mut guard = StageGuard::new(stage, &source).output(&output);
            while let Some(value) = source.pull().await {
                match transform.apply(value).await {
                    Some(result) => {
                        output.push([result]);
                    }
                    None => {
                        let error = FlowError::CallbackDropped {
                            stage: stage.to_string(),
                        };
                        guard.terminate(error.to_string());
                        return;
                    }
                }
                guard.processed();
                cooperate().await;
            }
            guard.finish();
        });
        destination
    }

    /// Keep only values for which `predicate` returns true.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn filter<F>(&self, predicate: F) -> Queue
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let destination = self.scope().anonymous();
        let source = self.clone();
        let output = destination.clone();
        attach("filter", self, &destination.label(), async move {
            let mut guard = StageGuard::new("filter", &source).output(&output);
            while let Some(value) = source.pull().await {
                guard.processed();
                if !predicate(&value) {
                    continue;
                }
                output.push([value]);
                cooperate().await;
            }
            guard.finish();
        });
        destination
    }

    /// Unwrap arrays one level; other values pass through unchanged.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn flatten(&self) -> Queue {
        let destination = self.scope().anonymous();
        let source = self.clone();
        let output = destination.clone();
        attach("flatten", self, &destination.label(), async move {
            let mut guard = StageGuard::new("flatten", &source).output(&output);
            while let Some(value) = source.pull().await {
                match value {
                    Value::Array(items) => {
                        output.push(items);
                    }
                    other => {
                        output.push([other]);
                    }
                }
                guard.processed();
                cooperate().await;
            }
            guard.finish();
        });
        destination
    }

    /// Run `f` on every value and pass the value on unchanged.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn each<F>(&self, f: F) -> Queue
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let destination = self.scope().anonymous();
        let source = self.clone();
        let output = destination.clone();
        attach("each", self, &destination.label(), async move {
            let mut guard = StageGuard::new("each", &source).output(&output);
            while let Some(value) = source.pull().await {
                f(&value);
                output.push([value]);
                guard.processed();
                cooperate().await;
            }
            guard.finish();
        });
        destination
    }

    /// Terminal form of [`each`](Self::each): consume values without re-emitting them.
    ///
    /// The returned handle completes when the source closes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn for_each<F>(&self, f: F) -> JoinHandle<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let source = self.clone();
        attach("for_each", self, "-", async move {
            let mut guard = StageGuard::new("for_each", &source);
            while let Some(value) = source.pull().await {
                f(value);
                guard.processed();
            }
            guard.finish();
        })
    }
}
