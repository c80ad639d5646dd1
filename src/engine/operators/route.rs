// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stages that move values into named queues: `chain` and `branch`.

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::engine::stage::{attach, cooperate, StageGuard};
use crate::engine::Queue;

impl Queue {
    /// Forward every value, in order, into the named queue and close it when
    /// this queue closes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn chain(&self, name: &str) -> Queue {
        let destination = self.scope().get_or_create(name);
        let source = self.clone();
        let output = destination.clone();
        attach("chain", self, name, async move {
            let mut guard = StageGuard::new("chain", &source).output(&output);
            while let Some(value) = source.pull().await {
                output.push([value]);
                guard.processed();
                cooperate().await;
            }
            guard.finish();
        });
        destination
    }

    /// Route each value into the named queue whose name `router` returns.
    ///
    /// Every value lands in exactly one queue. Destination queues are created
    /// on first use and closed once this queue closes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn branch<F>(&self, router: F) -> JoinHandle<()>
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let source = self.clone();
        attach("branch", self, "*", async move {
            let mut guard = StageGuard::new("branch", &source);
            while let Some(value) = source.pull().await {
                let key = router(&value);
                let destination = source.scope().get_or_create(&key);
                guard.track(&destination);
                destination.push([value]);
                guard.processed();
                cooperate().await;
            }
            guard.finish();
        })
    }
}
