// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-value transformation functions, tagged as direct or callback-style.
//!
//! The tag is fixed when the [`Transform`] is built, so a stage never has to guess
//! at call time which convention a function follows.
//!
//! # Examples
//!
//! ```
//! use queueflow::traits::{asynchronous, Transform};
//! use serde_json::json;
//!
//! let double = Transform::sync(|v| json!(v.as_i64().unwrap_or(0) * 2));
//! assert!(!double.is_async());
//!
//! let later = asynchronous(|v, callback| callback.call(v));
//! assert!(later.is_async());
//! ```

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

type SyncFn = dyn Fn(Value) -> Value + Send + Sync;
type AsyncFn = dyn Fn(Value, Callback) + Send + Sync;

/// A transformation applied to every value flowing through `map`.
#[derive(Clone)]
pub enum Transform {
    /// Called as `f(value)`; the return value is emitted immediately.
    Sync(Arc<SyncFn>),
    /// Called as `f(value, callback)`; the stage waits for `callback.call(result)`.
    Async(Arc<AsyncFn>),
}

impl Transform {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Transform::Sync(Arc::new(f))
    }

    pub fn asynchronous<F>(f: F) -> Self
    where
        F: Fn(Value, Callback) + Send + Sync + 'static,
    {
        Transform::Async(Arc::new(f))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Transform::Async(_))
    }

    /// Run the transformation on one value.
    ///
    /// Returns `None` when a callback-style function dropped its callback without
    /// calling it; no result will ever arrive for that value.
    pub(crate) async fn apply(&self, value: Value) -> Option<Value> {
        match self {
            Transform::Sync(f) => Some(f(value)),
            Transform::Async(f) => {
                let (tx, rx) = oneshot::channel();
                f(value, Callback { tx });
                rx.await.ok()
            }
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Sync(_) => f.write_str("Transform::Sync"),
            Transform::Async(_) => f.write_str("Transform::Async"),
        }
    }
}

/// Tag a callback-style function so `map` awaits its callback.
pub fn asynchronous<F>(f: F) -> Transform
where
    F: Fn(Value, Callback) + Send + Sync + 'static,
{
    Transform::asynchronous(f)
}

/// Completion handle given to callback-style transforms.
///
/// Consuming `self` makes a second call impossible. It may be moved into another
/// task and called from there.
pub struct Callback {
    tx: oneshot::Sender<Value>,
}

impl Callback {
    pub fn call(self, result: Value) {
        // The receiving stage only goes away if its task was torn down.
        let _ = self.tx.send(result);
    }
}
