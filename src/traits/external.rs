// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Calling conventions for host functions run by `exec`.
//!
//! Two shapes are supported:
//! * [`External::Sync`] returns a value (or nothing) and reports failure with `Err`,
//!   which plays the role of a thrown exception. Panics are caught and treated the same.
//! * [`External::Callback`] receives its positional arguments plus a trailing
//!   [`Completion`] and reports `(err, result)` through it, first argument being the error.

use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::config::consts::COMPLETION_DROPPED;
use crate::utils::values::truthy;

type SyncExternal = dyn Fn(&[Value]) -> Result<Option<Value>, Value> + Send + Sync;
type CallbackExternal = dyn Fn(Vec<Value>, Completion) + Send + Sync;

/// A host function invoked by `exec` with unpacked positional arguments.
#[derive(Clone)]
pub enum External {
    Sync(Arc<SyncExternal>),
    Callback(Arc<CallbackExternal>),
}

impl External {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>, Value> + Send + Sync + 'static,
    {
        External::Sync(Arc::new(f))
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>, Completion) + Send + Sync + 'static,
    {
        External::Callback(Arc::new(f))
    }

    pub(crate) async fn invoke(&self, args: Vec<Value>) -> ExecOutcome {
        match self {
            External::Sync(f) => match catch_unwind(AssertUnwindSafe(|| f(&args))) {
                Ok(Ok(result)) => ExecOutcome::Success(result),
                Ok(Err(error)) => ExecOutcome::Failure { error, result: None },
                Err(panic) => ExecOutcome::Failure {
                    error: Value::String(panic_message(panic.as_ref())),
                    result: None,
                },
            },
            External::Callback(f) => {
                let (tx, rx) = oneshot::channel();
                f(args, Completion { tx });
                match rx.await {
                    Ok((Some(error), result)) if truthy(&error) => {
                        ExecOutcome::Failure { error, result }
                    }
                    Ok((_, result)) => ExecOutcome::Success(Some(result.unwrap_or(Value::Null))),
                    Err(_) => ExecOutcome::Failure {
                        error: Value::String(COMPLETION_DROPPED.to_string()),
                        result: None,
                    },
                }
            }
        }
    }
}

impl fmt::Debug for External {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            External::Sync(_) => f.write_str("External::Sync"),
            External::Callback(_) => f.write_str("External::Callback"),
        }
    }
}

/// Trailing `(err, result)` callback handed to [`External::Callback`] functions.
pub struct Completion {
    tx: oneshot::Sender<(Option<Value>, Option<Value>)>,
}

impl Completion {
    /// Report in node style: a truthy `err` is a failure, anything else a success.
    pub fn done(self, err: Option<Value>, result: Option<Value>) {
        let _ = self.tx.send((err, result));
    }

    pub fn ok(self, result: Value) {
        self.done(None, Some(result));
    }

    pub fn fail(self, err: Value) {
        self.done(Some(err), None);
    }
}

/// What one `exec` invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExecOutcome {
    Success(Option<Value>),
    Failure { error: Value, result: Option<Value> },
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "external function panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_external_outcomes() {
        let f = External::sync(|args| match args.first() {
            Some(Value::String(s)) if s == "boom" => Err(json!("baz")),
            Some(v) => Ok(Some(v.clone())),
            None => Ok(None),
        });

        assert_eq!(f.invoke(vec![json!(1)]).await, ExecOutcome::Success(Some(json!(1))));
        assert_eq!(f.invoke(vec![]).await, ExecOutcome::Success(None));
        assert_eq!(
            f.invoke(vec![json!("boom")]).await,
            ExecOutcome::Failure { error: json!("baz"), result: None }
        );
    }

    #[tokio::test]
    async fn test_sync_external_panic_is_captured() {
        let f = External::sync(|_| panic!("disk on fire"));

        assert_eq!(
            f.invoke(vec![]).await,
            ExecOutcome::Failure { error: json!("disk on fire"), result: None }
        );
    }

    #[tokio::test]
    async fn test_callback_external_falsy_error_is_success() {
        let f = External::callback(|args, completion| {
            completion.done(Some(json!(null)), Some(json!(args.len())));
        });

        assert_eq!(f.invoke(vec![json!("a"), json!("b")]).await, ExecOutcome::Success(Some(json!(2))));
    }

    #[tokio::test]
    async fn test_callback_external_error_keeps_partial_result() {
        let f = External::callback(|_, completion| {
            completion.done(Some(json!("ENOENT")), Some(json!("partial")));
        });

        assert_eq!(
            f.invoke(vec![]).await,
            ExecOutcome::Failure { error: json!("ENOENT"), result: Some(json!("partial")) }
        );
    }

    #[tokio::test]
    async fn test_dropped_completion_is_failure() {
        let f = External::callback(|_, completion| drop(completion));

        assert_eq!(
            f.invoke(vec![]).await,
            ExecOutcome::Failure { error: json!(COMPLETION_DROPPED), result: None }
        );
    }
}
