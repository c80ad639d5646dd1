// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The `exec` stage: call a host function with each value's positional
//! arguments and split results from failures.
//!
//! Failures never stop the stage. They are turned into `[error, result, args]`
//! records and pushed onto the error queue, where `result` is `null` unless a
//! callback-style function reported a partial result alongside its error.

use serde_json::Value;

use crate::config::UnroutedErrors;
use crate::engine::operators::ErrorSink;
use crate::engine::stage::{attach, cooperate, StageGuard};
use crate::engine::{Queue, Scope};
use crate::observability::messages::operator::{ErrorRouted, UnroutedErrorDropped};
use crate::observability::messages::StructuredLog;
use crate::traits::external::ExecOutcome;
use crate::traits::External;
use crate::utils::values::unpack_args;

impl Queue {
    /// Call `external` once per value; successful results flow downstream.
    ///
    /// Array values are spread into positional arguments, anything else is
    /// passed as the single argument.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn exec(&self, external: External, errors: ErrorSink) -> Queue {
        let destination = self.scope().anonymous();
        let error_queue = ErrorTarget::resolve(self.scope(), &errors);
        let source = self.clone();
        let output = destination.clone();
        attach("exec", self, &destination.label(), async move {
            let mut guard = StageGuard::new("exec", &source).output(&output);
            while let Some(value) = source.pull().await {
                let args = unpack_args(value);
                match external.invoke(args.clone()).await {
                    ExecOutcome::Success(Some(result)) => {
                        output.push([result]);
                    }
                    ExecOutcome::Success(None) => {}
                    ExecOutcome::Failure { error, result } => {
                        let record = Value::Array(vec![
                            error,
                            result.unwrap_or(Value::Null),
                            Value::Array(args),
                        ]);
                        error_queue.send(record);
                    }
                }
                guard.processed();
                cooperate().await;
            }
            guard.finish();
        });
        destination
    }
}

enum ErrorTarget {
    Queue(Queue),
    Unrouted(UnroutedErrors),
}

impl ErrorTarget {
    /// Resolve the error queue up front so consumers can find it by name before
    /// the first failure happens.
    fn resolve(scope: &Scope, sink: &ErrorSink) -> Self {
        match sink {
            ErrorSink::Named(name) => ErrorTarget::Queue(scope.get_or_create(name)),
            ErrorSink::Unrouted => ErrorTarget::Unrouted(scope.config().unrouted_errors),
        }
    }

    fn send(&self, record: Value) {
        let error = match record.get(0) {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        match self {
            ErrorTarget::Queue(queue) => {
                ErrorRouted {
                    stage: "exec",
                    error_queue: &queue.label(),
                    error: &error,
                }
                .log();
                queue.push([record]);
            }
            ErrorTarget::Unrouted(UnroutedErrors::Warn) => {
                UnroutedErrorDropped {
                    stage: "exec",
                    error: &error,
                }
                .log();
            }
            ErrorTarget::Unrouted(UnroutedErrors::Drop) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{FlowConfig, UnroutedErrors};
    use crate::engine::{ErrorSink, Flow};
    use crate::traits::External;
    use serde_json::{json, Value};
    use std::time::Duration;

    #[tokio::test]
    async fn test_sync_throw_goes_to_error_queue() {
        let flow = Flow::new();

        let results = flow
            .seed(vec![json!(["foo", "bar"])])
            .exec(
                External::sync(|args| {
                    if args == [json!("foo"), json!("bar")] {
                        Err(json!("baz"))
                    } else {
                        Ok(None)
                    }
                }),
                ErrorSink::named("syncError"),
            )
            .collect()
            .await;

        assert!(results.is_empty());
        let errors = flow.queue("syncError");
        assert_eq!(errors.pull().await, Some(json!(["baz", null, ["foo", "bar"]])));
    }

    #[tokio::test]
    async fn test_sync_results_flow_downstream() {
        let flow = Flow::new();

        let results = flow
            .seed(vec![json!([2, 3]), json!(5)])
            .exec(
                External::sync(|args| {
                    let product: i64 = args.iter().filter_map(Value::as_i64).product();
                    Ok(Some(json!(product)))
                }),
                ErrorSink::Unrouted,
            )
            .collect()
            .await;

        assert_eq!(results, vec![json!(6), json!(5)]);
    }

    #[tokio::test]
    async fn test_callback_convention_splits_results_and_errors() {
        let flow = Flow::new();
        let lengths = External::callback(|args, completion| {
            tokio::spawn(async move {
                match args.first().and_then(Value::as_str) {
                    Some(name) if name.starts_with("missing") => {
                        completion.done(Some(json!(format!("ENOENT: {}", name))), None)
                    }
                    Some(name) => completion.done(None, Some(json!(name.len()))),
                    None => completion.fail(json!("EINVAL")),
                }
            });
        });

        let results = flow
            .seed(vec![json!("abc"), json!("missing.txt"), json!(["hello", "utf8"])])
            .exec(lengths, ErrorSink::from("error"))
            .collect()
            .await;

        assert_eq!(results, vec![json!(3), json!(5)]);
        let errors = flow.queue("error");
        assert_eq!(
            errors.pull().await,
            Some(json!(["ENOENT: missing.txt", null, ["missing.txt"]]))
        );
        assert!(errors.is_empty());
        assert!(!errors.is_closed(), "error queues are shared and stay open");
    }

    #[tokio::test]
    async fn test_error_queue_exists_before_first_failure() {
        let flow = Flow::new();
        flow.queue("input")
            .exec(External::sync(|_| Ok(None)), ErrorSink::named("errors"));

        assert!(flow.exists("errors"));
    }

    #[tokio::test]
    async fn test_unrouted_errors_do_not_stall_the_stage() {
        for policy in [UnroutedErrors::Warn, UnroutedErrors::Drop] {
            let flow = Flow::with_config(FlowConfig {
                unrouted_errors: policy,
                ..FlowConfig::default()
            });

            let results = tokio::time::timeout(
                Duration::from_secs(1),
                flow.seed(vec![json!(1), json!(2)])
                    .exec(
                        External::sync(|args| match args[0].as_i64() {
                            Some(1) => Err(json!("one is not allowed")),
                            _ => Ok(Some(args[0].clone())),
                        }),
                        ErrorSink::default(),
                    )
                    .collect(),
            )
            .await
            .expect("exec stage stalled");

            assert_eq!(results, vec![json!(2)], "policy: {:?}", policy);
        }
    }
}
