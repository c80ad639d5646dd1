// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end pipelines spanning several operators and namespaces.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::config::{FlowConfig, UnroutedErrors};
use crate::engine::{ns, ErrorSink, Flow, QueueEvent, QueueStatus, Sink, Verdict};
use crate::traits::{asynchronous, External, Transform};
use crate::utils::values::tuple;

const PATIENCE: Duration = Duration::from_secs(2);

fn numbers(values: impl IntoIterator<Item = i64>) -> Vec<Value> {
    values.into_iter().map(|n| json!(n)).collect()
}

fn add(acc: Value, v: Value) -> Value {
    json!(acc.as_i64().unwrap_or(0) + v.as_i64().unwrap_or(0))
}

/// Reads a directory into a sorted list of full paths, callback style.
fn readdir() -> External {
    External::callback(|args, completion| {
        let dir = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
        match std::fs::read_dir(&dir) {
            Ok(entries) => {
                let mut paths: Vec<String> = entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path().display().to_string())
                    .collect();
                paths.sort();
                completion.ok(json!(paths));
            }
            Err(e) => completion.fail(json!(e.to_string())),
        }
    })
}

/// Reads a file as UTF-8, callback style, from a spawned task.
fn read_file() -> External {
    External::callback(|args, completion| {
        tokio::spawn(async move {
            let path = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => completion.ok(json!(contents)),
                Err(e) => completion.fail(json!(e.to_string())),
            }
        });
    })
}

/// Seed, map and collect: the basic round trip.
#[tokio::test]
async fn test_seed_map_to_array() {
    let flow = ns();

    let doubled = flow
        .seed(numbers([1, 2, 3]))
        .map(Transform::sync(|v| json!(v.as_i64().unwrap_or(0) * 2)))
        .collect()
        .await;

    assert_eq!(doubled, numbers([2, 4, 6]));
}

/// Filtering mixed values keeps only the numbers, in order.
#[tokio::test]
async fn test_filter_numbers_out_of_mixed_values() {
    let flow = ns();

    let kept = flow
        .seed(vec![json!(1), json!(2), json!("x"), json!(99), json!(100)])
        .filter(Value::is_number)
        .collect()
        .await;

    assert_eq!(kept, numbers([1, 2, 99, 100]));
}

/// Reduce starts folding before the upstream map has transformed every value,
/// whatever the flow is configured with.
#[tokio::test]
async fn test_reduce_streams_behind_map() {
    let configs = vec![
        ("default", FlowConfig::default()),
        (
            "drop unrouted errors",
            FlowConfig {
                unrouted_errors: UnroutedErrors::Drop,
                ..FlowConfig::default()
            },
        ),
        (
            "tight buffer limit",
            FlowConfig {
                max_buffered: Some(1),
                ..FlowConfig::default()
            },
        ),
        (
            "quiet logging",
            FlowConfig {
                log_level: "error".to_string(),
                ..FlowConfig::default()
            },
        ),
    ];

    for (name, config) in configs {
        let flow = Flow::with_config(config);
        let total = 20;
        let mapped = Arc::new(AtomicUsize::new(0));
        let first_seen_at = Arc::new(Mutex::new(None));

        let (tx, rx) = oneshot::channel();
        {
            let counter = Arc::clone(&mapped);
            let mapped_so_far = Arc::clone(&mapped);
            let first_seen_at = Arc::clone(&first_seen_at);
            flow.seed(numbers(0..total as i64))
                .map(Transform::sync(move |v| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    v
                }))
                .reduce(
                    move |acc, v| {
                        first_seen_at
                            .lock()
                            .unwrap()
                            .get_or_insert(mapped_so_far.load(Ordering::SeqCst));
                        add(acc, v)
                    },
                    Sink::callback(move |sum| {
                        let _ = tx.send(sum);
                    }),
                    json!(0),
                );
        }

        let sum = tokio::time::timeout(PATIENCE, rx).await.unwrap().unwrap();
        assert_eq!(sum, json!((0..total as i64).sum::<i64>()), "config: {}", name);

        let first = (*first_seen_at.lock().unwrap()).expect("reduce never ran");
        assert!(
            first < 10,
            "config {}: reduce only started after {} of {} values were mapped",
            name,
            first,
            total
        );
    }
}

/// Async transforms finishing out of order still emit in source order.
#[tokio::test]
async fn test_async_map_keeps_order_under_uneven_latency() {
    let flow = ns();

    let slow_square = asynchronous(|v, done| {
        tokio::spawn(async move {
            let n = v.as_i64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis((5 - n as u64) * 2)).await;
            done.call(json!(n * n));
        });
    });

    let squares = flow.seed(numbers([1, 2, 3, 4])).map(slow_square).collect().await;

    assert_eq!(squares, numbers([1, 4, 9, 16]));
}

/// A pipeline output given a name can be consumed from anywhere by that name.
#[tokio::test]
async fn test_as_named_output_is_reachable_by_name() {
    let flow = ns();

    flow.seed(numbers([1, 2, 3]))
        .map(Transform::sync(|v| json!(v.as_i64().unwrap_or(0) + 10)))
        .as_named("shifted")
        .expect("name is free");

    assert!(flow.exists("shifted"));
    assert_eq!(flow.queue("shifted").collect().await, numbers([11, 12, 13]));
}

/// A consumer attached after its producer finished still drains the named queue.
#[tokio::test]
async fn test_late_consumer_drains_named_queue() {
    let flow = ns();
    let late = flow.seed(numbers([1, 2, 3])).chain("late");

    tokio::time::timeout(PATIENCE, async {
        while late.status() == QueueStatus::Open {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("producer never finished");

    assert_eq!(late.status(), QueueStatus::Closing);
    assert_eq!(flow.queue("late").collect().await, numbers([1, 2, 3]));
    assert!(late.is_closed());
}

/// Work pushed into a named queue by hand is consumed, then released by close_on_empty.
#[tokio::test]
async fn test_push_then_close_on_empty_releases_consumer() {
    let flow = ns();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let jobs = flow.queue("jobs");
    let consumer = {
        let seen = Arc::clone(&seen);
        jobs.for_each(move |v| seen.lock().unwrap().push(v))
    };

    jobs.push(numbers([7, 8]));
    jobs.push([json!(9)]).close_on_empty();

    tokio::time::timeout(PATIENCE, consumer)
        .await
        .expect("consumer never released")
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), numbers([7, 8, 9]));
    assert!(jobs.is_closed());
}

/// A close veto holds back terminal results until the veto is lifted.
#[tokio::test]
async fn test_close_veto_suppresses_terminal_result() {
    let flow = ns();
    let allow_close = Arc::new(AtomicBool::new(false));
    let close_attempts = Arc::new(AtomicUsize::new(0));

    let input = flow.queue("input");
    {
        let allow_close = Arc::clone(&allow_close);
        let close_attempts = Arc::clone(&close_attempts);
        input.on(QueueEvent::Close, move || {
            close_attempts.fetch_add(1, Ordering::SeqCst);
            if allow_close.load(Ordering::SeqCst) {
                Verdict::Proceed
            } else {
                Verdict::Veto
            }
        });
    }

    let (tx, mut rx) = oneshot::channel();
    input.to_array(Sink::callback(move |all| {
        let _ = tx.send(all);
    }));

    input.push(numbers([1, 2])).close();

    let held = tokio::time::timeout(Duration::from_millis(50), &mut rx).await;
    assert!(held.is_err(), "result delivered despite the veto");
    assert!(close_attempts.load(Ordering::SeqCst) >= 1);

    allow_close.store(true, Ordering::SeqCst);
    input.push([json!(3)]).close();

    let all = tokio::time::timeout(PATIENCE, rx).await.unwrap().unwrap();
    assert_eq!(all, json!([1, 2, 3]));
}

/// Directory listing, flatten, file reads and a fold: the classic concatenation pipeline.
#[tokio::test]
async fn test_concatenate_files_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in [("a.txt", "alpha\n"), ("b.txt", "beta\n"), ("c.txt", "gamma\n")] {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    let missing = dir.path().join("missing").display().to_string();

    let flow = ns();
    let (tx, rx) = oneshot::channel();
    flow.seed(vec![json!(dir.path().display().to_string()), json!(missing.clone())])
        .exec(readdir(), ErrorSink::named("error"))
        .flatten()
        .exec(read_file(), ErrorSink::named("error"))
        .reduce(
            |acc, v| json!(format!("{}{}", acc.as_str().unwrap_or(""), v.as_str().unwrap_or(""))),
            Sink::callback(move |all| {
                let _ = tx.send(all);
            }),
            json!(""),
        );

    let contents = tokio::time::timeout(PATIENCE, rx).await.unwrap().unwrap();
    assert_eq!(contents, json!("alpha\nbeta\ngamma\n"));

    let errors = flow.queue("error");
    let record = errors.pull().await.unwrap();
    assert_eq!(record[1], Value::Null);
    assert_eq!(record[2], json!([missing]));
    assert!(errors.is_empty(), "only the missing directory should fail");
}

/// Branch fans out by key, and each branch keeps processing independently.
#[tokio::test]
async fn test_branch_then_reduce_each_partition() {
    let flow = ns();
    let parity = |v: &Value| {
        if v.as_i64().unwrap_or(0) % 2 == 0 {
            "even".to_string()
        } else {
            "odd".to_string()
        }
    };

    let even = flow.queue("even").reduce(add, Sink::named("even_sum"), json!(0));
    let odd = flow.queue("odd").reduce(add, Sink::named("odd_sum"), json!(0));
    flow.seed(numbers(1..=10)).branch(parity);

    assert_eq!(even.collect().await, numbers([30]));
    assert_eq!(odd.collect().await, numbers([25]));
}

/// The same name in two namespaces refers to two independent queues.
#[tokio::test]
async fn test_namespaces_do_not_share_named_queues() {
    let left = ns();
    let right = left.ns();

    left.seed(numbers([1, 2])).chain("shared");
    right.seed(numbers([3])).chain("shared");

    assert_ne!(left.queue("shared"), right.queue("shared"));
    assert_eq!(left.queue("shared").collect().await, numbers([1, 2]));
    assert_eq!(right.queue("shared").collect().await, numbers([3]));
    assert!(!Flow::new().exists("shared"));
}

/// Objects become `[key, value]` pairs that flow through ordinary operators.
#[tokio::test]
async fn test_tuple_pairs_through_pipeline() {
    let flow = ns();
    let ages = json!({"ann": 31, "bob": 17, "cy": 45});

    let adults = flow
        .seed(tuple(ages.as_object().unwrap()))
        .filter(|pair| pair[1].as_i64().unwrap_or(0) >= 18)
        .map(Transform::sync(|pair| pair[0].clone()))
        .collect()
        .await;

    assert_eq!(adults, vec![json!("ann"), json!("cy")]);
}

/// Short-circuiting predicates stop pulling at the deciding value.
#[tokio::test]
async fn test_every_stops_pulling_at_first_failure() {
    let flow = ns();
    let pulls = Arc::new(AtomicUsize::new(0));

    let source = flow.seed(vec![json!(2), json!(4), json!(5), json!(6), json!(8)]);
    {
        let pulls = Arc::clone(&pulls);
        source.on(QueueEvent::Pull, move || {
            pulls.fetch_add(1, Ordering::SeqCst);
            Verdict::Proceed
        });
    }

    let verdict = source
        .every(|v| v.as_i64().unwrap_or(1) % 2 == 0, Sink::Anonymous)
        .collect()
        .await;

    assert_eq!(verdict, vec![json!(false)]);
    assert_eq!(pulls.load(Ordering::SeqCst), 3);
}
