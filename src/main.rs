// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::env;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use queueflow::config::{load_and_validate_config, FlowConfig};
use queueflow::{ErrorSink, External, Flow, Sink};

const ERROR_QUEUE: &str = "error";

/// Command line: `queueflow [--config <file.yaml|file.toml>] <directory>`
struct Args {
    config: Option<String>,
    directory: String,
}

fn parse_args() -> Result<Args> {
    let mut config = None;
    let mut directory = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config = Some(args.next().context("--config needs a file path")?);
            }
            _ if directory.is_none() => directory = Some(arg),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }
    match directory {
        Some(directory) => Ok(Args { config, directory }),
        None => bail!("Usage: queueflow [--config <file.yaml|file.toml>] <directory>"),
    }
}

/// List a directory synchronously; a failure is reported as a thrown error.
fn readdir() -> External {
    External::sync(|args| {
        let dir = args.first().and_then(Value::as_str).unwrap_or(".");
        let entries = std::fs::read_dir(dir).map_err(|e| json!(format!("{}: {}", dir, e)))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| json!(e.to_string()))?;
            if entry.path().is_file() {
                paths.push(json!(entry.path().display().to_string()));
            }
        }
        paths.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        Ok(Some(Value::Array(paths)))
    })
}

/// Read a file on a Tokio task and report `(err, contents)` through the completion.
fn read_file() -> External {
    External::callback(|args, completion| {
        tokio::spawn(async move {
            let path = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
            match tokio::fs::read(&path).await {
                Ok(bytes) => completion.ok(json!({
                    "path": path,
                    "text": String::from_utf8_lossy(&bytes),
                    "bytes": bytes.len(),
                })),
                Err(e) => completion.fail(json!(format!("{}: {}", path, e))),
            }
        });
    })
}

fn init_tracing(config: &FlowConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => FlowConfig::default(),
    };
    init_tracing(&config);

    println!("🚀 queueflow directory concatenation");
    println!("Directory: {}", args.directory);
    println!();

    let start_time = Instant::now();
    let flow = Flow::with_config(config);

    let (tx, rx) = oneshot::channel();
    flow.seed([json!(args.directory)])
        .exec(readdir(), ErrorSink::named(ERROR_QUEUE))
        .flatten()
        .exec(read_file(), ErrorSink::named(ERROR_QUEUE))
        .each(|file| {
            println!(
                "  📄 {} ({} bytes)",
                file["path"].as_str().unwrap_or_default(),
                file["bytes"]
            );
        })
        .reduce(
            |acc, file| {
                json!({
                    "files": acc["files"].as_u64().unwrap_or(0) + 1,
                    "bytes": acc["bytes"].as_u64().unwrap_or(0) + file["bytes"].as_u64().unwrap_or(0),
                    "lines": acc["lines"].as_u64().unwrap_or(0)
                        + file["text"].as_str().map_or(0, |text| text.lines().count() as u64),
                })
            },
            Sink::callback(move |summary| {
                let _ = tx.send(summary);
            }),
            json!({"files": 0, "bytes": 0, "lines": 0}),
        );

    let summary = rx.await.context("pipeline ended without a summary")?;
    let elapsed = start_time.elapsed();

    // Every exec stage has drained by now, so the error queue holds all failures.
    let errors = flow.queue(ERROR_QUEUE);
    let mut failures = 0;
    while !errors.is_empty() {
        if let Some(record) = errors.pull().await {
            failures += 1;
            println!("  ❌ {}", record[0].as_str().unwrap_or_default());
        }
    }

    println!();
    println!("📊 Summary");
    println!("   Files:    {}", summary["files"]);
    println!("   Bytes:    {}", summary["bytes"]);
    println!("   Lines:    {}", summary["lines"]);
    println!("   Failures: {}", failures);
    println!("   Elapsed:  {:?}", elapsed);

    Ok(())
}
