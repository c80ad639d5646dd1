// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for operator stages.
//!
//! This module contains message types for logging events related to:
//! * Stage attachment to a source queue
//! * Normal and abnormal stage termination
//! * Routing of `exec` errors

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An operator stage was attached between two queues.
///
/// # Log Level
/// `debug!` - Routine lifecycle event
///
/// # Example
/// ```
/// use queueflow::observability::messages::operator::StageAttached;
///
/// let msg = StageAttached {
///     stage: "filter",
///     source: "#1",
///     destination: "#2",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct StageAttached<'a> {
    pub stage: &'a str,
    pub source: &'a str,
    pub destination: &'a str,
}

impl Display for StageAttached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' attached: {} -> {}",
            self.stage, self.source, self.destination
        )
    }
}

impl StructuredLog for StageAttached<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            source = self.source,
            destination = self.destination,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage",
            span_name = name,
            stage = self.stage,
            source = self.source,
            destination = self.destination,
        )
    }
}

/// A stage drained its source and finished.
///
/// # Log Level
/// `debug!` - Routine lifecycle event
pub struct StageFinished<'a> {
    pub stage: &'a str,
    pub source: &'a str,
    pub processed: usize,
}

impl Display for StageFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' on {} finished after {} values",
            self.stage, self.source, self.processed
        )
    }
}

impl StructuredLog for StageFinished<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            source = self.source,
            processed = self.processed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("stage_finished", span_name = name, stage = self.stage)
    }
}

/// A stage stopped before its source closed, e.g. after a panic or a lost callback.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use queueflow::observability::messages::operator::StageTerminated;
///
/// let msg = StageTerminated {
///     stage: "map",
///     destination: "#7",
///     reason: "transform panicked",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct StageTerminated<'a> {
    pub stage: &'a str,
    pub destination: &'a str,
    pub reason: &'a str,
}

impl Display for StageTerminated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' terminated early ({}); closing {}",
            self.stage, self.reason, self.destination
        )
    }
}

impl StructuredLog for StageTerminated<'_> {
    fn log(&self) {
        tracing::error!(
            stage = self.stage,
            destination = self.destination,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("stage_terminated", span_name = name, stage = self.stage)
    }
}

/// An `exec` failure was pushed onto an error queue.
///
/// # Log Level
/// `debug!` - The error is handled by whoever consumes the error queue
pub struct ErrorRouted<'a> {
    pub stage: &'a str,
    pub error_queue: &'a str,
    pub error: &'a str,
}

impl Display for ErrorRouted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' routed error to '{}': {}",
            self.stage, self.error_queue, self.error
        )
    }
}

impl StructuredLog for ErrorRouted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            error_queue = self.error_queue,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("error_routed", span_name = name, stage = self.stage)
    }
}

/// An `exec` failure had no error queue and was dropped.
///
/// # Log Level
/// `warn!` - Data was lost
pub struct UnroutedErrorDropped<'a> {
    pub stage: &'a str,
    pub error: &'a str,
}

impl Display for UnroutedErrorDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' dropped an error with no error queue configured: {}",
            self.stage, self.error
        )
    }
}

impl StructuredLog for UnroutedErrorDropped<'_> {
    fn log(&self) {
        tracing::warn!(stage = self.stage, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("unrouted_error", span_name = name, stage = self.stage)
    }
}
