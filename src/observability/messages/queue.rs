// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for queue lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Queue creation in a namespace
//! * Binding anonymous queues to names
//! * Close transitions, including vetoed ones
//! * Pushes rejected by closed queues and buffer growth warnings

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A queue was created in a namespace.
///
/// # Log Level
/// `debug!` - Routine lifecycle event
///
/// # Example
/// ```
/// use queueflow::observability::messages::queue::QueueCreated;
///
/// let msg = QueueCreated {
///     queue: "big",
///     namespace: 1,
///     seeded: 0,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct QueueCreated<'a> {
    pub queue: &'a str,
    pub namespace: u64,
    pub seeded: usize,
}

impl Display for QueueCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Queue '{}' created in namespace {} with {} seeded values",
            self.queue, self.namespace, self.seeded
        )
    }
}

impl StructuredLog for QueueCreated<'_> {
    fn log(&self) {
        tracing::debug!(
            queue = self.queue,
            namespace = self.namespace,
            seeded = self.seeded,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "queue_created",
            span_name = name,
            queue = self.queue,
            namespace = self.namespace,
        )
    }
}

/// An anonymous queue was registered under a name.
///
/// # Log Level
/// `debug!` - Routine lifecycle event
pub struct QueueAliased<'a> {
    pub queue: &'a str,
    pub name: &'a str,
}

impl Display for QueueAliased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Queue '{}' is now reachable as '{}'", self.queue, self.name)
    }
}

impl StructuredLog for QueueAliased<'_> {
    fn log(&self) {
        tracing::debug!(queue = self.queue, alias = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("queue_aliased", span_name = name, queue = self.queue, alias = self.name)
    }
}

/// A queue completed its close transition.
///
/// # Log Level
/// `debug!` - Routine lifecycle event
///
/// # Example
/// ```
/// use queueflow::observability::messages::queue::QueueClosed;
///
/// let msg = QueueClosed {
///     queue: "results",
///     consumers: 1,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct QueueClosed<'a> {
    pub queue: &'a str,
    pub consumers: usize,
}

impl Display for QueueClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Queue '{}' closed, notifying {} pending consumers",
            self.queue, self.consumers
        )
    }
}

impl StructuredLog for QueueClosed<'_> {
    fn log(&self) {
        tracing::debug!(queue = self.queue, consumers = self.consumers, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("queue_closed", span_name = name, queue = self.queue)
    }
}

/// A close handler vetoed the close transition.
///
/// # Log Level
/// `debug!` - Expected when listeners hold a queue open
pub struct CloseVetoed<'a> {
    pub queue: &'a str,
}

impl Display for CloseVetoed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Close of queue '{}' vetoed by a listener", self.queue)
    }
}

impl StructuredLog for CloseVetoed<'_> {
    fn log(&self) {
        tracing::debug!(queue = self.queue, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("close_vetoed", span_name = name, queue = self.queue)
    }
}

/// A value was pushed into a closed queue and discarded.
///
/// # Log Level
/// `warn!` - Data was lost
pub struct PushRejected<'a> {
    pub queue: &'a str,
    pub values: usize,
}

impl Display for PushRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Queue '{}' is closed: discarded {} pushed values",
            self.queue, self.values
        )
    }
}

impl StructuredLog for PushRejected<'_> {
    fn log(&self) {
        tracing::warn!(queue = self.queue, values = self.values, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("push_rejected", span_name = name, queue = self.queue)
    }
}

/// A queue buffer grew past the configured soft limit.
///
/// # Log Level
/// `warn!` - Consumers are falling behind
pub struct BufferHighWater<'a> {
    pub queue: &'a str,
    pub buffered: usize,
    pub limit: usize,
}

impl Display for BufferHighWater<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Queue '{}' holds {} buffered values, above the limit of {}",
            self.queue, self.buffered, self.limit
        )
    }
}

impl StructuredLog for BufferHighWater<'_> {
    fn log(&self) {
        tracing::warn!(
            queue = self.queue,
            buffered = self.buffered,
            limit = self.limit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "buffer_high_water",
            span_name = name,
            queue = self.queue,
            limit = self.limit,
        )
    }
}
