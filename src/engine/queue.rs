// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The buffered queue node and its pull protocol.
//!
//! A [`Queue`] holds pushed values in FIFO order until a consumer pulls them.
//! Every value is handed to exactly one consumer. When the buffer is empty a
//! pulling consumer either parks until the next push or, if the queue is
//! closing, attempts the close transition.
//!
//! # Pull protocol
//!
//! ```text
//! pull ──► buffer non-empty ──► dequeue head ──► fire Pull ──► Some(value)
//!      └─► buffer empty ──► fire Empty ─┬─► open: park until push ──► Some(value)
//!                                       └─► closing: run Close handlers
//!                                             ├─► all Proceed: Closed ──► None (every parked consumer too)
//!                                             └─► any Veto: park until push or a later close
//! ```
//!
//! # Examples
//!
//! ```
//! use queueflow::engine::Flow;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let flow = Flow::new();
//! let numbers = flow.queue("numbers");
//! numbers.push([json!(1), json!(2)]).close();
//!
//! assert_eq!(numbers.pull().await, Some(json!(1)));
//! assert_eq!(numbers.pull().await, Some(json!(2)));
//! assert_eq!(numbers.pull().await, None);
//! # }
//! ```

use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::config::FlowConfig;
use crate::engine::{lock, Namespace, Scope};
use crate::errors::{FlowError, FlowResult};
use crate::observability::messages::queue::{
    BufferHighWater, CloseVetoed, PushRejected, QueueAliased, QueueClosed,
};
use crate::observability::messages::StructuredLog;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a queue, named or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(u64);

impl QueueId {
    fn next() -> Self {
        QueueId(NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Open,
    /// No more values are expected; the queue closes once its buffer drains.
    Closing,
    Closed,
}

/// Events a listener can subscribe to with [`Queue::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueEvent {
    /// A value was handed to a consumer.
    Pull,
    /// A consumer found the buffer empty.
    Empty,
    /// The queue is about to close. Any handler returning [`Verdict::Veto`] cancels it.
    Close,
}

/// A listener's answer. Only meaningful for [`QueueEvent::Close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Veto,
}

type Handler = Arc<dyn Fn() -> Verdict + Send + Sync>;

/// A named or anonymous buffered node in the dataflow graph.
///
/// Cloning a `Queue` clones a handle; all clones refer to the same buffer.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    id: QueueId,
    scope: Scope,
    state: Mutex<QueueState>,
}

struct QueueState {
    name: Option<String>,
    buffer: VecDeque<Value>,
    status: QueueStatus,
    close_on_empty: bool,
    close_in_progress: bool,
    waiters: VecDeque<oneshot::Sender<Value>>,
    listeners: Vec<(QueueEvent, Handler)>,
    consumers: Vec<&'static str>,
    above_high_water: bool,
}

enum PullStep {
    Ready(Value),
    Wait(oneshot::Receiver<Value>),
    Close,
}

impl Queue {
    pub(crate) fn new(
        scope: Scope,
        name: Option<String>,
        seed: Vec<Value>,
        close_on_empty: bool,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                id: QueueId::next(),
                scope,
                state: Mutex::new(QueueState {
                    name,
                    buffer: seed.into(),
                    status: QueueStatus::Open,
                    close_on_empty,
                    close_in_progress: false,
                    waiters: VecDeque::new(),
                    listeners: Vec::new(),
                    consumers: Vec::new(),
                    above_high_water: false,
                }),
            }),
        }
    }

    pub fn id(&self) -> QueueId {
        self.inner.id
    }

    pub fn name(&self) -> Option<String> {
        lock(&self.inner.state).name.clone()
    }

    /// The name if there is one, otherwise the `#id` form used in logs.
    pub fn label(&self) -> String {
        self.name().unwrap_or_else(|| self.inner.id.to_string())
    }

    /// The namespace this queue was created in, while it is still alive.
    pub fn namespace(&self) -> Option<Namespace> {
        self.inner.scope.namespace()
    }

    pub fn config(&self) -> &FlowConfig {
        self.inner.scope.config()
    }

    pub(crate) fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    pub fn status(&self) -> QueueStatus {
        lock(&self.inner.state).status
    }

    pub fn is_closed(&self) -> bool {
        self.status() == QueueStatus::Closed
    }

    /// Number of buffered values not yet pulled.
    pub fn len(&self) -> usize {
        lock(&self.inner.state).buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels of the operator stages attached to this queue, in attachment order.
    pub fn consumers(&self) -> Vec<&'static str> {
        lock(&self.inner.state).consumers.clone()
    }

    /// Request the next value.
    ///
    /// Resolves to `None` once the queue has closed; every consumer, including ones
    /// parked on an empty buffer, receives that close notification.
    pub async fn pull(&self) -> Option<Value> {
        let mut announced_empty = false;
        loop {
            let step = {
                let mut state = lock(&self.inner.state);
                if let Some(value) = state.buffer.pop_front() {
                    PullStep::Ready(value)
                } else if state.status == QueueStatus::Closed {
                    return None;
                } else if state.status == QueueStatus::Closing || state.close_on_empty {
                    PullStep::Close
                } else {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push_back(tx);
                    PullStep::Wait(rx)
                }
            };

            let rx = match step {
                PullStep::Ready(value) => {
                    self.emit(QueueEvent::Pull);
                    return Some(value);
                }
                PullStep::Wait(rx) => {
                    if !announced_empty {
                        self.emit(QueueEvent::Empty);
                    }
                    rx
                }
                PullStep::Close => {
                    if !announced_empty {
                        announced_empty = true;
                        self.emit(QueueEvent::Empty);
                        // An Empty listener may have refilled the buffer.
                        continue;
                    }
                    if self.try_close() {
                        return None;
                    }
                    let mut state = lock(&self.inner.state);
                    if state.status == QueueStatus::Closed {
                        return None;
                    }
                    if !state.buffer.is_empty() {
                        continue;
                    }
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push_back(tx);
                    rx
                }
            };

            return match rx.await {
                Ok(value) => {
                    self.emit(QueueEvent::Pull);
                    Some(value)
                }
                Err(_) => None,
            };
        }
    }

    /// Alias of [`pull`](Self::pull) that reads better in glue code.
    pub async fn next_value(&self) -> Option<Value> {
        self.pull().await
    }

    /// Append values in order, handing them to parked consumers first.
    ///
    /// Values pushed into a closed queue are discarded with a warning; use
    /// [`try_push`](Self::try_push) to observe that as an error.
    pub fn push<I>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = Value>,
    {
        // try_push already logged the rejection.
        let _ = self.try_push(values);
        self
    }

    pub fn try_push<I>(&self, values: I) -> FlowResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let limit = self.inner.scope.config().max_buffered;
        let mut high_water = None;
        {
            let mut state = lock(&self.inner.state);
            if state.status == QueueStatus::Closed {
                let rejected = values.into_iter().count();
                let queue = label_of(&state, self.inner.id);
                drop(state);
                PushRejected {
                    queue: &queue,
                    values: rejected,
                }
                .log();
                return Err(FlowError::QueueClosed { queue });
            }

            'values: for mut value in values {
                while let Some(waiter) = state.waiters.pop_front() {
                    match waiter.send(value) {
                        Ok(()) => continue 'values,
                        // That consumer stopped waiting; offer the value to the next one.
                        Err(returned) => value = returned,
                    }
                }
                state.buffer.push_back(value);
            }

            if let Some(limit) = limit {
                let buffered = state.buffer.len();
                if buffered > limit && !state.above_high_water {
                    state.above_high_water = true;
                    high_water = Some((label_of(&state, self.inner.id), buffered, limit));
                } else if buffered <= limit {
                    state.above_high_water = false;
                }
            }
        }

        if let Some((queue, buffered, limit)) = high_water {
            BufferHighWater {
                queue: &queue,
                buffered,
                limit,
            }
            .log();
        }
        Ok(())
    }

    /// Declare that no more values will be pushed.
    ///
    /// If the buffer is already empty the close transition is attempted right away.
    pub fn close(&self) -> &Self {
        let drained = {
            let mut state = lock(&self.inner.state);
            if state.status == QueueStatus::Closed {
                return self;
            }
            state.status = QueueStatus::Closing;
            state.buffer.is_empty()
        };
        if drained {
            self.try_close();
        }
        self
    }

    /// Close once a consumer finds the buffer empty.
    ///
    /// Named queues never do this on their own, since unrelated code may still
    /// push into them. A consumer already parked on the empty buffer triggers the
    /// close attempt immediately.
    pub fn close_on_empty(&self) -> &Self {
        let parked = {
            let mut state = lock(&self.inner.state);
            state.close_on_empty = true;
            state.buffer.is_empty() && !state.waiters.is_empty()
        };
        if parked {
            self.try_close();
        }
        self
    }

    /// Register a listener. Handlers run in registration order.
    pub fn on<F>(&self, event: QueueEvent, handler: F) -> &Self
    where
        F: Fn() -> Verdict + Send + Sync + 'static,
    {
        lock(&self.inner.state)
            .listeners
            .push((event, Arc::new(handler)));
        self
    }

    /// Make this queue reachable by `name` in its namespace.
    pub fn as_named(&self, name: &str) -> FlowResult<&Self> {
        let namespace = self
            .inner
            .scope
            .namespace()
            .ok_or_else(|| FlowError::NamespaceDropped {
                name: name.to_string(),
            })?;
        namespace.bind(name, self)?;
        let previous = {
            let mut state = lock(&self.inner.state);
            let previous = label_of(&state, self.inner.id);
            state.name = Some(name.to_string());
            previous
        };
        QueueAliased {
            queue: &previous,
            name,
        }
        .log();
        Ok(self)
    }

    pub(crate) fn register_consumer(&self, stage: &'static str) {
        lock(&self.inner.state).consumers.push(stage);
    }

    /// Run the listeners for `event`; returns true if any of them vetoed.
    fn emit(&self, event: QueueEvent) -> bool {
        let handlers: Vec<Handler> = lock(&self.inner.state)
            .listeners
            .iter()
            .filter(|(kind, _)| *kind == event)
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        let mut vetoed = false;
        for handler in handlers {
            if handler() == Verdict::Veto {
                vetoed = true;
            }
        }
        vetoed
    }

    /// Attempt the `Closing -> Closed` transition.
    ///
    /// Returns true once the queue is closed. Returns false if the buffer is not
    /// empty, another consumer is mid-attempt, or a Close listener vetoed.
    fn try_close(&self) -> bool {
        {
            let mut state = lock(&self.inner.state);
            if state.status == QueueStatus::Closed {
                return true;
            }
            if !state.buffer.is_empty() || state.close_in_progress {
                return false;
            }
            state.close_in_progress = true;
        }

        let vetoed = self.emit(QueueEvent::Close);

        let (waiters, queue) = {
            let mut state = lock(&self.inner.state);
            state.close_in_progress = false;
            let queue = label_of(&state, self.inner.id);
            if vetoed || !state.buffer.is_empty() {
                drop(state);
                if vetoed {
                    CloseVetoed { queue: &queue }.log();
                }
                return false;
            }
            state.status = QueueStatus::Closed;
            (std::mem::take(&mut state.waiters), queue)
        };

        QueueClosed {
            queue: &queue,
            consumers: waiters.len(),
        }
        .log();
        // Dropping the senders resolves every parked pull with the close notification.
        drop(waiters);
        true
    }
}

fn label_of(state: &QueueState, id: QueueId) -> String {
    state.name.clone().unwrap_or_else(|| id.to_string())
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Queue")
            .field("id", &self.inner.id)
            .field("name", &state.name)
            .field("status", &state.status)
            .field("buffered", &state.buffer.len())
            .field("consumers", &state.consumers)
            .finish()
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Queue {}
