// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::config::FlowConfig;
use crate::engine::{lock, Queue};
use crate::errors::{FlowError, FlowResult};
use crate::observability::messages::queue::QueueCreated;
use crate::observability::messages::StructuredLog;

static NEXT_NAMESPACE_ID: AtomicU64 = AtomicU64::new(1);

/// An isolated registry of named queues.
///
/// Within one namespace a name always resolves to the same [`Queue`]; two
/// namespaces never share a queue, even for equal names. Lookups and creations
/// are serialized, so concurrent `get_or_create` calls for one name agree on a
/// single instance.
///
/// Queues refer back to their namespace only weakly, so dropping the last
/// `Namespace` (or [`Flow`](crate::engine::Flow)) handle frees the registry and
/// every named queue nothing else holds.
///
/// # Examples
///
/// ```
/// use queueflow::config::FlowConfig;
/// use queueflow::engine::Namespace;
///
/// let namespace = Namespace::new(FlowConfig::default());
/// assert!(!namespace.exists("results"));
///
/// let results = namespace.get_or_create("results");
/// assert!(namespace.exists("results"));
/// assert_eq!(results, namespace.get_or_create("results"));
/// ```
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<NamespaceInner>,
}

struct NamespaceInner {
    id: u64,
    config: Arc<FlowConfig>,
    queues: Mutex<HashMap<String, Queue>>,
}

/// The part of a namespace every queue carries: its id, the shared config and
/// a weak link back to the registry.
#[derive(Clone)]
pub(crate) struct Scope {
    id: u64,
    config: Arc<FlowConfig>,
    registry: Weak<NamespaceInner>,
}

impl Scope {
    pub(crate) fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub(crate) fn namespace(&self) -> Option<Namespace> {
        self.registry.upgrade().map(|inner| Namespace { inner })
    }

    /// Resolve `name` in the owning namespace.
    ///
    /// Once the namespace is gone no one can look the name up again, so a fresh
    /// queue carrying the name is returned without registering it.
    pub(crate) fn get_or_create(&self, name: &str) -> Queue {
        match self.namespace() {
            Some(namespace) => namespace.get_or_create(name),
            None => self.create(Some(name.to_string()), Vec::new(), false),
        }
    }

    pub(crate) fn anonymous(&self) -> Queue {
        self.create(None, Vec::new(), false)
    }

    pub(crate) fn create(&self, name: Option<String>, values: Vec<Value>, close_on_empty: bool) -> Queue {
        let seeded = values.len();
        let queue = Queue::new(self.clone(), name, values, close_on_empty);
        QueueCreated {
            queue: &queue.label(),
            namespace: self.id,
            seeded,
        }
        .log();
        queue
    }
}

impl Namespace {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            inner: Arc::new(NamespaceInner {
                id: NEXT_NAMESPACE_ID.fetch_add(1, Ordering::Relaxed),
                config: Arc::new(config),
                queues: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn config(&self) -> &FlowConfig {
        &self.inner.config
    }

    pub(crate) fn scope(&self) -> Scope {
        Scope {
            id: self.inner.id,
            config: Arc::clone(&self.inner.config),
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Look up `name`, creating an open queue on first use.
    pub fn get_or_create(&self, name: &str) -> Queue {
        let created = {
            let mut queues = lock(&self.inner.queues);
            if let Some(queue) = queues.get(name) {
                return queue.clone();
            }
            let queue = Queue::new(self.scope(), Some(name.to_string()), Vec::new(), false);
            queues.insert(name.to_string(), queue.clone());
            queue
        };

        QueueCreated {
            queue: name,
            namespace: self.inner.id,
            seeded: 0,
        }
        .log();
        created
    }

    /// True if `name` is bound in this namespace. Never creates a queue.
    pub fn exists(&self, name: &str) -> bool {
        lock(&self.inner.queues).contains_key(name)
    }

    /// Create an unnamed queue. It stays unreachable by name until
    /// [`Queue::as_named`] is called.
    pub fn anonymous(&self) -> Queue {
        self.scope().anonymous()
    }

    pub(crate) fn seeded(&self, values: Vec<Value>, close_on_empty: bool) -> Queue {
        self.scope().create(None, values, close_on_empty)
    }

    /// Names currently bound, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.inner.queues).keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn bind(&self, name: &str, queue: &Queue) -> FlowResult<()> {
        let mut queues = lock(&self.inner.queues);
        match queues.get(name) {
            Some(existing) if existing == queue => Ok(()),
            Some(_) => Err(FlowError::NameTaken {
                name: name.to_string(),
            }),
            None => {
                queues.insert(name.to_string(), queue.clone());
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("id", &self.inner.id)
            .field("queue_names", &self.names())
            .finish()
    }
}
