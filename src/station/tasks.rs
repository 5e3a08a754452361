//! Bookkeeping for in-flight effect tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::effect::Cancellation;

/// Identifier of one effect invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub(crate) struct TaskHandle {
    cancellation: Cancellation,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) fn new(cancellation: Cancellation, join: JoinHandle<()>) -> Self {
        Self { cancellation, join }
    }
}

/// In-flight effect tasks keyed by [`TaskId`].
///
/// The count is shared so handles can read it without going through the
/// station's command queue.
pub(crate) struct TaskRegistry {
    tasks: HashMap<TaskId, TaskHandle>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskRegistry {
    pub(crate) fn new(in_flight: Arc<AtomicUsize>) -> Self {
        Self {
            tasks: HashMap::new(),
            in_flight,
        }
    }

    pub(crate) fn insert(&mut self, id: TaskId, handle: TaskHandle) {
        self.tasks.insert(id, handle);
        self.sync_count();
    }

    /// Drop a task that ran to completion. Its `Pour` stops forwarding.
    pub(crate) fn finish(&mut self, id: TaskId) -> bool {
        let Some(handle) = self.tasks.remove(&id) else {
            return false;
        };
        handle.cancellation.cancel();
        self.sync_count();
        true
    }

    /// Cancel and abort every task. Returns how many were in flight.
    pub(crate) fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        for (id, handle) in self.tasks.drain() {
            handle.cancellation.cancel();
            handle.join.abort();
            tracing::trace!(task = %id, "effect task cancelled");
        }
        self.sync_count();
        count
    }

    fn sync_count(&self) {
        self.in_flight.store(self.tasks.len(), Ordering::SeqCst);
    }
}
