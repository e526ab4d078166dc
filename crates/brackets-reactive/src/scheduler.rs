//! Pending-write set and the cooperative task queue.

use crate::computed::ComputedValue;
use crate::persisted::PersistedValue;
use indexmap::IndexSet;
use std::collections::VecDeque;

/// Deferred work, run by `Runtime::tick`.
#[derive(Debug)]
pub(crate) enum Task {
    /// Render every subscriber of the pending writes, then recompute and
    /// run observers.
    Flush,
    /// First deferred recomputation of a newly attached computed value.
    Recompute(ComputedValue),
    /// One-time load of a newly attached persisted value.
    Hydrate(PersistedValue),
}

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    pending: IndexSet<(String, String)>,
    tasks: VecDeque<Task>,
}

impl Scheduler {
    /// Record a write to `state.key`. The first write into an empty pending
    /// set queues a flush; returns whether it did.
    pub(crate) fn enqueue(&mut self, state: &str, key: &str) -> bool {
        let first = self.pending.is_empty();
        self.pending.insert((state.to_string(), key.to_string()));
        if first {
            self.tasks.push_back(Task::Flush);
        }
        first
    }

    pub(crate) fn schedule(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    pub(crate) fn take_pending(&mut self) -> IndexSet<(String, String)> {
        std::mem::take(&mut self.pending)
    }

    /// Everything queued so far. Tasks queued while these run wait for the
    /// next round.
    pub(crate) fn take_round(&mut self) -> Vec<Task> {
        self.tasks.drain(..).collect()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.tasks.clear();
    }
}
