//! # Debounce Scheduler
//!
//! Keyed, cancellable one-shot tasks. Scheduling a key that already has a
//! pending task replaces it, so a burst of schedules within the window
//! fires once, at the last due time, with the last (or merged) payload.
//!
//! Nothing runs in the background: owners call [`Debouncer::poll_due`]
//! with the current time and act on what comes back.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

/// A pending task
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTask<P> {
    pub key: String,
    pub due: DateTime<Utc>,
    pub payload: P,
    /// Schedules folded into this task, including the first
    pub coalesced: u32,
}

/// Keyed debounce timer
#[derive(Debug)]
pub struct Debouncer<P> {
    window: Duration,
    pending: BTreeMap<String, PendingTask<P>>,
}

impl<P> Debouncer<P> {
    /// Create a debouncer with the given quiet window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules `payload` for `key`, one window after `now`.
    ///
    /// Replaces any pending task for the key.
    pub fn schedule(&mut self, key: &str, now: DateTime<Utc>, payload: P) -> DateTime<Utc> {
        self.coalesce(key, now, payload, |_, latest| latest)
    }

    /// Like [`schedule`](Self::schedule) but folds the pending payload into
    /// the new one with `merge(pending, latest)`.
    pub fn coalesce<F>(&mut self, key: &str, now: DateTime<Utc>, payload: P, merge: F) -> DateTime<Utc>
    where
        F: FnOnce(P, P) -> P,
    {
        let due = now + self.window;
        let (payload, coalesced) = match self.pending.remove(key) {
            Some(previous) => (merge(previous.payload, payload), previous.coalesced + 1),
            None => (payload, 1),
        };
        self.pending.insert(
            key.to_string(),
            PendingTask {
                key: key.to_string(),
                due,
                payload,
                coalesced,
            },
        );
        due
    }

    /// Removes and returns every task due at or before `now`, in key order
    pub fn poll_due(&mut self, now: DateTime<Utc>) -> Vec<PendingTask<P>> {
        let due_keys: Vec<String> = self
            .pending
            .values()
            .filter(|task| task.due <= now)
            .map(|task| task.key.clone())
            .collect();

        due_keys
            .iter()
            .filter_map(|key| self.pending.remove(key))
            .collect()
    }

    /// Removes and returns every pending task regardless of due time
    pub fn flush_all(&mut self) -> Vec<PendingTask<P>> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    /// Drops the pending task for `key`, returning it if there was one
    pub fn cancel(&mut self, key: &str) -> Option<PendingTask<P>> {
        self.pending.remove(key)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Due time of the pending task for `key`
    pub fn due_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.pending.get(key).map(|task| task.due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
