//! Timer-based coalescing of repeated triggers.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Coalesces bursts of triggers into one firing per quiet period.
///
/// Scheduling a key that is already pending replaces its deadline, so a key
/// fires once the triggers for it have stopped for `quiet`.
#[derive(Debug)]
pub struct Debouncer<K> {
    quiet: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Copy + Eq + Hash> Debouncer<K> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: HashMap::new(),
        }
    }

    /// Schedule `key`, or push back its deadline if already pending.
    pub fn schedule(&mut self, key: K, now: Instant) {
        self.pending.insert(key, now + self.quiet);
    }

    /// Remove and return every key whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }
}
