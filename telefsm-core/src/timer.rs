//! One-shot instance timers.
//!
//! Deadlines are kept on tokio's clock so that a paused test runtime can
//! drive them with `tokio::time::advance`.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;

use crate::log::inst_log;
use crate::{Engine, InstanceId};

/// Cap on how far ahead a deadline may lie, about 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Pending deadlines, at most one per instance.
#[derive(Debug, Default)]
pub struct TimerQueue {
    deadlines: BTreeMap<(Instant, u64), InstanceId>,
    armed: HashMap<InstanceId, (Instant, u64)>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer of `id` to fire after `delay`, replacing any pending one.
    ///
    /// Delays beyond roughly 30 years are clamped.
    pub fn schedule(&mut self, id: InstanceId, delay: Duration) {
        self.cancel(id);
        let key = (Instant::now() + delay.min(FAR_FUTURE), self.seq);
        self.seq += 1;
        self.deadlines.insert(key, id);
        self.armed.insert(id, key);
    }

    /// Disarms the timer of `id`. Returns whether one was pending.
    pub fn cancel(&mut self, id: InstanceId) -> bool {
        match self.armed.remove(&id) {
            Some(key) => {
                self.deadlines.remove(&key);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, id: InstanceId) -> bool {
        self.armed.contains_key(&id)
    }

    /// Time left until `id` fires; zero once the deadline has passed.
    pub fn remaining(&self, id: InstanceId) -> Option<Duration> {
        self.armed
            .get(&id)
            .map(|(deadline, _)| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Disarms and returns the earliest timer due at `now`.
    pub fn pop_expired(&mut self, now: Instant) -> Option<InstanceId> {
        let entry = self.deadlines.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        let id = entry.remove();
        self.armed.remove(&id);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

impl Engine {
    /// Runs the timer callback of every instance whose deadline has passed.
    ///
    /// Timers re-armed by a callback for a later deadline are left for a
    /// later call. Returns the number of callbacks run.
    pub fn fire_expired(&mut self) -> usize {
        let now = Instant::now();
        let mut fired = 0;
        while let Some(fi) = self.timers.pop_expired(now) {
            let Some(inst) = self.store.get(fi) else {
                continue;
            };
            let fsm = Rc::clone(&inst.fsm);
            inst_log!(
                inst.log_level,
                fsm.log_subsys(),
                inst.name,
                "Timeout of T{}",
                inst.timer_label
            );
            fsm.behavior().timer_cb(self, fi);
            fired += 1;
        }
        fired
    }

    /// Time left on the instance's pending timer, if one is armed.
    pub fn timer_remaining(&self, fi: InstanceId) -> Option<Duration> {
        self.timers.remaining(fi)
    }

    /// Deadline of the earliest pending timer across all instances.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}
