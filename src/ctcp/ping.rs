//! Outstanding CTCP PING bookkeeping.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::casemap::irc_to_lower;

/// Per-nickname FIFO of send times for CTCP PING queries.
///
/// Each query sent pushes one timestamp; each reply pops the oldest one.
/// A reply with nothing outstanding is ignored. Nicknames are compared
/// case-insensitively.
#[derive(Debug, Default)]
pub struct PingTracker {
    queues: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl PingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query sent to `target` now.
    pub fn record(&self, target: &str) {
        self.record_at(target, Instant::now());
    }

    /// Record a query sent to `target` at `sent`.
    pub fn record_at(&self, target: &str, sent: Instant) {
        self.queues
            .lock()
            .entry(irc_to_lower(target))
            .or_default()
            .push_back(sent);
    }

    /// Match a reply from `sender` against the oldest outstanding query.
    pub fn complete(&self, sender: &str) -> Option<Duration> {
        self.complete_at(sender, Instant::now())
    }

    /// Like [`complete`](Self::complete) with an explicit receive time.
    ///
    /// Never negative: a `now` earlier than the send time yields zero.
    pub fn complete_at(&self, sender: &str, now: Instant) -> Option<Duration> {
        let key = irc_to_lower(sender);
        let mut queues = self.queues.lock();
        let queue = queues.get_mut(&key)?;
        let sent = queue.pop_front()?;
        if queue.is_empty() {
            queues.remove(&key);
        }
        Some(now.saturating_duration_since(sent))
    }

    /// Number of unanswered queries to `target`.
    pub fn outstanding(&self, target: &str) -> usize {
        self.queues
            .lock()
            .get(&irc_to_lower(target))
            .map_or(0, VecDeque::len)
    }

    /// Drop all outstanding queries to `target`.
    pub fn forget(&self, target: &str) {
        self.queues.lock().remove(&irc_to_lower(target));
    }
}
