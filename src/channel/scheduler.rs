//! Timer abstraction for the reconnect delay.
//!
//! [`VirtualScheduler`] only moves when told to, so tests step through
//! reconnect cycles deterministically. [`SystemScheduler`] follows the
//! monotonic clock.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

pub trait Scheduler {
    /// Time elapsed since the scheduler was created.
    fn now(&self) -> Duration;

    /// Arm a one-shot timer `delay` from now. Timers cannot be cancelled.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Remove and return every timer whose deadline has passed, earliest first.
    fn take_due(&mut self) -> Vec<TimerId>;

    fn next_deadline(&self) -> Option<Duration>;

    fn pending(&self) -> usize;

    /// Let time pass while there is nothing else to do, at most `max`.
    fn idle(&mut self, max: Duration);
}

/// Deadline-ordered one-shot timers shared by both schedulers.
#[derive(Debug, Clone, Default)]
struct TimerQueue {
    next_id: u64,
    timers: BTreeMap<(Duration, u64), TimerId>,
}

impl TimerQueue {
    fn insert(&mut self, deadline: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert((deadline, id.0), id);
        id
    }

    fn drain_due(&mut self, now: Duration) -> Vec<TimerId> {
        let mut due = Vec::new();
        while let Some(entry) = self.timers.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    fn len(&self) -> usize {
        self.timers.len()
    }
}

// ──────────────────── virtual time ────────────────────

#[derive(Debug, Clone, Default)]
pub struct VirtualScheduler {
    now: Duration,
    queue: TimerQueue,
}

impl VirtualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.queue.insert(self.now + delay)
    }

    fn take_due(&mut self) -> Vec<TimerId> {
        self.queue.drain_due(self.now)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn idle(&mut self, _max: Duration) {}
}

// ──────────────────── wall clock ────────────────────

#[derive(Debug, Clone)]
pub struct SystemScheduler {
    origin: Instant,
    queue: TimerQueue,
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            queue: TimerQueue::default(),
        }
    }
}

impl SystemScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for SystemScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(&mut self, delay: Duration) -> TimerId {
        let deadline = self.now() + delay;
        self.queue.insert(deadline)
    }

    fn take_due(&mut self) -> Vec<TimerId> {
        let now = self.now();
        self.queue.drain_due(now)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn idle(&mut self, max: Duration) {
        let wait = self
            .next_deadline()
            .map_or(max, |deadline| deadline.saturating_sub(self.now()).min(max));
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}
