//! Cancellable delayed alarms on a virtual clock
//!
//! Phase transitions are chained through alarms: entering a phase schedules
//! the alarm that ends it. The timer does not sleep; whoever drives the
//! client (a `tokio` loop, a test) tells it how much time has passed and
//! feeds the alarms that came due back into the state machine. This keeps
//! every transition on the single thread that owns the client.

use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use tracing::{debug, trace};

/// Handle to a scheduled alarm, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    deadline: Duration,
    id: u64,
}

impl TimerHandle {
    /// The virtual time at which the alarm fires
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Scheduler of alarms of type `A`
#[derive(Debug)]
pub struct PhaseTimer<A> {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), A>,
}

impl<A> Default for PhaseTimer<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<A: Debug> PhaseTimer<A> {
    /// Creates an empty timer at virtual time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `alarm` to fire after `delay`
    ///
    /// Alarms with equal deadlines fire in scheduling order.
    pub fn schedule(&mut self, delay: Duration, alarm: A) -> TimerHandle {
        let handle = TimerHandle {
            deadline: self.now + delay,
            id: self.next_id,
        };
        self.next_id += 1;
        debug!(?alarm, ?delay, "timer set");
        self.pending.insert((handle.deadline, handle.id), alarm);
        handle
    }

    /// Cancels the alarm behind `handle`
    ///
    /// Cancelling an alarm that already fired or was already cancelled is a
    /// no-op. Returns whether an alarm was actually removed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.remove(&(handle.deadline, handle.id)) {
            Some(alarm) => {
                debug!(?alarm, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every pending alarm, returning how many were removed
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        if count > 0 {
            debug!(count, "all timers cancelled");
        }
        self.pending.clear();
        count
    }

    /// Whether the alarm behind `handle` is still waiting to fire
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&(handle.deadline, handle.id))
    }

    /// Number of alarms waiting to fire
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Time left until the earliest pending alarm, if any
    pub fn until_next(&self) -> Option<Duration> {
        self.pending
            .keys()
            .next()
            .map(|(deadline, _)| deadline.saturating_sub(self.now))
    }

    /// Removes and returns the earliest alarm due at or before `until`
    ///
    /// The clock moves forward to the alarm's deadline, so alarms scheduled
    /// while handling it are measured from the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<A> {
        let entry = self.pending.first_entry()?;
        let (deadline, _) = *entry.key();
        if deadline > until {
            return None;
        }
        let alarm = entry.remove();
        self.now = self.now.max(deadline);
        trace!(?alarm, now = ?self.now, "timer fired");
        Some(alarm)
    }

    /// Moves the clock forward to `until` once every due alarm was handled
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

/// Seconds left in the current timed phase, for display only
///
/// The countdown is derived state: nothing transitions when it reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
}

impl Countdown {
    /// Starts counting down from `duration`, rounded down to whole seconds
    pub fn arm(&mut self, duration: Duration) {
        self.remaining = duration.as_secs();
    }

    /// Removes `interval` from the remaining time
    ///
    /// Returns whether the countdown still has time left.
    pub fn tick(&mut self, interval: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(interval.as_secs().max(1));
        self.remaining > 0
    }

    /// Stops the countdown
    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    /// Whole seconds left
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}
