//! Tick-Based Timer Wheel
//!
//! Scheduled actions keyed by simulation tick, replacing coroutine-style
//! delayed effects. Every `schedule` call returns a [`TimerHandle`]; the
//! owning entity keeps its handles and cancels them when it is reset or
//! destroyed, so stale effects can never fire after a reset.
//!
//! Due actions drain in (due_tick, handle) order, which makes same-tick
//! firing order follow scheduling order.

use serde::{Deserialize, Serialize};

/// Opaque cancellation handle for a scheduled action.
///
/// Handles are unique for the lifetime of a wheel and never reused.
pub type TimerHandle = u64;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Entry<A> {
    handle: TimerHandle,
    due_tick: u32,
    action: A,
}

/// A cooperative timer wheel over an action type `A`.
///
/// Drained once per frame by the tick driver; the driver interprets the
/// returned actions. The wheel itself never executes anything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerWheel<A> {
    next_handle: TimerHandle,
    entries: Vec<Entry<A>>,
}

impl<A> Default for TimerWheel<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerWheel<A> {
    /// Create an empty wheel.
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            entries: Vec::new(),
        }
    }

    /// Schedule an action to fire once `now` reaches `due_tick`.
    pub fn schedule_at(&mut self, due_tick: u32, action: A) -> TimerHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            due_tick,
            action,
        });
        handle
    }

    /// Schedule an action `delay_ticks` after `now`.
    pub fn schedule_after(&mut self, now: u32, delay_ticks: u32, action: A) -> TimerHandle {
        self.schedule_at(now.saturating_add(delay_ticks), action)
    }

    /// Cancel a pending action. Returns true if it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Cancel a batch of handles (e.g. everything an entity owns).
    pub fn cancel_all(&mut self, handles: &[TimerHandle]) {
        self.entries.retain(|e| !handles.contains(&e.handle));
    }

    /// Remove and return every action due at or before `now`,
    /// ordered by (due_tick, handle).
    pub fn drain_due(&mut self, now: u32) -> Vec<A> {
        let mut due: Vec<Entry<A>> = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due_tick <= now {
                due.push(self.entries.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|e| (e.due_tick, e.handle));
        due.into_iter().map(|e| e.action).collect()
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tick of the next pending action, if any.
    pub fn next_due(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.due_tick).min()
    }
}

// =============================================================================
// TESTS
// =============================================================================
