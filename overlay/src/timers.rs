//! Cancelable timer queue.
//!
//! Every delayed effect in the overlay (reconnect, result fade, result clear,
//! widget hide) is a [`TimerId`] in one [`TimerQueue`]. Owners keep the id of
//! each timer they schedule so a later event can cancel it; canceling one id
//! never touches another. The queue holds no clock: the host asks for
//! [`TimerQueue::next_deadline`], sleeps until then, and drains
//! [`TimerQueue::pop_due`].

#[cfg(test)]
#[path = "timers_test.rs"]
mod timers_test;

use std::collections::BTreeMap;

/// Handle to one scheduled timer. Ids are never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// What a timer is for. The host routes fired timers by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Next connection attempt after a loss.
    Reconnect,
    /// End of the result display window; starts the fade.
    ResultFade,
    /// End of the fade; clears the label and returns the wheel to idle.
    ResultClear,
    /// Hides the wheel container after a result.
    WidgetHide,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: TimerKind,
    due_ms: f64,
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<TimerId, Pending>,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, kind: TimerKind, now_ms: f64, delay_ms: f64) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(id, Pending { kind, due_ms: now_ms + delay_ms.max(0.0) });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was canceled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Cancel the timer held in `slot`, if any, and empty the slot.
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            self.cancel(id);
        }
    }

    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending timers of `kind`.
    #[must_use]
    pub fn pending_of(&self, kind: TimerKind) -> usize {
        self.pending.values().filter(|p| p.kind == kind).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of a pending timer.
    #[must_use]
    pub fn deadline(&self, id: TimerId) -> Option<f64> {
        self.pending.get(&id).map(|p| p.due_ms)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.values().map(|p| p.due_ms).min_by(f64::total_cmp)
    }

    /// Remove and return every timer due at or before `now_ms`, earliest
    /// first; ties fire in scheduling order.
    pub fn pop_due(&mut self, now_ms: f64) -> Vec<Fired> {
        let mut due = self
            .pending
            .iter()
            .filter(|(_, p)| p.due_ms <= now_ms)
            .map(|(id, p)| (*id, *p))
            .collect::<Vec<_>>();
        due.sort_by(|(a_id, a), (b_id, b)| a.due_ms.total_cmp(&b.due_ms).then(a_id.cmp(b_id)));
        for (id, _) in &due {
            self.pending.remove(id);
        }
        due.into_iter().map(|(id, p)| Fired { id, kind: p.kind }).collect()
    }
}
