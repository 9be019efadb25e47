//! Connection state machine for the controller link.
//!
//! LIFECYCLE
//! =========
//! `Disconnected → Connecting` on an attempt, `Connecting → Connected` when
//! the handshake completes, and `Connecting | Connected → Disconnected` on any
//! error or close. Every loss schedules exactly one reconnect after a fixed
//! delay; a reconnect already pending is canceled first, so at most one
//! [`TimerKind::Reconnect`] timer exists at any time. There is no terminal
//! state: the machine retries for as long as the process runs.
//!
//! The machine decides *when* to connect; the host transport does the I/O.

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

use std::fmt;

use crate::timers::{TimerId, TimerKind, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

#[derive(Debug)]
pub struct ConnectionMachine {
    state: ConnectionState,
    reconnect_delay_ms: f64,
    reconnect: Option<TimerId>,
    /// Attempts since the last successful handshake.
    failures: u32,
    /// Successful handshakes over the process lifetime.
    connects: u64,
}

impl ConnectionMachine {
    #[must_use]
    pub fn new(reconnect_delay_ms: f64) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay_ms,
            reconnect: None,
            failures: 0,
            connects: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    #[must_use]
    pub fn reconnect_delay_ms(&self) -> f64 {
        self.reconnect_delay_ms
    }

    /// The reconnect timer currently pending, if any.
    #[must_use]
    pub fn pending_reconnect(&self) -> Option<TimerId> {
        self.reconnect
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[must_use]
    pub fn connects(&self) -> u64 {
        self.connects
    }

    /// Enter `Connecting`. Cancels a pending reconnect so an explicit attempt
    /// never races a scheduled one.
    pub fn begin_attempt(&mut self, timers: &mut TimerQueue) {
        timers.cancel_slot(&mut self.reconnect);
        self.state = ConnectionState::Connecting;
    }

    /// Handshake completed. Returns `false` (and changes nothing) unless an
    /// attempt was in progress.
    pub fn on_established(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.failures = 0;
        self.connects += 1;
        true
    }

    /// Connection closed or errored. Moves to `Disconnected` and schedules the
    /// single next attempt, replacing any reconnect already pending.
    pub fn on_lost(&mut self, timers: &mut TimerQueue, now_ms: f64) -> TimerId {
        if self.state != ConnectionState::Connected {
            self.failures = self.failures.saturating_add(1);
        }
        self.state = ConnectionState::Disconnected;
        timers.cancel_slot(&mut self.reconnect);
        let id = timers.schedule(TimerKind::Reconnect, now_ms, self.reconnect_delay_ms);
        self.reconnect = Some(id);
        id
    }

    /// A timer fired. Returns `true` if it was this machine's reconnect and a
    /// new attempt should start now.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.reconnect != Some(id) {
            return false;
        }
        self.reconnect = None;
        true
    }

    /// Process teardown: cancel any pending reconnect and go idle.
    pub fn shutdown(&mut self, timers: &mut TimerQueue) {
        timers.cancel_slot(&mut self.reconnect);
        self.state = ConnectionState::Disconnected;
    }
}
