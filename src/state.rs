//! Process-wide overlay context.
//!
//! One [`Context`] is built at startup and owned by the event loop. It holds
//! the shared timer queue, the transport, and the overlay core, and routes
//! every event between them. Nothing in here is global.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::ops::ControlFlow;
use std::time::Duration;

use frames::OutboundMessage;
use overlay::engine::{OverlayCore, OverlayOptions};
use overlay::input::Key;
use overlay::timers::{TimerKind, TimerQueue};
use overlay::viewport::Viewport;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::console::{ConsoleCommand, HELP, parse_command};
use crate::render::TraceRenderer;
use crate::transport::{Transport, TransportEvent, TransportUpdate};

/// Millisecond clock anchored at startup.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    #[must_use]
    pub fn start() -> Self {
        Self { origin: Instant::now() }
    }

    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// Earliest instant at which the clock reads at least `ms`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn instant_at(&self, ms: f64) -> Instant {
        self.origin + Duration::from_micros((ms.max(0.0) * 1000.0).ceil() as u64)
    }
}

pub struct Context {
    pub clock: Clock,
    pub timers: TimerQueue,
    pub transport: Transport,
    pub core: OverlayCore<TraceRenderer>,
}

impl Context {
    pub fn new(config: &Config, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        let options = OverlayOptions {
            config_mode: config.initial_config_mode(),
            viewport: config.viewport,
            ..OverlayOptions::default()
        };
        Self {
            clock: Clock::start(),
            timers: TimerQueue::new(),
            transport: Transport::new(config.url.clone(), config.reconnect_delay(), events),
            core: OverlayCore::new(TraceRenderer::new(), options),
        }
    }

    pub fn connect(&mut self) {
        self.transport.connect(&mut self.timers);
        self.core.connection_changed(self.transport.state());
    }

    /// When the earliest pending timer is due.
    #[must_use]
    pub fn next_timer(&self) -> Option<Instant> {
        self.timers.next_deadline().map(|ms| self.clock.instant_at(ms))
    }

    pub fn on_transport_event(&mut self, event: TransportEvent) {
        let now = self.clock.now_ms();
        match self.transport.handle_event(event, now, &mut self.timers) {
            Some(TransportUpdate::State(state)) => self.core.connection_changed(state),
            Some(TransportUpdate::Message(message)) => self.core.handle_message(message, now, &mut self.timers),
            None => {}
        }
    }

    pub fn on_frame(&mut self) {
        let now = self.clock.now_ms();
        if let Some(result) = self.core.tick(now, &mut self.timers) {
            self.send(&result);
        }
    }

    pub fn fire_due_timers(&mut self) {
        let now = self.clock.now_ms();
        for fired in self.timers.pop_due(now) {
            let handled = match fired.kind {
                TimerKind::Reconnect => {
                    let started = self.transport.on_timer(fired.id, &mut self.timers);
                    if started {
                        self.core.connection_changed(self.transport.state());
                    }
                    started
                }
                TimerKind::ResultFade | TimerKind::ResultClear | TimerKind::WidgetHide => {
                    self.core.on_timer(fired, now, &mut self.timers)
                }
            };
            if !handled {
                debug!(kind = ?fired.kind, "overlay: stale timer");
            }
        }
    }

    /// Send, logging instead of failing; the transport already warned.
    fn send(&self, message: &OutboundMessage) {
        if let Err(e) = self.transport.send(message) {
            debug!(kind = message.kind(), error = %e, "overlay: message not delivered");
        }
    }

    fn send_all(&self, messages: &[OutboundMessage]) {
        for message in messages {
            self.send(message);
        }
    }

    /// Run one console line. `Break` means shut down.
    pub fn on_console_line(&mut self, line: &str) -> ControlFlow<()> {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return ControlFlow::Continue(()),
            Err(e) => {
                println!("{e}");
                return ControlFlow::Continue(());
            }
        };
        match command {
            ConsoleCommand::ToggleConfig => {
                self.core.key_down(&Key::new("c"));
                println!("config mode {}", if self.core.config_mode() { "on" } else { "off" });
            }
            ConsoleCommand::Reset => {
                let updates = self.core.reset_layout();
                self.send_all(&updates);
            }
            ConsoleCommand::Viewport { width, height } => {
                if !self.core.set_viewport(Viewport::new(width, height)) {
                    println!("invalid viewport {width}x{height}");
                }
            }
            ConsoleCommand::Down(at) => {
                if !self.core.pointer_down(at) {
                    println!("nothing to grab at {} {}", at.x, at.y);
                }
            }
            ConsoleCommand::Move(at) => self.core.pointer_move(at),
            ConsoleCommand::Up(at) => {
                if let Some(update) = self.core.pointer_up(at) {
                    self.send(&update);
                }
            }
            ConsoleCommand::Status => println!("{}", self.status()),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    #[must_use]
    pub fn status(&self) -> String {
        let spin = self.core.spin();
        let mut status = format!(
            "url={} attempts={} failures={} phase={:?} pending_timers={}\n{}",
            self.transport.url(),
            self.transport.attempts(),
            self.transport.failures(),
            spin.phase(),
            self.timers.len(),
            self.core.renderer().describe(),
        );
        if let Some(last) = spin.last_result() {
            status.push_str(&format!("\nlast result: {}", last.label));
        }
        status
    }

    /// Cancel every timer, drop any gesture, and close the socket. Each
    /// owner cancels its own timers.
    pub async fn shutdown(&mut self) {
        info!("overlay: shutting down");
        self.core.shutdown(&mut self.timers);
        self.transport.shutdown(&mut self.timers).await;
        if !self.timers.is_empty() {
            warn!(pending = self.timers.len(), "overlay: timers left after shutdown");
        }
    }
}
