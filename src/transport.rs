//! Resilient websocket link to the controller.
//!
//! `Transport` is owned by the event loop and never blocks it. Each connection
//! attempt runs in a spawned task that reports back through a channel of
//! [`TransportEvent`]s; every event carries the attempt's generation, and
//! events from any generation but the current one are dropped. That keeps a
//! slow-dying old socket from touching the state of a newer one.
//!
//! The [`ConnectionMachine`] decides when to reconnect: every loss schedules
//! one reconnect timer on the shared [`TimerQueue`], replacing any pending one.
//! Sends while not connected are dropped with a warning. Nothing is queued.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use frames::{InboundMessage, OutboundMessage, decode_message, encode_message};
use futures_util::{SinkExt, StreamExt};
use overlay::connection::{ConnectionMachine, ConnectionState};
use overlay::timers::{TimerId, TimerQueue};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// How long shutdown waits for the close handshake before aborting the task.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// How long a connection attempt may take to complete the websocket upgrade.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),
    #[error("connection task is gone")]
    ChannelClosed,
}

/// Report from a connection task to the event loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// Handshake completed; `writer` feeds the socket.
    Opened { generation: u64, writer: mpsc::UnboundedSender<String> },
    /// One text frame from the controller.
    Inbound { generation: u64, text: String },
    /// The socket closed or errored after opening.
    Closed { generation: u64, reason: String },
    /// The handshake failed.
    Failed { generation: u64, error: TransportError },
}

impl TransportEvent {
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Opened { generation, .. }
            | Self::Inbound { generation, .. }
            | Self::Closed { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// What an applied event means for the rest of the overlay.
#[derive(Debug, PartialEq)]
pub enum TransportUpdate {
    State(ConnectionState),
    Message(InboundMessage),
}

pub struct Transport {
    url: String,
    machine: ConnectionMachine,
    generation: u64,
    writer: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    attempts: u64,
    handshake_timeout: Duration,
}

impl Transport {
    pub fn new(url: impl Into<String>, reconnect_delay_ms: f64, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            url: url.into(),
            machine: ConnectionMachine::new(reconnect_delay_ms),
            generation: 0,
            writer: None,
            task: None,
            events,
            attempts: 0,
            handshake_timeout: HANDSHAKE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connection attempts over the process lifetime.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Consecutive failures since the last successful handshake.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.machine.failures()
    }

    #[must_use]
    pub fn pending_reconnect(&self) -> Option<TimerId> {
        self.machine.pending_reconnect()
    }

    /// Start a new attempt: bumps the generation, drops the old writer and
    /// task, and moves to `Connecting`. Returns the new generation.
    fn begin_attempt(&mut self, timers: &mut TimerQueue) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.writer = None;
        self.generation += 1;
        self.attempts += 1;
        self.machine.begin_attempt(timers);
        self.generation
    }

    /// Open a new connection in the background.
    pub fn connect(&mut self, timers: &mut TimerQueue) {
        let generation = self.begin_attempt(timers);
        info!(url = %self.url, generation, attempt = self.attempts, "transport: connecting");
        self.task = Some(tokio::spawn(run_connection(
            self.url.clone(),
            generation,
            self.handshake_timeout,
            self.events.clone(),
        )));
    }

    /// Send one message. Dropped with a warning unless connected.
    pub fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let Some(writer) = self.writer.as_ref().filter(|_| self.machine.is_connected()) else {
            warn!(kind = message.kind(), state = %self.state(), "transport: dropping message, not connected");
            return Err(TransportError::NotConnected);
        };
        writer.send(encode_message(message)).map_err(|_| {
            warn!(kind = message.kind(), "transport: dropping message, connection task gone");
            TransportError::ChannelClosed
        })?;
        debug!(kind = message.kind(), "transport: sent");
        Ok(())
    }

    /// Apply an event from a connection task.
    pub fn handle_event(&mut self, event: TransportEvent, now_ms: f64, timers: &mut TimerQueue) -> Option<TransportUpdate> {
        if event.generation() != self.generation {
            debug!(stale = event.generation(), current = self.generation, "transport: ignoring stale event");
            return None;
        }
        match event {
            TransportEvent::Opened { writer, .. } => {
                if !self.machine.on_established() {
                    return None;
                }
                self.writer = Some(writer);
                info!(url = %self.url, "transport: connected");
                if let Err(e) = self.send(&OutboundMessage::RequestConfig) {
                    warn!(error = %e, "transport: request_config not sent");
                }
                Some(TransportUpdate::State(ConnectionState::Connected))
            }
            TransportEvent::Inbound { text, .. } => match decode_message(&text) {
                Ok(message) => {
                    debug!(kind = message.kind(), "transport: received");
                    Some(TransportUpdate::Message(message))
                }
                Err(e) => {
                    warn!(error = %e, "transport: discarding malformed message");
                    None
                }
            },
            TransportEvent::Closed { reason, .. } => {
                warn!(%reason, "transport: connection closed");
                Some(self.lost(now_ms, timers))
            }
            TransportEvent::Failed { error, .. } => {
                warn!(%error, failures = self.machine.failures() + 1, "transport: connect failed");
                Some(self.lost(now_ms, timers))
            }
        }
    }

    fn lost(&mut self, now_ms: f64, timers: &mut TimerQueue) -> TransportUpdate {
        self.writer = None;
        self.task = None;
        self.machine.on_lost(timers, now_ms);
        info!(delay_ms = self.machine.reconnect_delay_ms(), "transport: reconnect scheduled");
        TransportUpdate::State(ConnectionState::Disconnected)
    }

    /// Handle a fired reconnect timer. Returns `true` if an attempt started.
    pub fn on_timer(&mut self, id: TimerId, timers: &mut TimerQueue) -> bool {
        if !self.machine.on_timer(id) {
            return false;
        }
        self.connect(timers);
        true
    }

    /// Cancel any pending reconnect and close the socket.
    pub async fn shutdown(&mut self, timers: &mut TimerQueue) {
        self.machine.shutdown(timers);
        // Invalidate in-flight events and let the writer side send a close frame.
        self.generation += 1;
        self.writer = None;
        let Some(mut task) = self.task.take() else {
            return;
        };
        match tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await {
            Ok(Ok(())) => debug!("transport: closed"),
            Ok(Err(e)) => warn!(error = %e, "transport: connection task failed"),
            Err(_) => {
                warn!("transport: close timed out, aborting");
                task.abort();
            }
        }
    }
}

/// One connection's lifetime: handshake, then pump frames both ways until
/// either side ends.
async fn run_connection(
    url: String,
    generation: u64,
    handshake_timeout: Duration,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let stream = match tokio::time::timeout(handshake_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            report(&events, TransportEvent::Failed { generation, error: TransportError::Connect(Box::new(e)) });
            return;
        }
        Err(_) => {
            let error = TransportError::HandshakeTimeout(handshake_timeout);
            report(&events, TransportEvent::Failed { generation, error });
            return;
        }
    };
    let (mut write, mut read) = stream.split();
    let (writer, mut outgoing) = mpsc::unbounded_channel::<String>();
    if !report(&events, TransportEvent::Opened { generation, writer }) {
        return;
    }

    let reason = loop {
        tokio::select! {
            next = outgoing.recv() => match next {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        break e.to_string();
                    }
                }
                None => {
                    if let Err(e) = write.close().await {
                        debug!(error = %e, "transport: close handshake failed");
                    }
                    break "closed locally".to_owned();
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if !report(&events, TransportEvent::Inbound { generation, text: text.as_str().to_owned() }) {
                        break "event loop gone".to_owned();
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map_or_else(|| "closed by server".to_owned(), |f| format!("closed by server: {}", f.reason.as_str()));
                }
                // Pings are answered by tungstenite; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "stream ended".to_owned(),
            },
        }
    };
    report(&events, TransportEvent::Closed { generation, reason });
}

/// Forward an event to the loop. Returns `false` once the loop is gone.
fn report(events: &mpsc::UnboundedSender<TransportEvent>, event: TransportEvent) -> bool {
    if events.send(event).is_err() {
        debug!("transport: event loop gone");
        return false;
    }
    true
}
