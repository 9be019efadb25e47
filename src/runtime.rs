//! Single-task event loop.
//!
//! Everything that mutates overlay state happens on this one task: transport
//! events, frame ticks (only while a spin animates), due timers, and console
//! lines are multiplexed with `tokio::select!`. Connection I/O runs in its
//! own task and only talks to this loop through the event channel.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::OverlayError;
use crate::state::Context;

/// Frame interval while the wheel spins, about 60 fps.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub async fn run(config: Config) -> Result<(), OverlayError> {
    config.validate()?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut ctx = Context::new(&config, events_tx);
    info!(
        url = %config.url,
        reconnect_delay_ms = config.reconnect_delay_ms,
        config_mode = ctx.core.config_mode(),
        "overlay: starting"
    );
    ctx.connect();

    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = !config.no_console;

    let mut exit = Ok(());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let next_timer = ctx.next_timer();
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "overlay: ctrl-c handler failed");
                    exit = Err(OverlayError::Io(e));
                }
                break;
            }
            Some(event) = events_rx.recv() => ctx.on_transport_event(event),
            _ = frames.tick(), if ctx.core.is_animating() => ctx.on_frame(),
            () = sleep_until(next_timer) => ctx.fire_due_timers(),
            line = console.next_line(), if console_open => match line {
                Ok(Some(line)) => {
                    if ctx.on_console_line(&line).is_break() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("overlay: console closed");
                    console_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "overlay: console read failed");
                    console_open = false;
                }
            },
        }
    }

    ctx.shutdown().await;
    exit
}

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
