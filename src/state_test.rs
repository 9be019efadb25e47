#![allow(clippy::float_cmp)]

use clap::Parser;
use frames::decode_message;
use futures_util::{SinkExt, StreamExt};
use overlay::connection::ConnectionState;
use overlay::consts::WHEEL_WIDGET;
use overlay::layout::WidgetLayout;
use overlay::spin::Phase;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use super::*;

const WAIT: Duration = Duration::from_secs(5);

const SPIN_ABC: &str = r#"{"type":"trigger_action","action_type":"spin_wheel","data":{"items":["A","B","C"],"actions":{"A":{"cmd":1}}}}"#;

fn context(args: &[&str]) -> (Context, mpsc::UnboundedReceiver<TransportEvent>) {
    let mut argv = vec!["wheel-overlay", "--no-console"];
    argv.extend_from_slice(args);
    let config = Config::try_parse_from(argv).expect("valid args");
    let (tx, rx) = mpsc::unbounded_channel();
    (Context::new(&config, tx), rx)
}

/// Move the context's clock forward by pulling its origin back.
fn advance(ctx: &mut Context, ms: u64) {
    ctx.clock.origin = ctx.clock.origin.checked_sub(Duration::from_millis(ms)).expect("clock origin underflow");
}

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, format!("ws://{addr}/ws"))
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept()).await.expect("accept timeout").expect("accept");
    accept_async(stream).await.expect("handshake")
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next()).await.expect("recv timeout").expect("open").expect("frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("json");
        }
    }
}

/// Route transport events into the context until `done` holds.
async fn pump_until(
    ctx: &mut Context,
    events: &mut mpsc::UnboundedReceiver<TransportEvent>,
    done: impl Fn(&Context) -> bool,
) {
    while !done(&*ctx) {
        let event = tokio::time::timeout(WAIT, events.recv()).await.expect("event timeout").expect("channel open");
        ctx.on_transport_event(event);
    }
}

fn is_state(state: ConnectionState) -> impl Fn(&Context) -> bool {
    move |ctx| ctx.transport.state() == state
}

#[test]
fn clock_instant_never_precedes_deadline() {
    let clock = Clock::start();
    let at = clock.instant_at(1.0004);
    assert!(at.duration_since(clock.origin) >= Duration::from_micros(1001));
    assert_eq!(clock.instant_at(-5.0), clock.origin);
}

#[tokio::test]
async fn page_url_query_starts_in_config_mode() {
    let (ctx, _rx) = context(&["--page-url", "http://localhost/overlay?config=true"]);
    assert!(ctx.core.config_mode());
}

#[tokio::test]
async fn console_toggles_config_mode() {
    let (mut ctx, _rx) = context(&[]);
    assert!(!ctx.core.config_mode());
    assert!(ctx.on_console_line("c").is_continue());
    assert!(ctx.core.config_mode());
}

#[tokio::test]
async fn console_quit_breaks() {
    let (mut ctx, _rx) = context(&[]);
    assert!(ctx.on_console_line("quit").is_break());
    assert!(ctx.on_console_line("bogus").is_continue());
    assert!(ctx.on_console_line("").is_continue());
}

#[tokio::test]
async fn console_drag_moves_widget_while_offline() {
    let (mut ctx, _rx) = context(&["--config-mode"]);
    assert!(ctx.on_console_line("down 960 540").is_continue());
    assert!(ctx.on_console_line("move 1056 540").is_continue());
    assert!(ctx.on_console_line("up 1152 540").is_continue());
    let layout = ctx.core.layouts().get(WHEEL_WIDGET).expect("wheel");
    assert!((layout.x - 60.0).abs() < 1e-9);
    assert_eq!(ctx.transport.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn console_reset_restores_defaults() {
    let (mut ctx, _rx) = context(&["--config-mode"]);
    assert!(ctx.on_console_line("down 1155 735").is_continue());
    assert!(ctx.on_console_line("up 1255 735").is_continue());
    assert!(ctx.core.layouts().layout_or_default(WHEEL_WIDGET).scale > 1.0);
    assert!(ctx.on_console_line("reset").is_continue());
    assert_eq!(ctx.core.layouts().get(WHEEL_WIDGET), Some(WidgetLayout::default()));
}

#[tokio::test]
async fn console_viewport_resizes() {
    let (mut ctx, _rx) = context(&[]);
    assert!(ctx.on_console_line("viewport 1280 720").is_continue());
    assert_eq!(ctx.core.viewport(), Viewport::new(1280.0, 720.0));
    assert!(ctx.on_console_line("viewport 0 720").is_continue());
    assert_eq!(ctx.core.viewport(), Viewport::new(1280.0, 720.0));
}

#[tokio::test]
async fn status_mentions_connection_and_layouts() {
    let (ctx, _rx) = context(&[]);
    let status = ctx.status();
    assert!(status.contains("attempts=0"));
    assert!(status.contains("connection=disconnected"));
    assert!(status.contains("wheel: x=50.0%"));
}

#[tokio::test]
async fn due_reconnect_timer_reconnects_transport() {
    let (listener, url) = listen().await;
    let (mut ctx, mut events) = context(&["--url", url.as_str(), "--reconnect-delay-ms", "1000"]);

    ctx.connect();
    let mut server = accept(&listener).await;
    pump_until(&mut ctx, &mut events, is_state(ConnectionState::Connected)).await;
    assert_eq!(ctx.core.renderer().connection(), ConnectionState::Connected);
    assert_eq!(next_text(&mut server).await["type"], "request_config");

    server.close(None).await.expect("close");
    drop(server);
    pump_until(&mut ctx, &mut events, is_state(ConnectionState::Disconnected)).await;
    assert_eq!(ctx.core.renderer().connection(), ConnectionState::Disconnected);
    assert_eq!(ctx.timers.pending_of(TimerKind::Reconnect), 1);

    ctx.fire_due_timers();
    assert_eq!(ctx.transport.state(), ConnectionState::Disconnected);

    advance(&mut ctx, 1000);
    ctx.fire_due_timers();
    assert_eq!(ctx.transport.state(), ConnectionState::Connecting);
    assert_eq!(ctx.core.renderer().connection(), ConnectionState::Connecting);
    assert!(ctx.timers.is_empty());

    let mut server = accept(&listener).await;
    pump_until(&mut ctx, &mut events, is_state(ConnectionState::Connected)).await;
    assert_eq!(next_text(&mut server).await["type"], "request_config");
    assert_eq!(ctx.transport.attempts(), 2);

    ctx.shutdown().await;
    assert!(ctx.timers.is_empty());
}

#[tokio::test]
async fn spin_result_reaches_server_and_result_timers_run() {
    let (listener, url) = listen().await;
    let (mut ctx, mut events) = context(&["--url", url.as_str()]);

    ctx.connect();
    let mut server = accept(&listener).await;
    pump_until(&mut ctx, &mut events, is_state(ConnectionState::Connected)).await;
    assert_eq!(next_text(&mut server).await["type"], "request_config");

    server.send(Message::Text(SPIN_ABC.into())).await.expect("send");
    pump_until(&mut ctx, &mut events, |c| c.core.is_animating()).await;
    assert!(ctx.core.renderer().visible());

    ctx.on_frame();
    assert!(ctx.core.is_animating());
    advance(&mut ctx, 4000);
    ctx.on_frame();
    assert!(!ctx.core.is_animating());

    let sent = next_text(&mut server).await;
    assert_eq!(sent["type"], "wheel_result");
    let label = sent["result"].as_str().expect("result label").to_owned();
    assert!(["A", "B", "C"].contains(&label.as_str()));
    if label == "A" {
        assert_eq!(sent["action"]["cmd"], 1);
    } else {
        assert!(sent.get("action").is_none());
    }
    assert_eq!(ctx.core.renderer().result(), Some(label.as_str()));
    assert_eq!(ctx.timers.pending_of(TimerKind::ResultFade), 1);
    assert_eq!(ctx.timers.pending_of(TimerKind::WidgetHide), 1);

    advance(&mut ctx, 3000);
    ctx.fire_due_timers();
    assert_eq!(ctx.timers.pending_of(TimerKind::ResultClear), 1);
    advance(&mut ctx, 500);
    ctx.fire_due_timers();
    assert_eq!(ctx.core.renderer().result(), None);
    assert_eq!(ctx.core.spin().phase(), Phase::Idle);
    assert!(ctx.core.renderer().visible());
    advance(&mut ctx, 500);
    ctx.fire_due_timers();
    assert!(!ctx.core.renderer().visible());
    assert!(ctx.timers.is_empty());

    ctx.shutdown().await;
}

#[tokio::test]
async fn shutdown_cancels_owned_timers() {
    let (listener, url) = listen().await;
    drop(listener);
    let (mut ctx, mut events) = context(&["--url", url.as_str()]);

    ctx.connect();
    pump_until(&mut ctx, &mut events, is_state(ConnectionState::Disconnected)).await;
    assert_eq!(ctx.timers.pending_of(TimerKind::Reconnect), 1);

    let now = ctx.clock.now_ms();
    ctx.core.handle_message(decode_message(SPIN_ABC).expect("trigger"), now, &mut ctx.timers);
    advance(&mut ctx, 4000);
    ctx.on_frame();
    assert_eq!(ctx.core.spin().phase(), Phase::ShowingResult);
    assert_eq!(ctx.timers.len(), 3);

    ctx.shutdown().await;
    assert!(ctx.timers.is_empty());
    assert!(ctx.core.spin().pending_timers().is_empty());
    assert_eq!(ctx.transport.pending_reconnect(), None);
}
