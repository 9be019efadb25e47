//! `OverlayCore`: the overlay's state and the single entry point for every
//! input the host feeds it.
//!
//! The host owns the clock, the timer queue's sleeping, and the transport. It
//! calls in here with decoded inbound messages, pointer and key input, frame
//! ticks, and fired timers, and gets back the outbound messages to send.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use frames::{InboundMessage, OutboundMessage, SPIN_WHEEL_ACTION, SpinRequest, TriggerAction, WheelAction};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::connection::ConnectionState;
use crate::consts::WIDGET_BASE_SIZE_PX;
use crate::gesture::GestureController;
use crate::hit::hit_test;
use crate::input::{Key, PointerTarget};
use crate::layout::LayoutStore;
use crate::render::Renderer;
use crate::spin::{SpinEngine, SpinOutcome, SpinPlan, SpinTiming, WheelItem};
use crate::timers::{Fired, TimerQueue};
use crate::viewport::{Point, Rect, Viewport};

/// Startup options for [`OverlayCore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayOptions {
    /// Start in configuration mode.
    pub config_mode: bool,
    pub viewport: Viewport,
    pub timing: SpinTiming,
}

pub struct OverlayCore<R: Renderer> {
    spin: SpinEngine,
    layouts: LayoutStore,
    gestures: GestureController,
    viewport: Viewport,
    renderer: R,
    rng: StdRng,
}

impl<R: Renderer> OverlayCore<R> {
    /// Core with an OS-seeded spin rng.
    pub fn new(renderer: R, options: OverlayOptions) -> Self {
        Self::with_rng(renderer, options, StdRng::from_os_rng())
    }

    /// Core with a fixed spin rng, for reproducible spins.
    pub fn with_seed(renderer: R, options: OverlayOptions, seed: u64) -> Self {
        Self::with_rng(renderer, options, StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut renderer: R, options: OverlayOptions, rng: StdRng) -> Self {
        let layouts = LayoutStore::new();
        renderer.set_viewport(options.viewport);
        renderer.set_config_mode(options.config_mode);
        for (name, layout) in layouts.iter() {
            renderer.apply_layout(name, &layout);
        }
        Self {
            spin: SpinEngine::with_timing(options.timing),
            layouts,
            gestures: GestureController::new(options.config_mode),
            viewport: options.viewport,
            renderer,
            rng,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn spin(&self) -> &SpinEngine {
        &self.spin
    }

    #[must_use]
    pub fn layouts(&self) -> &LayoutStore {
        &self.layouts
    }

    #[must_use]
    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The host should deliver frame ticks.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.spin.is_spinning()
    }

    #[must_use]
    pub fn config_mode(&self) -> bool {
        self.gestures.config_mode()
    }

    // --- Server input ---

    /// Apply one inbound message.
    pub fn handle_message(&mut self, message: InboundMessage, now_ms: f64, timers: &mut TimerQueue) {
        match message {
            InboundMessage::TriggerAction(trigger) => self.handle_trigger(&trigger, now_ms, timers),
            InboundMessage::ConfigUpdate(update) => {
                for position in &update.positions {
                    let layout = self.layouts.apply_server_layout(position);
                    debug!(
                        widget = %position.element,
                        x = layout.x,
                        y = layout.y,
                        scale = layout.scale,
                        "layout: server update"
                    );
                    self.renderer.apply_layout(&position.element, &layout);
                }
            }
            InboundMessage::Ping => trace!("overlay: ping"),
            InboundMessage::CommandExecuted(cmd) => {
                info!(command = %cmd.command, user = %cmd.user_name, "overlay: command executed");
            }
            InboundMessage::TtsMessage(tts) => {
                info!(user = %tts.user_name, language = %tts.language, message = %tts.message, "overlay: tts");
            }
            InboundMessage::SoundPlayed(sound) => info!(sound = %sound.sound_name, "overlay: sound played"),
            InboundMessage::Unknown { kind } => debug!(%kind, "overlay: ignoring unknown message type"),
        }
    }

    fn handle_trigger(&mut self, trigger: &TriggerAction, now_ms: f64, timers: &mut TimerQueue) {
        if trigger.action_type != SPIN_WHEEL_ACTION {
            info!(action_type = %trigger.action_type, "overlay: ignoring trigger for unsupported action");
            return;
        }
        let request = match SpinRequest::from_data(&trigger.data) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "spin: malformed trigger");
                return;
            }
        };
        let items = request
            .items
            .iter()
            .map(|label| WheelItem { label: label.clone(), action: request.action_for(label).cloned() })
            .collect();
        let plan = SpinPlan::random(&mut self.rng);
        self.spin.trigger(items, plan, now_ms, timers, &mut self.renderer);
    }

    // --- Time ---

    /// Advance the spin animation. Returns the `wheel_result` on the frame
    /// that completes a spin.
    pub fn tick(&mut self, now_ms: f64, timers: &mut TimerQueue) -> Option<OutboundMessage> {
        let SpinOutcome { label, action, .. } = self.spin.tick(now_ms, timers, &mut self.renderer)?;
        match action.as_ref().and_then(WheelAction::from_payload) {
            Some(summary) => info!(result = %label, action = %summary, "spin: result"),
            None => info!(result = %label, has_action = action.is_some(), "spin: result"),
        }
        Some(OutboundMessage::WheelResult { result: label, action })
    }

    /// Route a fired timer. Returns `false` if no component owns it.
    pub fn on_timer(&mut self, fired: Fired, now_ms: f64, timers: &mut TimerQueue) -> bool {
        self.spin.on_timer(fired.id, now_ms, timers, &mut self.renderer)
    }

    // --- Local input ---

    /// Current bounds of every known widget, in paint order.
    #[must_use]
    pub fn widget_rects(&self) -> Vec<(&str, Rect)> {
        self.layouts
            .iter()
            .map(|(name, layout)| {
                let rect = self.renderer.widget_rect(name).unwrap_or_else(|| {
                    self.viewport.widget_rect(layout.center(), WIDGET_BASE_SIZE_PX, layout.scale)
                });
                (name, rect)
            })
            .collect()
    }

    /// Press at a pixel position; the target is found by hit testing.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        let target = hit_test(at, &self.widget_rects());
        self.pointer_down_on(&target, at)
    }

    /// Press on a known target.
    pub fn pointer_down_on(&mut self, target: &PointerTarget, at: Point) -> bool {
        self.gestures.pointer_down(target, at, &self.layouts)
    }

    pub fn pointer_move(&mut self, at: Point) {
        self.gestures.pointer_move(at, &mut self.layouts, self.viewport, &mut self.renderer);
    }

    /// Release; returns the `position_update` for a finished gesture.
    pub fn pointer_up(&mut self, at: Point) -> Option<OutboundMessage> {
        self.gestures.pointer_up(at, &mut self.layouts, self.viewport, &mut self.renderer)
    }

    /// Handle a key press. Returns `true` if the key did something.
    pub fn key_down(&mut self, key: &Key) -> bool {
        if key.is_config_toggle() {
            self.toggle_config_mode();
            return true;
        }
        false
    }

    pub fn set_config_mode(&mut self, enabled: bool) -> bool {
        let changed = self.gestures.set_config_mode(enabled, &mut self.layouts, &mut self.renderer);
        if changed {
            info!(enabled, "overlay: config mode");
        }
        changed
    }

    /// Flip configuration mode; returns the new mode.
    pub fn toggle_config_mode(&mut self) -> bool {
        let enabled = !self.config_mode();
        self.set_config_mode(enabled);
        enabled
    }

    /// Restore every known widget's default layout. Returns the updates to send.
    pub fn reset_layout(&mut self) -> Vec<OutboundMessage> {
        self.gestures.cancel(&mut self.layouts, &mut self.renderer);
        let updates = self.layouts.reset();
        for (name, layout) in self.layouts.iter() {
            self.renderer.apply_layout(name, &layout);
        }
        info!(widgets = updates.len(), "layout: reset");
        updates
    }

    /// Resize the overlay surface. Invalid sizes are ignored.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_valid() {
            warn!(width = viewport.width, height = viewport.height, "overlay: ignoring invalid viewport");
            return false;
        }
        self.viewport = viewport;
        self.renderer.set_viewport(viewport);
        true
    }

    pub fn connection_changed(&mut self, state: ConnectionState) {
        self.renderer.set_connection_state(state);
    }

    /// Drop pending spin timers and any active gesture.
    pub fn shutdown(&mut self, timers: &mut TimerQueue) {
        self.spin.cancel_timers(timers);
        self.gestures.cancel(&mut self.layouts, &mut self.renderer);
    }
}
