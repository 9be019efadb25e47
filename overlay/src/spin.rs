//! Spin engine: the wheel's trigger → spin → result → idle lifecycle.
//!
//! PHASES
//! ======
//! - `Idle`: no session. A trigger is accepted only here.
//! - `Spinning`: frames advance the rotation along an ease-out curve for a
//!   fixed duration. The frame that reaches full progress computes the winner
//!   and switches to `ShowingResult` in the same call, so [`SpinEngine::is_busy`]
//!   never reads false while a result is pending.
//! - `ShowingResult`: the label is shown, then faded, then cleared, at which
//!   point the engine is `Idle` again. An independent hide timer removes the
//!   wheel container.
//!
//! TIMERS
//! ======
//! The engine owns the ids of its fade, clear, and hide timers. Accepting a
//! trigger cancels all three before anything else, so a timer from a finished
//! session can never clear or hide a newer one.
//!
//! The result is handed back exactly once, from the completing frame, not after
//! the display window.

#[cfg(test)]
#[path = "spin_test.rs"]
mod spin_test;

use std::f64::consts::TAU;

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::consts::{
    RESULT_DISPLAY_MS, RESULT_FADE_MS, SPIN_BASE_TURNS, SPIN_DURATION_MS, SPIN_EXTRA_TURNS, WIDGET_HIDE_MS,
};
use crate::render::Renderer;
use crate::timers::{TimerId, TimerKind, TimerQueue};

/// One slice of the wheel.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelItem {
    pub label: String,
    /// Opaque payload echoed back in the result when this slice wins.
    pub action: Option<Value>,
}

impl WheelItem {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), action: None }
    }

    #[must_use]
    pub fn with_action(mut self, action: Value) -> Self {
        self.action = Some(action);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Spinning,
    ShowingResult,
}

/// The two random draws that shape a spin, each uniform in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPlan {
    /// Fraction of [`SPIN_EXTRA_TURNS`] added to the base turns.
    pub turns: f64,
    /// Sub-turn offset as a fraction of a full turn.
    pub offset: f64,
}

impl SpinPlan {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self { turns: rng.random::<f64>(), offset: rng.random::<f64>() }
    }

    /// Total rotation in radians: `(3 + turns·3)` full turns plus `offset` of a turn.
    #[must_use]
    pub fn total_rotation(&self) -> f64 {
        (SPIN_BASE_TURNS + self.turns * SPIN_EXTRA_TURNS) * TAU + self.offset * TAU
    }
}

/// Timing of the lifecycle, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTiming {
    pub spin_ms: f64,
    pub result_display_ms: f64,
    pub fade_ms: f64,
    pub hide_ms: f64,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            spin_ms: SPIN_DURATION_MS,
            result_display_ms: RESULT_DISPLAY_MS,
            fade_ms: RESULT_FADE_MS,
            hide_ms: WIDGET_HIDE_MS,
        }
    }
}

/// An in-flight spin.
#[derive(Debug, Clone)]
pub struct SpinSession {
    pub id: Uuid,
    pub started_ms: f64,
    pub start_rotation: f64,
    pub total_rotation: f64,
}

/// The winning slice of a completed spin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub index: usize,
    pub label: String,
    pub action: Option<Value>,
}

/// `1 − (1 − p)³`, with `p` clamped to `[0, 1]`.
#[must_use]
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Index of the slice under the fixed top pointer.
///
/// `rotation` is measured clockwise from the first slice's start. The pointer
/// sees the slice at angle `2π − (rotation mod 2π)`. Returns `None` when there
/// are no slices.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn winner_index(rotation: f64, item_count: usize) -> Option<usize> {
    if item_count == 0 || !rotation.is_finite() {
        return None;
    }
    let normalized = rotation.rem_euclid(TAU);
    let pointer = (TAU - normalized).rem_euclid(TAU);
    let slice = TAU / item_count as f64;
    let index = (pointer / slice).floor() as usize;
    Some(index.min(item_count - 1))
}

#[derive(Debug, Default)]
pub struct SpinEngine {
    phase: Phase,
    timing: SpinTiming,
    items: Vec<WheelItem>,
    /// Current angle; persists between spins so each starts where the last stopped.
    rotation: f64,
    session: Option<SpinSession>,
    last_result: Option<SpinOutcome>,
    fade_timer: Option<TimerId>,
    clear_timer: Option<TimerId>,
    hide_timer: Option<TimerId>,
}

impl SpinEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timing(timing: SpinTiming) -> Self {
        Self { timing, ..Self::default() }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A spin or its result display is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Frames are needed.
    #[must_use]
    pub fn is_spinning(&self) -> bool {
        self.phase == Phase::Spinning
    }

    #[must_use]
    pub fn items(&self) -> &[WheelItem] {
        &self.items
    }

    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    #[must_use]
    pub fn session(&self) -> Option<&SpinSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&SpinOutcome> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub fn timing(&self) -> SpinTiming {
        self.timing
    }

    /// Ids of the fade, clear, and hide timers currently held.
    #[must_use]
    pub fn pending_timers(&self) -> Vec<TimerId> {
        [self.fade_timer, self.clear_timer, self.hide_timer].into_iter().flatten().collect()
    }

    /// Start a spin. Returns `false` without touching any state when the
    /// engine is busy or `items` is empty.
    pub fn trigger(
        &mut self,
        items: Vec<WheelItem>,
        plan: SpinPlan,
        now_ms: f64,
        timers: &mut TimerQueue,
        renderer: &mut dyn Renderer,
    ) -> bool {
        if self.is_busy() {
            debug!(phase = ?self.phase, "spin: trigger rejected, engine busy");
            return false;
        }
        if items.is_empty() {
            debug!("spin: trigger rejected, no items");
            return false;
        }

        self.cancel_timers(timers);

        let session = SpinSession {
            id: Uuid::new_v4(),
            started_ms: now_ms,
            start_rotation: self.rotation,
            total_rotation: plan.total_rotation(),
        };
        info!(
            session_id = %session.id,
            items = items.len(),
            total_rotation = session.total_rotation,
            "spin: started"
        );

        self.items = items;
        self.session = Some(session);
        self.phase = Phase::Spinning;

        renderer.clear_result();
        renderer.set_visible(true);
        renderer.draw_wheel(&self.items, self.rotation);
        true
    }

    /// Advance one animation frame. Returns the outcome on the frame that
    /// completes the spin and `None` on every other call.
    pub fn tick(&mut self, now_ms: f64, timers: &mut TimerQueue, renderer: &mut dyn Renderer) -> Option<SpinOutcome> {
        if self.phase != Phase::Spinning {
            return None;
        }
        let session = self.session.as_ref()?;

        let elapsed = (now_ms - session.started_ms).max(0.0);
        let progress = if self.timing.spin_ms > 0.0 { (elapsed / self.timing.spin_ms).min(1.0) } else { 1.0 };
        self.rotation = session.start_rotation + session.total_rotation * ease_out_cubic(progress);

        if progress < 1.0 {
            renderer.draw_wheel(&self.items, self.rotation);
            return None;
        }

        self.rotation = self.rotation.rem_euclid(TAU);
        renderer.draw_wheel(&self.items, self.rotation);
        self.finish(now_ms, timers, renderer)
    }

    fn finish(&mut self, now_ms: f64, timers: &mut TimerQueue, renderer: &mut dyn Renderer) -> Option<SpinOutcome> {
        let index = winner_index(self.rotation, self.items.len())?;
        let item = self.items.get(index)?;
        let outcome = SpinOutcome { index, label: item.label.clone(), action: item.action.clone() };

        self.phase = Phase::ShowingResult;
        self.cancel_timers(timers);
        self.fade_timer = Some(timers.schedule(TimerKind::ResultFade, now_ms, self.timing.result_display_ms));
        self.hide_timer = Some(timers.schedule(TimerKind::WidgetHide, now_ms, self.timing.hide_ms));

        info!(
            session_id = %self.session.as_ref().map(|s| s.id).unwrap_or_default(),
            index,
            label = %outcome.label,
            "spin: finished"
        );
        renderer.show_result(&outcome.label);
        self.last_result = Some(outcome.clone());
        Some(outcome)
    }

    /// Handle a fired timer. Returns `false` if the id is not one this engine holds.
    pub fn on_timer(&mut self, id: TimerId, now_ms: f64, timers: &mut TimerQueue, renderer: &mut dyn Renderer) -> bool {
        if self.fade_timer == Some(id) {
            self.fade_timer = None;
            renderer.fade_result();
            self.clear_timer = Some(timers.schedule(TimerKind::ResultClear, now_ms, self.timing.fade_ms));
            true
        } else if self.clear_timer == Some(id) {
            self.clear_timer = None;
            renderer.clear_result();
            self.phase = Phase::Idle;
            self.session = None;
            debug!("spin: idle");
            true
        } else if self.hide_timer == Some(id) {
            self.hide_timer = None;
            renderer.set_visible(false);
            true
        } else {
            false
        }
    }

    /// Cancel every timer this engine holds.
    pub fn cancel_timers(&mut self, timers: &mut TimerQueue) {
        timers.cancel_slot(&mut self.fade_timer);
        timers.cancel_slot(&mut self.clear_timer);
        timers.cancel_slot(&mut self.hide_timer);
    }
}
