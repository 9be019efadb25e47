//! Shared numeric constants for the overlay crate.

// ── Spin lifecycle ──────────────────────────────────────────────

/// Length of one spin animation.
pub const SPIN_DURATION_MS: f64 = 4000.0;

/// How long the winning label stays fully visible.
pub const RESULT_DISPLAY_MS: f64 = 3000.0;

/// Fade-out of the winning label after the display window.
pub const RESULT_FADE_MS: f64 = 500.0;

/// Delay after a result before the wheel container is hidden.
pub const WIDGET_HIDE_MS: f64 = 4000.0;

/// Minimum number of full turns in a spin; a random extra of up to
/// [`SPIN_EXTRA_TURNS`] is added on top.
pub const SPIN_BASE_TURNS: f64 = 3.0;

/// Upper bound (exclusive) on random extra turns.
pub const SPIN_EXTRA_TURNS: f64 = 3.0;

// ── Transport ───────────────────────────────────────────────────

/// Fixed delay between a lost connection and the next attempt.
pub const RECONNECT_DELAY_MS: f64 = 3000.0;

// ── Layout ──────────────────────────────────────────────────────

pub const MIN_SCALE: f64 = 0.3;
pub const MAX_SCALE: f64 = 3.0;
pub const DEFAULT_SCALE: f64 = 1.0;

/// Default widget center, in viewport percent on both axes.
pub const DEFAULT_CENTER_PCT: f64 = 50.0;

/// Pointer travel, in pixels, per unit of scale change while resizing.
pub const RESIZE_PX_PER_SCALE: f64 = 200.0;

/// Edge length of the square resize handle at a widget's bottom-right corner.
pub const RESIZE_HANDLE_PX: f64 = 24.0;

/// Unscaled edge length of a widget's square bounding box, in CSS pixels.
pub const WIDGET_BASE_SIZE_PX: f64 = 400.0;

/// Widget whose layout the spin engine drives.
pub const WHEEL_WIDGET: &str = "wheel";

/// Widgets the controller persists layout for, in reset order.
pub const KNOWN_WIDGETS: [&str; 4] = [WHEEL_WIDGET, "alert", "image", "text"];
