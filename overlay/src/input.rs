//! Input model: pointer targets, keys, and the gesture state machine.
//!
//! The host hit-tests pointer-down itself and reports what was pressed as a
//! [`PointerTarget`]. `GestureState` is the gesture tracked between
//! pointer-down and pointer-up, carrying what is needed to compute live
//! updates and the final layout on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// Key that toggles configuration mode.
pub const TOGGLE_CONFIG_KEY: &str = "c";

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// The body of a widget; starts a drag.
    Body(String),
    /// A widget's resize handle; starts a resize. Wins over `Body` when the
    /// handle sits inside the widget.
    ResizeHandle(String),
    /// Nothing interactive.
    Background,
}

impl PointerTarget {
    /// Widget the target belongs to.
    #[must_use]
    pub fn widget(&self) -> Option<&str> {
        match self {
            Self::Body(w) | Self::ResizeHandle(w) => Some(w),
            Self::Background => None,
        }
    }
}

/// A keyboard key as reported by the host (e.g. `"c"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Whether this is the configuration-mode toggle. Case-insensitive.
    #[must_use]
    pub fn is_config_toggle(&self) -> bool {
        self.0.eq_ignore_ascii_case(TOGGLE_CONFIG_KEY)
    }
}

/// Active gesture between pointer-down and pointer-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Moving a widget.
    Dragging {
        widget: String,
        /// Pointer position at pointer-down, in pixels.
        start_pointer: Point,
        /// Widget center at pointer-down, in viewport percent.
        start_center: Point,
    },
    /// Scaling a widget from its handle.
    Resizing {
        widget: String,
        /// Pointer position at pointer-down, in pixels.
        start_pointer: Point,
        start_scale: f64,
    },
}

impl GestureState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Widget under manipulation.
    #[must_use]
    pub fn widget(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Dragging { widget, .. } | Self::Resizing { widget, .. } => Some(widget),
        }
    }
}
