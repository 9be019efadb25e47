//! Renderer interface.
//!
//! The engine never draws. It tells a [`Renderer`] what changed: the wheel's
//! items and rotation, the result label lifecycle, container visibility,
//! widget layouts, configuration mode, and connection status. Implementations
//! may paint a canvas, write to a terminal, or record calls for tests.
//!
//! The renderer is also the source of truth for rendered geometry:
//! [`Renderer::widget_rect`] reports where a widget actually sits, which the
//! gesture controller reads on release instead of trusting accumulated deltas.

use crate::connection::ConnectionState;
use crate::layout::WidgetLayout;
use crate::spin::WheelItem;
use crate::viewport::{Rect, Viewport};

pub trait Renderer {
    /// Draw the wheel's slices for `items`, rotated clockwise by `rotation`
    /// radians from the first slice's start.
    fn draw_wheel(&mut self, items: &[WheelItem], rotation: f64);

    /// Display the winning label.
    fn show_result(&mut self, label: &str);

    /// Begin fading the winning label out.
    fn fade_result(&mut self) {}

    /// Remove the winning label.
    fn clear_result(&mut self);

    /// Show or hide the wheel container.
    fn set_visible(&mut self, visible: bool);

    /// Place a widget.
    fn apply_layout(&mut self, widget: &str, layout: &WidgetLayout);

    /// The overlay surface changed size.
    fn set_viewport(&mut self, _viewport: Viewport) {}

    /// Configuration mode turned on or off (drag/resize affordances).
    fn set_config_mode(&mut self, _enabled: bool) {}

    /// Connection status indicator.
    fn set_connection_state(&mut self, _state: ConnectionState) {}

    /// Rendered bounding box of `widget` in CSS pixels, if it is on screen.
    fn widget_rect(&self, _widget: &str) -> Option<Rect> {
        None
    }
}
