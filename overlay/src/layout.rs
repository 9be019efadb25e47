//! Per-widget layout store.
//!
//! Each widget has a center position in viewport percent and a scale factor.
//! Three paths mutate it: a server `config_update` (full replacement), a local
//! drag (position), and a local resize (scale). Every path clamps scale into
//! [`MIN_SCALE`, `MAX_SCALE`]. The store performs no I/O; local edits hand back
//! the `position_update` message and the caller decides whether to send it.
//!
//! A server push and a local edit for the same widget are applied in whatever
//! order they arrive; the last one wins.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::collections::BTreeMap;

use frames::{OutboundMessage, WidgetPosition};

use crate::consts::{DEFAULT_CENTER_PCT, DEFAULT_SCALE, KNOWN_WIDGETS, MAX_SCALE, MIN_SCALE};
use crate::viewport::Point;

/// Clamp a scale into the allowed range. Non-finite input falls back to the
/// default scale.
#[must_use]
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() { scale.clamp(MIN_SCALE, MAX_SCALE) } else { DEFAULT_SCALE }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetLayout {
    /// Center x, percent of viewport width.
    pub x: f64,
    /// Center y, percent of viewport height.
    pub y: f64,
    pub scale: f64,
}

impl Default for WidgetLayout {
    fn default() -> Self {
        Self { x: DEFAULT_CENTER_PCT, y: DEFAULT_CENTER_PCT, scale: DEFAULT_SCALE }
    }
}

impl WidgetLayout {
    /// Build a layout with `scale` clamped.
    #[must_use]
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale: clamp_scale(scale) }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutStore {
    widgets: BTreeMap<String, WidgetLayout>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStore {
    /// A store holding the built-in default for every known widget.
    #[must_use]
    pub fn new() -> Self {
        let widgets = KNOWN_WIDGETS
            .iter()
            .map(|name| ((*name).to_owned(), WidgetLayout::default()))
            .collect();
        Self { widgets }
    }

    /// Current layout of `widget`, if it is known.
    #[must_use]
    pub fn get(&self, widget: &str) -> Option<WidgetLayout> {
        self.widgets.get(widget).copied()
    }

    /// Current layout of `widget`, or the built-in default.
    #[must_use]
    pub fn layout_or_default(&self, widget: &str) -> WidgetLayout {
        self.get(widget).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, WidgetLayout)> {
        self.widgets.iter().map(|(name, layout)| (name.as_str(), *layout))
    }

    /// Replace a widget's layout with a server push. A missing scale becomes
    /// the default scale.
    pub fn apply_server_layout(&mut self, update: &WidgetPosition) -> WidgetLayout {
        let layout = WidgetLayout::new(update.x, update.y, update.scale.unwrap_or(DEFAULT_SCALE));
        self.widgets.insert(update.element.clone(), layout);
        layout
    }

    /// Record a finished local edit and return the message announcing it.
    pub fn apply_local_edit(&mut self, widget: &str, x: f64, y: f64, scale: f64) -> OutboundMessage {
        let layout = WidgetLayout::new(x, y, scale);
        self.widgets.insert(widget.to_owned(), layout);
        position_update(widget, layout)
    }

    /// Live drag feedback: move a widget without producing a message.
    pub fn set_position(&mut self, widget: &str, x: f64, y: f64) -> WidgetLayout {
        let entry = self.widgets.entry(widget.to_owned()).or_default();
        entry.x = x;
        entry.y = y;
        *entry
    }

    /// Live resize feedback: rescale a widget without producing a message.
    pub fn set_scale(&mut self, widget: &str, scale: f64) -> WidgetLayout {
        let entry = self.widgets.entry(widget.to_owned()).or_default();
        entry.scale = clamp_scale(scale);
        *entry
    }

    /// Restore every known widget to its default. Returns one update per
    /// widget, wheel first, ready for the controller.
    pub fn reset(&mut self) -> Vec<OutboundMessage> {
        KNOWN_WIDGETS
            .iter()
            .map(|name| {
                let layout = WidgetLayout::default();
                self.widgets.insert((*name).to_owned(), layout);
                position_update(name, layout)
            })
            .collect()
    }
}

fn position_update(widget: &str, layout: WidgetLayout) -> OutboundMessage {
    OutboundMessage::PositionUpdate { element: widget.to_owned(), x: layout.x, y: layout.y, scale: layout.scale }
}
