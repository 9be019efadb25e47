//! Test renderer that records every call.

use std::collections::HashMap;

use crate::connection::ConnectionState;
use crate::consts::WIDGET_BASE_SIZE_PX;
use crate::layout::WidgetLayout;
use crate::render::Renderer;
use crate::spin::WheelItem;
use crate::viewport::{Rect, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Draw { labels: Vec<String>, rotation: f64 },
    ShowResult(String),
    FadeResult,
    ClearResult,
    Visible(bool),
    Layout { widget: String, layout: WidgetLayout },
    Viewport(Viewport),
    ConfigMode(bool),
    Connection(ConnectionState),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<Call>,
    pub viewport: Viewport,
    pub layouts: HashMap<String, WidgetLayout>,
    /// Geometry to report instead of the computed one.
    pub rect_override: HashMap<String, Rect>,
}

impl RecordingRenderer {
    pub fn draws(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Draw { .. })).count()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn last_rotation(&self) -> Option<f64> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Draw { rotation, .. } => Some(*rotation),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn draw_wheel(&mut self, items: &[WheelItem], rotation: f64) {
        let labels = items.iter().map(|i| i.label.clone()).collect();
        self.calls.push(Call::Draw { labels, rotation });
    }

    fn show_result(&mut self, label: &str) {
        self.calls.push(Call::ShowResult(label.to_owned()));
    }

    fn fade_result(&mut self) {
        self.calls.push(Call::FadeResult);
    }

    fn clear_result(&mut self) {
        self.calls.push(Call::ClearResult);
    }

    fn set_visible(&mut self, visible: bool) {
        self.calls.push(Call::Visible(visible));
    }

    fn apply_layout(&mut self, widget: &str, layout: &WidgetLayout) {
        self.layouts.insert(widget.to_owned(), *layout);
        self.calls.push(Call::Layout { widget: widget.to_owned(), layout: *layout });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.calls.push(Call::Viewport(viewport));
    }

    fn set_config_mode(&mut self, enabled: bool) {
        self.calls.push(Call::ConfigMode(enabled));
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        self.calls.push(Call::Connection(state));
    }

    fn widget_rect(&self, widget: &str) -> Option<Rect> {
        if let Some(rect) = self.rect_override.get(widget) {
            return Some(*rect);
        }
        let layout = self.layouts.get(widget)?;
        Some(self.viewport.widget_rect(layout.center(), WIDGET_BASE_SIZE_PX, layout.scale))
    }
}
