//! Headless renderer: keeps the displayed state and reports it through `tracing`.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::BTreeMap;

use overlay::connection::ConnectionState;
use overlay::consts::WIDGET_BASE_SIZE_PX;
use overlay::layout::WidgetLayout;
use overlay::render::Renderer;
use overlay::spin::WheelItem;
use overlay::viewport::{Rect, Viewport};
use tracing::{debug, info, trace};

#[derive(Debug, Default)]
pub struct TraceRenderer {
    viewport: Viewport,
    layouts: BTreeMap<String, WidgetLayout>,
    labels: Vec<String>,
    rotation: f64,
    result: Option<String>,
    fading: bool,
    visible: bool,
    config_mode: bool,
    connection: ConnectionState,
}

impl TraceRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Multi-line description of what is on screen.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut head = format!(
            "connection={} config_mode={} viewport={}x{} wheel_visible={} rotation={:.3}",
            self.connection, self.config_mode, self.viewport.width, self.viewport.height, self.visible, self.rotation,
        );
        if !self.labels.is_empty() {
            head.push_str(&format!(" items=[{}]", self.labels.join(", ")));
        }
        if let Some(result) = &self.result {
            head.push_str(&format!(" result={result:?}{}", if self.fading { " (fading)" } else { "" }));
        }
        let mut lines = vec![head];
        lines.extend(
            self.layouts
                .iter()
                .map(|(name, l)| format!("  {name}: x={:.1}% y={:.1}% scale={:.2}", l.x, l.y, l.scale)),
        );
        lines.join("\n")
    }
}

impl Renderer for TraceRenderer {
    fn draw_wheel(&mut self, items: &[WheelItem], rotation: f64) {
        if self.labels.len() != items.len() || self.labels.iter().zip(items).any(|(l, i)| *l != i.label) {
            self.labels = items.iter().map(|i| i.label.clone()).collect();
            debug!(items = ?self.labels, "render: wheel items");
        }
        self.rotation = rotation;
        trace!(rotation, "render: frame");
    }

    fn show_result(&mut self, label: &str) {
        info!(%label, "render: result shown");
        self.result = Some(label.to_owned());
        self.fading = false;
    }

    fn fade_result(&mut self) {
        debug!("render: result fading");
        self.fading = true;
    }

    fn clear_result(&mut self) {
        if self.result.take().is_some() {
            debug!("render: result cleared");
        }
        self.fading = false;
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            debug!(visible, "render: wheel visibility");
        }
        self.visible = visible;
    }

    fn apply_layout(&mut self, widget: &str, layout: &WidgetLayout) {
        trace!(%widget, x = layout.x, y = layout.y, scale = layout.scale, "render: layout");
        self.layouts.insert(widget.to_owned(), *layout);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        debug!(width = viewport.width, height = viewport.height, "render: viewport");
        self.viewport = viewport;
    }

    fn set_config_mode(&mut self, enabled: bool) {
        self.config_mode = enabled;
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        info!(%state, "render: connection status");
        self.connection = state;
    }

    fn widget_rect(&self, widget: &str) -> Option<Rect> {
        let layout = self.layouts.get(widget)?;
        Some(self.viewport.widget_rect(layout.center(), WIDGET_BASE_SIZE_PX, layout.scale))
    }
}
