//! Drag and resize gestures in configuration mode.
//!
//! A press on a widget body starts a drag, a press on its resize handle starts
//! a resize; one gesture never does both. Moves update the layout store and the
//! renderer immediately. Release produces the single `position_update` for the
//! gesture. Outside configuration mode every pointer event is a no-op.
//!
//! On drag release the final center is read back from the renderer's geometry
//! rather than from the accumulated pointer delta, so what is saved is where
//! the widget actually landed.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use frames::OutboundMessage;
use tracing::debug;

use crate::consts::RESIZE_PX_PER_SCALE;
use crate::input::{GestureState, PointerTarget};
use crate::layout::{LayoutStore, WidgetLayout, clamp_scale};
use crate::render::Renderer;
use crate::viewport::{Point, Viewport};

#[derive(Debug, Default)]
pub struct GestureController {
    config_mode: bool,
    state: GestureState,
}

impl GestureController {
    #[must_use]
    pub fn new(config_mode: bool) -> Self {
        Self { config_mode, state: GestureState::Idle }
    }

    #[must_use]
    pub fn config_mode(&self) -> bool {
        self.config_mode
    }

    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Turn configuration mode on or off. Leaving it abandons any active
    /// gesture and restores the widget to where the gesture began.
    /// Returns `true` if the mode changed.
    pub fn set_config_mode(&mut self, enabled: bool, layouts: &mut LayoutStore, renderer: &mut dyn Renderer) -> bool {
        if self.config_mode == enabled {
            return false;
        }
        self.cancel(layouts, renderer);
        self.config_mode = enabled;
        renderer.set_config_mode(enabled);
        debug!(enabled, "gesture: config mode changed");
        true
    }

    /// Abandon the active gesture, restoring the widget's starting layout.
    pub fn cancel(&mut self, layouts: &mut LayoutStore, renderer: &mut dyn Renderer) {
        let restored = match std::mem::take(&mut self.state) {
            GestureState::Idle => return,
            GestureState::Dragging { widget, start_center, .. } => {
                let layout = layouts.set_position(&widget, start_center.x, start_center.y);
                (widget, layout)
            }
            GestureState::Resizing { widget, start_scale, .. } => {
                let layout = layouts.set_scale(&widget, start_scale);
                (widget, layout)
            }
        };
        debug!(widget = %restored.0, "gesture: canceled");
        renderer.apply_layout(&restored.0, &restored.1);
    }

    /// Begin a gesture. Returns `true` if one started.
    pub fn pointer_down(&mut self, target: &PointerTarget, at: Point, layouts: &LayoutStore) -> bool {
        if !self.config_mode {
            debug!("gesture: ignored, not in config mode");
            return false;
        }
        if self.state.is_active() {
            debug!("gesture: ignored, gesture already active");
            return false;
        }
        self.state = match target {
            PointerTarget::ResizeHandle(widget) => GestureState::Resizing {
                widget: widget.clone(),
                start_pointer: at,
                start_scale: layouts.layout_or_default(widget).scale,
            },
            PointerTarget::Body(widget) => GestureState::Dragging {
                widget: widget.clone(),
                start_pointer: at,
                start_center: layouts.layout_or_default(widget).center(),
            },
            PointerTarget::Background => return false,
        };
        debug!(state = ?self.state, "gesture: started");
        true
    }

    /// Apply a pointer move to the active gesture. Returns the widget's live
    /// layout, or `None` when no gesture is active.
    pub fn pointer_move(
        &mut self,
        at: Point,
        layouts: &mut LayoutStore,
        viewport: Viewport,
        renderer: &mut dyn Renderer,
    ) -> Option<WidgetLayout> {
        let (widget, layout) = match &self.state {
            GestureState::Idle => return None,
            GestureState::Dragging { widget, start_pointer, start_center } => {
                let delta = viewport.delta_to_percent(at.x - start_pointer.x, at.y - start_pointer.y);
                let layout = layouts.set_position(widget, start_center.x + delta.x, start_center.y + delta.y);
                (widget, layout)
            }
            GestureState::Resizing { widget, start_pointer, start_scale } => {
                let layout = layouts.set_scale(widget, resized_scale(*start_scale, *start_pointer, at));
                (widget, layout)
            }
        };
        renderer.apply_layout(widget, &layout);
        Some(layout)
    }

    /// Finish the active gesture and return the update to send.
    pub fn pointer_up(
        &mut self,
        at: Point,
        layouts: &mut LayoutStore,
        viewport: Viewport,
        renderer: &mut dyn Renderer,
    ) -> Option<OutboundMessage> {
        self.pointer_move(at, layouts, viewport, renderer)?;
        let widget = match std::mem::take(&mut self.state) {
            GestureState::Idle => return None,
            GestureState::Dragging { widget, .. } | GestureState::Resizing { widget, .. } => widget,
        };

        let current = layouts.layout_or_default(&widget);
        let center = renderer
            .widget_rect(&widget)
            .map_or_else(|| current.center(), |rect| viewport.px_to_percent(rect.center()));
        let msg = layouts.apply_local_edit(&widget, center.x, center.y, current.scale);
        if let Some(layout) = layouts.get(&widget) {
            renderer.apply_layout(&widget, &layout);
        }
        debug!(%widget, x = center.x, y = center.y, scale = current.scale, "gesture: released");
        Some(msg)
    }
}

/// Scale after dragging the resize handle from `start` to `at`: the larger of
/// the two axis deltas, at [`RESIZE_PX_PER_SCALE`] pixels per unit.
#[must_use]
pub fn resized_scale(start_scale: f64, start: Point, at: Point) -> f64 {
    let delta = (at.x - start.x).max(at.y - start.y);
    clamp_scale(start_scale + delta / RESIZE_PX_PER_SCALE)
}
