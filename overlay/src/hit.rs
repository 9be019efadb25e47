#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::RESIZE_HANDLE_PX;
use crate::input::PointerTarget;
use crate::viewport::{Point, Rect};

/// Square handle anchored inside the bottom-right corner of `rect`.
#[must_use]
pub fn resize_handle_rect(rect: Rect) -> Rect {
    let size = RESIZE_HANDLE_PX.min(rect.width).min(rect.height);
    Rect { x: rect.x + rect.width - size, y: rect.y + rect.height - size, width: size, height: size }
}

/// Find what is under `px`, given widget bounds in paint order (last on top).
///
/// Resize handles are checked across all widgets before any body so a handle
/// overlapping another widget still wins.
#[must_use]
pub fn hit_test(px: Point, widgets: &[(&str, Rect)]) -> PointerTarget {
    if let Some((name, _)) = widgets.iter().rev().find(|(_, r)| resize_handle_rect(*r).contains(px)) {
        return PointerTarget::ResizeHandle((*name).to_owned());
    }
    if let Some((name, _)) = widgets.iter().rev().find(|(_, r)| r.contains(px)) {
        return PointerTarget::Body((*name).to_owned());
    }
    PointerTarget::Background
}
