#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

/// A point in pixel or viewport-percentage space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Size of the overlay surface in CSS pixels.
///
/// Widget positions are stored as percentages of this size so a layout saved
/// at one resolution lands in the same place at another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1920.0, height: 1080.0 }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Convert a pixel position to viewport percent.
    #[must_use]
    pub fn px_to_percent(&self, px: Point) -> Point {
        Point { x: px.x / self.width * 100.0, y: px.y / self.height * 100.0 }
    }

    /// Convert a viewport-percent position to pixels.
    #[must_use]
    pub fn percent_to_px(&self, pct: Point) -> Point {
        Point { x: pct.x * self.width / 100.0, y: pct.y * self.height / 100.0 }
    }

    /// Convert a pixel delta to a percent delta.
    #[must_use]
    pub fn delta_to_percent(&self, dx: f64, dy: f64) -> Point {
        self.px_to_percent(Point { x: dx, y: dy })
    }

    /// Bounding box of a widget centered at `center_pct` with square edge
    /// `base_px * scale`.
    #[must_use]
    pub fn widget_rect(&self, center_pct: Point, base_px: f64, scale: f64) -> Rect {
        let center = self.percent_to_px(center_pct);
        let size = base_px * scale;
        Rect { x: center.x - size / 2.0, y: center.y - size / 2.0, width: size, height: size }
    }
}
