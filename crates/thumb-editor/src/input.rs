//! Input abstraction layer.
//!
//! Pointer events arrive in display coordinates (CSS pixels of the
//! on-screen canvas element) and are mapped to canvas pixels with a
//! linear scale before any hit testing.

use kurbo::Point;

/// A normalized pointer event in display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// Pointer left the canvas element.
    Leave,
}

impl PointerEvent {
    /// Extract position if the event carries one.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::Down { x, y } | Self::Move { x, y } | Self::Up { x, y } => Some((*x, *y)),
            Self::Leave => None,
        }
    }
}

/// Display → canvas mapping for a canvas drawn at a different on-screen size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl ViewTransform {
    pub fn new(canvas_width: f64, canvas_height: f64, display_width: f64, display_height: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            display_width,
            display_height,
        }
    }

    /// Canvas shown at its own size.
    pub fn identity(width: f64, height: f64) -> Self {
        Self::new(width, height, width, height)
    }

    /// Per-axis scale factors. A zero-sized (or not yet laid out) display
    /// maps 1:1.
    pub fn scale(&self) -> (f64, f64) {
        let axis = |canvas: f64, display: f64| {
            if display > 0.0 && display.is_finite() && canvas > 0.0 {
                canvas / display
            } else {
                1.0
            }
        };
        (
            axis(self.canvas_width, self.display_width),
            axis(self.canvas_height, self.display_height),
        )
    }

    pub fn to_canvas(&self, x: f64, y: f64) -> Point {
        let (sx, sy) = self.scale();
        Point::new(x * sx, y * sy)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity(
            thumb_core::DEFAULT_WIDTH as f64,
            thumb_core::DEFAULT_HEIGHT as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_size_display_doubles_coordinates() {
        let view = ViewTransform::new(1280.0, 720.0, 640.0, 360.0);
        assert_eq!(view.to_canvas(100.0, 50.0), Point::new(200.0, 100.0));
    }

    #[test]
    fn axes_scale_independently() {
        let view = ViewTransform::new(1280.0, 720.0, 1280.0, 360.0);
        assert_eq!(view.scale(), (1.0, 2.0));
    }

    #[test]
    fn zero_sized_display_is_identity() {
        let view = ViewTransform::new(1280.0, 720.0, 0.0, 0.0);
        assert_eq!(view.to_canvas(12.0, 34.0), Point::new(12.0, 34.0));
    }

    #[test]
    fn leave_has_no_position() {
        assert_eq!(PointerEvent::Leave.position(), None);
        assert_eq!(PointerEvent::Move { x: 1.0, y: 2.0 }.position(), Some((1.0, 2.0)));
    }
}
