//! Hit testing: point → overlay lookup.
//!
//! Overlays are drawn in list order, so the walk runs in reverse
//! (last painted = topmost). Boxes come from the same measurement the
//! renderer uses, padded for easier grabbing.

use kurbo::{Point, Rect};
use thumb_core::{ElementId, TextMeasure, TextOverlay};

/// Grab padding around each overlay's drawn box, in canvas pixels.
pub const HIT_PADDING: f64 = 8.0;

pub fn overlay_hit_box<M: TextMeasure + ?Sized>(measure: &M, overlay: &TextOverlay) -> Rect {
    overlay.bounds(measure).inflate(HIT_PADDING, HIT_PADDING)
}

/// Find the topmost overlay whose padded box contains `point`.
/// Returns `None` over empty canvas.
pub fn find_text_at_position<M: TextMeasure + ?Sized>(
    measure: &M,
    overlays: &[TextOverlay],
    point: Point,
) -> Option<ElementId> {
    overlays
        .iter()
        .rev()
        .find(|o| overlay_hit_box(measure, o).contains(point))
        .map(|o| o.id)
}
