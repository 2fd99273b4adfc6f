//! Overlay drag controller.
//!
//! ```text
//!   Idle ──down on overlay──▶ Dragging(id, offset)
//!    ▲                            │ move → overlay at pointer − offset
//!    └──────── up / leave ────────┘
//! ```
//!
//! A down over empty canvas clears the selection and stays idle.

use kurbo::{Point, Vec2};
use thumb_core::{ElementId, TextOverlay};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        id: ElementId,
        /// Pointer position minus the overlay anchor at press time.
        offset: Vec2,
    },
}

/// Outcome of a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Press {
    /// Hit an overlay; it is now selected and being dragged.
    Grab(ElementId),
    /// Hit nothing; selection cleared.
    Miss,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start dragging `hit`, or go idle when nothing was hit.
    pub fn press(&mut self, hit: Option<&TextOverlay>, pointer: Point) -> Press {
        match hit {
            Some(overlay) => {
                let offset = pointer - Point::new(overlay.x, overlay.y);
                self.state = DragState::Dragging {
                    id: overlay.id,
                    offset,
                };
                Press::Grab(overlay.id)
            }
            None => {
                self.state = DragState::Idle;
                Press::Miss
            }
        }
    }

    /// New anchor for the dragged overlay, if a drag is active.
    pub fn drag_to(&self, pointer: Point) -> Option<(ElementId, Point)> {
        match self.state {
            DragState::Dragging { id, offset } => Some((id, pointer - offset)),
            DragState::Idle => None,
        }
    }

    /// End the drag (pointer up or leave). Returns the overlay that was
    /// being dragged.
    pub fn release(&mut self) -> Option<ElementId> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { id, .. } => Some(id),
            DragState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_keeps_pointer_offset() {
        let overlay = TextOverlay::new("Drag", 100.0, 100.0);
        let mut drag = DragController::new();

        assert_eq!(drag.press(Some(&overlay), Point::new(110.0, 95.0)), Press::Grab(overlay.id));
        assert_eq!(
            drag.drag_to(Point::new(150.0, 195.0)),
            Some((overlay.id, Point::new(140.0, 200.0)))
        );
    }

    #[test]
    fn miss_goes_idle() {
        let overlay = TextOverlay::new("Drag", 100.0, 100.0);
        let mut drag = DragController::new();
        drag.press(Some(&overlay), Point::new(100.0, 100.0));

        assert_eq!(drag.press(None, Point::new(0.0, 0.0)), Press::Miss);
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.drag_to(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn release_ends_drag_once() {
        let overlay = TextOverlay::new("Drag", 10.0, 10.0);
        let mut drag = DragController::new();
        drag.press(Some(&overlay), Point::new(10.0, 10.0));

        assert_eq!(drag.release(), Some(overlay.id));
        assert!(!drag.is_dragging());
        assert_eq!(drag.release(), None);
    }
}
