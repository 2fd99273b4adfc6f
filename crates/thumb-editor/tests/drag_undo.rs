//! Integration tests: pointer drag + undo/redo (thumb-editor).
//!
//! Drives an `EditorSession` the way the canvas host does and checks the
//! config, selection and history that come out the other side.

use kurbo::Point;
use pretty_assertions::assert_eq;
use thumb_core::{ElementId, ThumbnailConfig};
use thumb_editor::{ConfigMutation, EditorSession, PointerEvent};
use thumb_render::RecordingSurface;

fn session() -> EditorSession {
    let config = ThumbnailConfig::from_json(include_str!("fixtures/overlay_drag.json")).unwrap();
    EditorSession::new(config)
}

fn position(session: &EditorSession, id: &str) -> (f64, f64) {
    let overlay = session.config().overlay(ElementId::intern(id)).unwrap();
    (overlay.x, overlay.y)
}

/// Anchor of the caption; center-aligned with a middle baseline, so it is
/// also the visual center of its box.
const CAPTION: Point = Point::new(400.0, 300.0);

fn center_of(session: &EditorSession, id: &str) -> Point {
    let overlay = session.config().overlay(ElementId::intern(id)).unwrap();
    overlay.bounds(session.fonts()).center()
}

// ─── Drag ────────────────────────────────────────────────────────────────

#[test]
fn drag_moves_overlay_by_pointer_delta() {
    let mut session = session();
    let start = CAPTION;

    session.pointer(PointerEvent::Down { x: start.x, y: start.y });
    session.pointer(PointerEvent::Move {
        x: start.x + 10.0,
        y: start.y + 20.0,
    });
    session.pointer(PointerEvent::Up {
        x: start.x + 10.0,
        y: start.y + 20.0,
    });

    assert_eq!(position(&session, "caption"), (410.0, 320.0));
    assert_eq!(session.selected(), Some(ElementId::intern("caption")));
}

#[test]
fn drag_maps_display_coordinates() {
    let mut session = session();
    session.set_display_size(640.0, 360.0);
    let start = CAPTION;

    session.pointer_down(start.x / 2.0, start.y / 2.0);
    session.pointer_move(start.x / 2.0 + 5.0, start.y / 2.0 + 10.0);
    session.pointer_up();

    assert_eq!(position(&session, "caption"), (410.0, 320.0));
}

#[test]
fn leave_ends_the_drag() {
    let mut session = session();
    let start = CAPTION;

    session.pointer_down(start.x, start.y);
    session.pointer_leave();
    session.pointer_move(start.x + 50.0, start.y + 50.0);

    assert_eq!(position(&session, "caption"), (400.0, 300.0));
}

#[test]
fn press_on_empty_canvas_clears_selection() {
    let mut session = session();
    let start = center_of(&session, "badge");
    session.pointer_down(start.x, start.y);
    session.pointer_up();
    assert_eq!(session.selected(), Some(ElementId::intern("badge")));

    session.pointer_down(5.0, 700.0);
    assert_eq!(session.selected(), None);
    session.pointer_move(100.0, 100.0);
    assert_eq!(position(&session, "badge"), (1100.0, 80.0));
}

#[test]
fn selection_indicator_follows_the_dragged_overlay() {
    let mut session = session();
    let start = CAPTION;
    session.pointer_down(start.x, start.y);
    session.pointer_move(start.x + 100.0, start.y);

    let mut surface = RecordingSurface::new(1280.0, 720.0);
    session.render(&mut surface);
    let rects = surface.dashed_rects();
    assert_eq!(rects.len(), 1);
    assert!(rects[0].contains(Point::new(500.0, 300.0)));
}

// ─── Undo / redo ─────────────────────────────────────────────────────────

#[test]
fn whole_drag_is_one_undo_step() {
    let mut session = session();
    let start = CAPTION;

    session.pointer_down(start.x, start.y);
    for step in 1..=5 {
        session.pointer_move(start.x + 10.0 * step as f64, start.y + 4.0 * step as f64);
    }
    session.pointer_up();
    assert_eq!(position(&session, "caption"), (450.0, 320.0));

    assert_eq!(session.undo().as_deref(), Some("Move text"));
    assert_eq!(position(&session, "caption"), (400.0, 300.0));
    assert!(!session.can_undo());

    assert_eq!(session.redo().as_deref(), Some("Move text"));
    assert_eq!(position(&session, "caption"), (450.0, 320.0));
}

#[test]
fn click_without_move_adds_no_history() {
    let mut session = session();
    let start = CAPTION;
    session.pointer_down(start.x, start.y);
    session.pointer_up();
    assert!(!session.can_undo());
}

#[test]
fn undo_mid_drag_closes_the_gesture_first() {
    let mut session = session();
    let start = CAPTION;
    session.pointer_down(start.x, start.y);
    session.pointer_move(start.x + 30.0, start.y);

    assert_eq!(session.undo().as_deref(), Some("Move text"));
    assert_eq!(position(&session, "caption"), (400.0, 300.0));

    // The gesture is over: further moves drag nothing.
    let before = session.config().clone();
    session.pointer_move(0.0, 0.0);
    assert_eq!(*session.config(), before);
}

#[test]
fn control_edits_interleave_with_drags() {
    let mut session = session();
    session.apply(ConfigMutation::SetBackgroundColor("#ff00ff".into()));

    let start = CAPTION;
    session.pointer_down(start.x, start.y);
    session.pointer_move(start.x + 10.0, start.y + 20.0);
    session.pointer_up();

    session.undo();
    assert_eq!(position(&session, "caption"), (400.0, 300.0));
    assert_eq!(session.config().background_color, "#ff00ff");
    session.undo();
    assert_eq!(session.config().background_color, "#101010");
}

#[test]
fn legacy_layout_name_survives_edits() {
    let mut session = session();
    session.apply(ConfigMutation::SetElementOpacity(55.0));
    assert_eq!(session.config().layout, "left-aligned");
}
