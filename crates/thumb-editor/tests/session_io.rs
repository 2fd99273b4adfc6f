//! Integration tests: image loads, export and store round trips through
//! an `EditorSession`.

use pretty_assertions::assert_eq;
use thumb_core::{
    MemoryStore, PhotoConfig, PhotoRole, StoreError, TextLine, ThumbnailConfig, ThumbnailId,
    ThumbnailStore,
};
use thumb_editor::{ConfigMutation, EditorSession};
use thumb_render::{ExportError, ImageError, RasterImage, RecordingSurface};

fn image(key: &str) -> RasterImage {
    RasterImage::from_rgba(key, 4, 8, vec![90; 4 * 8 * 4]).unwrap()
}

fn with_host(session: &mut EditorSession, url: &str) {
    session.apply(ConfigMutation::SetPhoto {
        role: PhotoRole::Host,
        photo: PhotoConfig::new(url),
    });
}

// ─── Image loads ─────────────────────────────────────────────────────────

#[test]
fn completed_load_requests_exactly_one_redraw() {
    let mut session = EditorSession::default();
    with_host(&mut session, "https://img.example/host-a.png");
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    session.render(&mut surface);

    let tickets = session.pending_loads();
    assert_eq!(tickets.len(), 1);
    assert!(session.pending_loads().is_empty(), "tickets are handed out once");

    assert!(session.complete_load(&tickets[0], Ok(image(&tickets[0].url))));
    assert!(session.needs_redraw());

    surface.clear();
    session.render(&mut surface);
    assert_eq!(surface.images(), vec!["https://img.example/host-a.png"]);
    assert!(!session.needs_redraw());
}

#[test]
fn superseded_url_never_reaches_the_canvas() {
    let mut session = EditorSession::default();
    with_host(&mut session, "https://img.example/host-a.png");
    let old = session.pending_loads().remove(0);
    with_host(&mut session, "https://img.example/host-b.png");
    let new = session.pending_loads().remove(0);

    let mut surface = RecordingSurface::new(1280.0, 720.0);
    session.render(&mut surface);

    assert!(!session.complete_load(&old, Ok(image(&old.url))));
    assert!(!session.needs_redraw());

    assert!(session.complete_load(&new, Ok(image(&new.url))));
    surface.clear();
    session.render(&mut surface);
    assert_eq!(surface.images(), vec!["https://img.example/host-b.png"]);
}

#[test]
fn failed_load_is_quiet() {
    let mut session = EditorSession::default();
    with_host(&mut session, "https://img.example/missing.png");
    let ticket = session.pending_loads().remove(0);
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    session.render(&mut surface);

    assert!(!session.complete_load(&ticket, Err(ImageError::Unavailable("timeout".into()))));
    assert!(!session.needs_redraw());
}

#[test]
fn undo_brings_back_a_cached_image_without_reloading() {
    let mut session = EditorSession::default();
    with_host(&mut session, "https://img.example/host-a.png");
    let ticket = session.pending_loads().remove(0);
    session.complete_load(&ticket, Ok(image(&ticket.url)));

    session.apply(ConfigMutation::ClearPhoto {
        role: PhotoRole::Host,
    });
    session.undo();
    assert!(session.pending_loads().is_empty());

    let mut surface = RecordingSurface::new(1280.0, 720.0);
    session.render(&mut surface);
    assert_eq!(surface.images(), vec!["https://img.example/host-a.png"]);
}

// ─── Export ──────────────────────────────────────────────────────────────

#[test]
fn export_uses_current_size() {
    let mut session = EditorSession::default();
    session.apply(ConfigMutation::Resize {
        width: 320,
        height: 180,
    });
    let png = session.export_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 180));
    assert!(session.export_data_uri().unwrap().starts_with("data:image/png;base64,"));
}

#[test]
fn export_of_text_without_fonts_is_an_error() {
    let mut session = EditorSession::default();
    session.apply(ConfigMutation::AddTextLine(TextLine::new("BIG NEWS", true)));
    assert!(matches!(session.export_png(), Err(ExportError::NoFonts)));
    assert!(matches!(session.export_data_uri(), Err(ExportError::NoFonts)));
}

// ─── Store ───────────────────────────────────────────────────────────────

#[test]
fn save_then_open_round_trips() {
    let mut store = MemoryStore::new();
    let mut session = EditorSession::default();
    session.apply(ConfigMutation::SetLayout("twoFace".into()));
    session.apply(ConfigMutation::SetBackgroundColor(
        "linear-gradient(90deg, #000000 0%, #ffffff 100%)".into(),
    ));
    let id = session.save(&mut store).unwrap();

    let mut reopened = EditorSession::default();
    reopened.open(&store, &id).unwrap();
    assert_eq!(reopened.config(), session.config());
    assert_eq!(reopened.document_id(), Some(&id));
    assert!(!reopened.can_undo(), "history starts fresh");
}

#[test]
fn opening_unknown_id_keeps_current_config() {
    let store = MemoryStore::new();
    let mut session = EditorSession::default();
    session.apply(ConfigMutation::SetBackgroundColor("#abcdef".into()));

    let missing = ThumbnailId::new("nope").unwrap();
    let err = session.open(&store, &missing).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));
    assert_eq!(session.config().background_color, "#abcdef");
}

#[test]
fn legacy_blob_opens_with_defaults() {
    let mut store = MemoryStore::new();
    let id = ThumbnailId::new("legacy_1").unwrap();
    store.insert_raw(
        id.clone(),
        r#"{"layout":"stacked","textLines":[{"text":"OLD"}],"accentColor":"teal"}"#,
    );

    let mut session = EditorSession::default();
    session.open(&store, &id).unwrap();
    let config: &ThumbnailConfig = session.config();
    assert_eq!(config.layout, "stacked");
    assert_eq!(config.width, 1280);
    assert_eq!(config.text_lines[0].text, "OLD");

    session.save(&mut store).unwrap();
    assert_eq!(store.list().unwrap(), vec![id]);
}
