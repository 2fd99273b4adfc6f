//! Integration tests: config → draw sequence → surfaces (thumb-render).

use kurbo::Point;
use pretty_assertions::assert_eq;
use thumb_core::{
    AccentColor, Layout, PhotoRole, TextAlign, TextOverlay, ThumbnailConfig, cover_fit, place_photo,
    plan_layout,
};
use thumb_render::{
    CanvasRenderer, DrawOp, ExportError, FontBook, ImageError, ImageState, Paint, PixmapSurface,
    RasterImage, RecordingSurface, find_text_at_position, overlay_hit_box,
};

fn load(json: &str) -> ThumbnailConfig {
    ThumbnailConfig::from_json(json).unwrap()
}

fn record(renderer: &CanvasRenderer, config: &ThumbnailConfig) -> RecordingSurface<'static> {
    let mut surface = RecordingSurface::new(config.width as f64, config.height as f64);
    renderer.render(&mut surface, config, None);
    surface
}

fn solid_image(key: &str, w: u32, h: u32) -> RasterImage {
    RasterImage::from_rgba(key, w, h, vec![200; (w * h * 4) as usize]).unwrap()
}

// ─── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn centered_hello_renders_one_highlighted_line() {
    let config = load(include_str!("fixtures/centered_hello.json"));
    let mut renderer = CanvasRenderer::default();
    renderer.images_mut().sync(&config);
    assert!(renderer.images_mut().take_pending().is_empty());

    let surface = record(&renderer, &config);
    assert!(surface.images().is_empty(), "no photo draws attempted");

    let texts: Vec<_> = surface
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillText { text, at, style } => Some((text.clone(), *at, style.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(texts.len(), 1);
    let (text, at, style) = &texts[0];
    assert_eq!(text, "HELLO");
    assert_eq!(at.x, 640.0);
    assert_eq!(at.y, 360.0);
    assert_eq!(style.align, TextAlign::Center);
    assert_eq!(style.color, thumb_core::Color::WHITE);

    let orange = AccentColor::Orange.color().with_alpha(0.7);
    let highlight = surface
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Fill {
                shape,
                paint: Paint::Solid(c),
            } if *c == orange => Some(shape.rect()),
            _ => None,
        })
        .expect("orange highlight box");
    assert!(highlight.contains(Point::new(640.0, 360.0)));
    assert!((highlight.center().x - 640.0).abs() < 1e-9);
}

#[test]
fn two_face_with_only_host_leaves_guest_zone_empty() {
    let config = load(include_str!("fixtures/two_face_host_only.json"));
    assert_eq!(config.layout_kind(), Layout::TwoFace);

    let mut renderer = CanvasRenderer::default();
    renderer.images_mut().sync(&config);
    let tickets = renderer.images_mut().take_pending();
    assert_eq!(tickets.len(), 1);
    assert!(renderer.images_mut().complete(&tickets[0], Ok(solid_image(&tickets[0].url, 500, 1000))));

    let surface = record(&renderer, &config);
    assert_eq!(surface.images(), vec!["https://cdn.example.com/host.png"]);

    let plan = plan_layout(config.layout_kind(), config.viewport(), true);
    let zone = plan.zone_for(PhotoRole::Host).unwrap();
    let placed = place_photo(&zone, config.host_photo.as_ref().unwrap());
    let fit = cover_fit(500.0, 1000.0, placed).unwrap();
    let drawn = surface
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Image { src, dst, .. } => Some((*src, *dst)),
            _ => None,
        })
        .unwrap();
    assert_eq!(drawn, (fit.crop, fit.target));
    assert!(drawn.1.x1 < 640.0, "host sits in the left zone");
}

// ─── Image loads ─────────────────────────────────────────────────────────

#[test]
fn stale_completion_is_discarded() {
    let mut config = load(include_str!("fixtures/two_face_host_only.json"));
    let mut renderer = CanvasRenderer::default();

    renderer.images_mut().sync(&config);
    let first = renderer.images_mut().take_pending().remove(0);

    config.host_photo.as_mut().unwrap().url = "https://cdn.example.com/other.png".into();
    renderer.images_mut().sync(&config);
    let second = renderer.images_mut().take_pending().remove(0);

    // The old URL resolves late: nothing to redraw, nothing cached.
    assert!(!renderer.images_mut().complete(&first, Ok(solid_image(&first.url, 10, 10))));
    assert!(renderer.images().state(&first.url).is_none());
    assert!(matches!(renderer.images().state(&second.url), Some(ImageState::Loading)));

    assert!(renderer.images_mut().complete(&second, Ok(solid_image(&second.url, 10, 10))));
    assert!(!renderer.images_mut().complete(&second, Ok(solid_image(&second.url, 10, 10))));
    assert_eq!(renderer.images().loaded_count(), 1);

    let surface = record(&renderer, &config);
    assert_eq!(surface.images(), vec!["https://cdn.example.com/other.png"]);
}

#[test]
fn failed_load_leaves_zone_empty_and_renders_the_rest() {
    let config = load(include_str!("fixtures/two_face_host_only.json"));
    let mut renderer = CanvasRenderer::default();
    renderer.images_mut().sync(&config);
    let ticket = renderer.images_mut().take_pending().remove(0);

    let redraw = renderer
        .images_mut()
        .complete(&ticket, Err(ImageError::Unavailable("404".into())));
    assert!(!redraw);
    assert!(matches!(renderer.images().state(&ticket.url), Some(ImageState::Failed)));

    let surface = record(&renderer, &config);
    assert!(surface.images().is_empty());
    assert_eq!(surface.texts(), vec!["BUILDING", "IN PUBLIC"]);
}

#[test]
fn out_of_range_scale_never_collapses_the_photo() {
    let json = r#"{
        "layout": "soloRight",
        "hostPhoto": { "url": "data:image/png;base64,AAAA", "scale": -400 }
    }"#;
    let config = load(json);
    assert_eq!(config.host_photo.as_ref().unwrap().scale_factor(), 0.5);

    let plan = plan_layout(config.layout_kind(), config.viewport(), true);
    let placed = place_photo(&plan.host.unwrap(), config.host_photo.as_ref().unwrap());
    assert!(placed.width() > 0.0 && placed.height() > 0.0);
}

// ─── Hit testing against what was drawn ──────────────────────────────────

#[test]
fn pointer_at_visual_center_hits_the_drawn_overlay() {
    let mut config = ThumbnailConfig::default();
    for (i, align) in [TextAlign::Left, TextAlign::Center, TextAlign::Right]
        .into_iter()
        .enumerate()
    {
        let mut overlay = TextOverlay::new(format!("Overlay {i}"), 200.0 + 400.0 * i as f64, 500.0);
        overlay.text_align = align;
        overlay.font_size = 36.0;
        config.overlays.push(overlay);
    }

    let selected = config.overlays[2].id;
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    CanvasRenderer::default().render(&mut surface, &config, Some(selected));

    for overlay in &config.overlays {
        let center = overlay.bounds(&surface).center();
        assert_eq!(
            find_text_at_position(&surface, &config.overlays, center),
            Some(overlay.id)
        );
    }
    assert_eq!(
        surface.dashed_rects(),
        vec![overlay_hit_box(&surface, &config.overlays[2])]
    );
}

// ─── Raster export ───────────────────────────────────────────────────────

#[test]
fn raster_surface_composites_dark_overlay() {
    let mut config = ThumbnailConfig {
        width: 64,
        height: 36,
        background_color: "#ff0000".into(),
        ..Default::default()
    };
    config.background_effects.dark_overlay = 50.0;

    let fonts = FontBook::new();
    let mut surface = PixmapSurface::new(64, 36, &fonts).unwrap();
    CanvasRenderer::default().render(&mut surface, &config, None);

    let [r, g, b, a] = surface.pixel(32, 18).unwrap();
    assert!((r as i32 - 128).abs() <= 2, "red channel {r}");
    assert_eq!((g, b, a), (0, 0, 255));
}

#[test]
fn export_matches_configured_size_and_skips_selection() {
    let mut config = load(include_str!("fixtures/centered_hello.json"));
    config.width = 400;
    config.height = 225;
    config.overlays.push(TextOverlay::new("Selected", 200.0, 200.0));

    let renderer = CanvasRenderer::default();
    let fonts = FontBook::with_system_fallback();
    match renderer.export_png(&config, &fonts) {
        Ok(png) => {
            let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (400, 225));
        }
        Err(ExportError::NoFonts) => assert!(fonts.is_empty()),
        Err(e) => panic!("export failed: {e}"),
    }

    // The interactive render of the same config does draw the indicator.
    let mut surface = RecordingSurface::new(400.0, 225.0);
    renderer.render(&mut surface, &config, Some(config.overlays[0].id));
    assert_eq!(surface.dashed_rects().len(), 1);
}
