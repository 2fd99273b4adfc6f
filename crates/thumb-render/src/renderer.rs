//! The draw sequence: background → effects → photos → headline → overlays.
//!
//! Every config change triggers a full redraw from the top; nothing is
//! cached between frames except decoded images.

use crate::bitmap::encode_data_uri;
use crate::cache::ImageCache;
use crate::fonts::FontBook;
use crate::hit::overlay_hit_box;
use crate::pixmap::PixmapSurface;
use crate::surface::{Paint, Shadow, Surface, TextStyle};
use kurbo::{Point, Rect, RoundedRect, RoundedRectRadii, Vec2};
use smallvec::smallvec;
use thiserror::Error;
use thumb_core::{
    Color, ElementId, FontSpec, GradientStop, PhotoRole, TextAlign, ThumbnailConfig, Viewport,
    clip_radius, cover_fit, parse_linear_gradient, place_photo, plan_layout,
};

// ─── Look constants ──────────────────────────────────────────────────────

/// Fill used when the background string is neither a color nor a valid
/// `linear-gradient(...)`.
const FALLBACK_FILL: Color = Color::rgba(26.0 / 255.0, 26.0 / 255.0, 26.0 / 255.0, 1.0); // #1A1A1A
const TINT_ALPHA: f32 = 0.3;
const VIGNETTE_INNER: f64 = 0.3;

const HEADLINE_FAMILY: &str = "Inter, sans-serif";
const HEADLINE_WEIGHT: u16 = 700;
const HEADLINE_SIZE: f32 = 80.0;
const LINE_HEIGHT: f64 = 112.0; // 1.4 × 80px
const HIGHLIGHT_PAD_X: f64 = 20.0;
const HIGHLIGHT_PAD_Y: f64 = 10.0;
const HIGHLIGHT_RADIUS: f64 = 8.0;

const HEADLINE_SHADOW: Shadow = Shadow {
    color: Color::rgba(0.0, 0.0, 0.0, 0.5),
    blur: 8.0,
    offset: Vec2::new(0.0, 4.0),
};
const OVERLAY_SHADOW: Shadow = Shadow {
    color: Color::rgba(0.0, 0.0, 0.0, 0.8),
    blur: 4.0,
    offset: Vec2::new(2.0, 2.0),
};
const OUTLINE_COLOR: Color = Color::BLACK;
const SELECTION_COLOR: Color = Color::rgba(79.0 / 255.0, 195.0 / 255.0, 247.0 / 255.0, 1.0); // #4FC3F7
const SELECTION_DASH: [f64; 2] = [6.0, 4.0];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot export a {width}x{height} canvas")]
    InvalidSize { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("no fonts registered; cannot draw text")]
    NoFonts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Draw the guest photo in the right third of the centered layout.
    pub guest_in_centered: bool,
    /// Draw the dashed indicator around the selected overlay.
    pub show_selection: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            guest_in_centered: true,
            show_selection: true,
        }
    }
}

/// Font used for every headline line.
pub fn headline_font() -> FontSpec {
    FontSpec::new(HEADLINE_FAMILY, HEADLINE_WEIGHT, HEADLINE_SIZE)
}

#[derive(Debug, Default)]
pub struct CanvasRenderer {
    pub options: RenderOptions,
    images: ImageCache,
}

impl CanvasRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            images: ImageCache::new(),
        }
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// Draw the whole thumbnail, with the selection indicator when enabled.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        config: &ThumbnailConfig,
        selected: Option<ElementId>,
    ) {
        let selected = selected.filter(|_| self.options.show_selection);
        self.draw(surface, config, selected);
    }

    /// Re-run the draw sequence off-screen, without selection, as PNG.
    ///
    /// Fails with [`ExportError::NoFonts`] rather than dropping the text of
    /// a config that has some when `fonts` is empty.
    pub fn export_png(&self, config: &ThumbnailConfig, fonts: &FontBook) -> Result<Vec<u8>, ExportError> {
        if fonts.is_empty() && has_text(config) {
            return Err(ExportError::NoFonts);
        }
        let (width, height) = (config.width, config.height);
        let mut surface = PixmapSurface::new(width, height, fonts)
            .ok_or(ExportError::InvalidSize { width, height })?;
        self.draw(&mut surface, config, None);
        let png = surface.encode_png().map_err(ExportError::Encode)?;
        log::debug!("exported {width}x{height} PNG ({} bytes)", png.len());
        Ok(png)
    }

    /// [`CanvasRenderer::export_png`] as a `data:image/png;base64,` URI.
    pub fn export_data_uri(&self, config: &ThumbnailConfig, fonts: &FontBook) -> Result<String, ExportError> {
        Ok(encode_data_uri("image/png", &self.export_png(config, fonts)?))
    }

    fn draw<S: Surface + ?Sized>(&self, surface: &mut S, config: &ThumbnailConfig, selected: Option<ElementId>) {
        let vp = config.viewport();
        log::trace!(
            "render {}x{} layout={} lines={} overlays={}",
            vp.width,
            vp.height,
            config.layout_kind().as_str(),
            config.text_lines.len(),
            config.overlays.len()
        );

        surface.save();
        self.draw_background(surface, config, vp);
        draw_effects(surface, config, vp);
        self.draw_photos(surface, config, vp);
        draw_headline(surface, config, vp);
        draw_overlays(surface, config, selected);
        surface.restore();
    }

    // ─── Background ──────────────────────────────────────────────────────

    fn draw_background<S: Surface + ?Sized>(&self, surface: &mut S, config: &ThumbnailConfig, vp: Viewport) {
        let canvas = vp.rect();
        let image = config
            .background_image
            .as_deref()
            .and_then(|url| self.images.get(url));

        if let Some(image) = image
            && let Some(fit) = cover_fit(image.width() as f64, image.height() as f64, canvas)
        {
            surface.fill_rect(canvas, &Paint::Solid(Color::BLACK));
            surface.save();
            surface.set_alpha(config.background_alpha());
            surface.draw_image(image, fit.crop, fit.target);
            surface.restore();
            return;
        }

        surface.fill_rect(canvas, &background_paint(&config.background_color, vp));
    }

    // ─── Photos ──────────────────────────────────────────────────────────

    fn draw_photos<S: Surface + ?Sized>(&self, surface: &mut S, config: &ThumbnailConfig, vp: Viewport) {
        let plan = plan_layout(config.layout_kind(), vp, self.options.guest_in_centered);

        for role in [PhotoRole::Host, PhotoRole::Guest] {
            let (Some(zone), Some(photo)) = (plan.zone_for(role), config.photo(role)) else {
                continue;
            };
            let Some(image) = self.images.get(&photo.url) else {
                continue;
            };
            let placed = place_photo(&zone, photo);
            let Some(fit) = cover_fit(image.width() as f64, image.height() as f64, placed) else {
                continue;
            };

            let radius = clip_radius(zone.clip, placed);
            surface.save();
            if radius > 0.0 {
                let radii = RoundedRectRadii::new(radius, radius, 0.0, 0.0);
                surface.clip(&RoundedRect::from_rect(placed, radii));
            }
            surface.draw_image(image, fit.crop, fit.target);
            surface.restore();
        }
    }
}

fn has_text(config: &ThumbnailConfig) -> bool {
    let visible = |t: &str| !t.trim().is_empty();
    config.text_lines.iter().any(|l| visible(&l.text)) || config.overlays.iter().any(|o| visible(&o.text))
}

/// Gradient, solid color, or the fixed fallback fill.
fn background_paint(background: &str, vp: Viewport) -> Paint {
    let trimmed = background.trim();
    if trimmed
        .get(..15)
        .is_some_and(|p| p.eq_ignore_ascii_case("linear-gradient"))
    {
        return match parse_linear_gradient(trimmed) {
            Some(gradient) => {
                let (start, end) = gradient.endpoints(vp.width, vp.height);
                Paint::Linear {
                    start,
                    end,
                    stops: gradient.stops,
                }
            }
            None => {
                log::debug!("malformed background gradient {trimmed:?}");
                Paint::Solid(FALLBACK_FILL)
            }
        };
    }
    Paint::Solid(Color::parse(trimmed).unwrap_or(FALLBACK_FILL))
}

// ─── Effects ─────────────────────────────────────────────────────────────

fn draw_effects<S: Surface + ?Sized>(surface: &mut S, config: &ThumbnailConfig, vp: Viewport) {
    let canvas = vp.rect();
    let effects = &config.background_effects;

    let dark = effects.dark_alpha();
    if dark > 0.0 {
        surface.fill_rect(canvas, &Paint::Solid(Color::BLACK.with_alpha(dark)));
    }

    if let Some(tint) = effects.color_tint.color() {
        surface.fill_rect(canvas, &Paint::Solid(tint.with_alpha(TINT_ALPHA)));
    }

    let vignette = effects.vignette_alpha();
    if vignette > 0.0 {
        let center = canvas.center();
        surface.fill_rect(
            canvas,
            &Paint::Radial {
                center,
                inner_radius: vp.width.min(vp.height) * VIGNETTE_INNER,
                outer_radius: vp.width.hypot(vp.height) / 2.0,
                stops: smallvec![
                    GradientStop {
                        offset: 0.0,
                        color: Color::TRANSPARENT,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: Color::BLACK.with_alpha(vignette),
                    },
                ],
            },
        );
    }
}

// ─── Headline ────────────────────────────────────────────────────────────

/// Baseline-middle Y of each headline line, block centered vertically.
pub fn headline_line_centers(count: usize, vp: Viewport) -> Vec<f64> {
    let top = vp.height / 2.0 - LINE_HEIGHT * count as f64 / 2.0;
    (0..count)
        .map(|i| top + LINE_HEIGHT * (i as f64 + 0.5))
        .collect()
}

fn highlight_box(x: f64, y: f64, width: f64, align: TextAlign) -> Rect {
    let left = align.left_edge(x, width);
    let half = HEADLINE_SIZE as f64 / 2.0;
    Rect::new(
        left - HIGHLIGHT_PAD_X,
        y - half - HIGHLIGHT_PAD_Y,
        left + width + HIGHLIGHT_PAD_X,
        y + half + HIGHLIGHT_PAD_Y,
    )
}

fn draw_headline<S: Surface + ?Sized>(surface: &mut S, config: &ThumbnailConfig, vp: Viewport) {
    if config.text_lines.is_empty() {
        return;
    }
    let plan = plan_layout(config.layout_kind(), vp, false);
    let style = TextStyle {
        font: headline_font(),
        align: plan.text_align,
        color: Color::WHITE,
    };
    let accent = Paint::Solid(config.accent_color.color().with_alpha(config.element_alpha()));
    let centers = headline_line_centers(config.text_lines.len(), vp);

    for (line, y) in config.text_lines.iter().zip(centers) {
        if line.highlight && !line.text.is_empty() {
            let width = surface.measure_text(&style.font, &line.text).width;
            let rect = highlight_box(plan.text_x, y, width, plan.text_align);
            surface.fill(&RoundedRect::from_rect(rect, HIGHLIGHT_RADIUS), &accent);
        }
        surface.save();
        surface.set_shadow(Some(HEADLINE_SHADOW));
        surface.fill_text(&line.text, Point::new(plan.text_x, y), &style);
        surface.restore();
    }
}

// ─── Overlays ────────────────────────────────────────────────────────────

fn draw_overlays<S: Surface + ?Sized>(surface: &mut S, config: &ThumbnailConfig, selected: Option<ElementId>) {
    for overlay in &config.overlays {
        let style = TextStyle {
            font: overlay.font(),
            align: overlay.text_align,
            color: overlay.fill_color(),
        };
        let at = Point::new(overlay.x, overlay.y);

        surface.save();
        if overlay.shadow {
            surface.set_shadow(Some(OVERLAY_SHADOW));
        }
        if overlay.outline {
            let outline = TextStyle {
                color: OUTLINE_COLOR,
                ..style.clone()
            };
            let width = (style.font.size as f64 * 0.08).max(2.0);
            surface.stroke_text(&overlay.text, at, &outline, width);
        }
        surface.fill_text(&overlay.text, at, &style);
        surface.restore();

        if selected == Some(overlay.id) {
            let rect = overlay_hit_box(&*surface, overlay);
            surface.stroke_rect(rect, SELECTION_COLOR, 2.0, Some(SELECTION_DASH));
        }
    }
}
