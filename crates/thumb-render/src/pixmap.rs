//! Off-screen raster surface on `tiny-skia`, used for PNG export.
//!
//! Text comes from the [`FontBook`]: each line is rasterized to a coverage
//! bitmap, tinted, and blitted through the current clip mask. Shadows are
//! drawn as offset copies without blur, and text outlines are approximated
//! by stamping the run around the stroke radius.

use crate::bitmap::RasterImage;
use crate::fonts::{FontBook, GlyphRun};
use crate::surface::{Paint, Shadow, Surface, TextStyle};
use kurbo::{PathEl, Point, Rect, RoundedRect, Shape};
use thumb_core::{Color, FontSpec, GradientStop, TextMeasure, TextMetrics};
use tiny_skia as sk;

#[derive(Clone)]
struct State {
    alpha: f32,
    shadow: Option<Shadow>,
    clip: Option<sk::Mask>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            shadow: None,
            clip: None,
        }
    }
}

pub struct PixmapSurface<'f> {
    pixmap: sk::Pixmap,
    fonts: &'f FontBook,
    state: State,
    stack: Vec<State>,
}

impl<'f> PixmapSurface<'f> {
    /// `None` for a zero or oversized canvas.
    pub fn new(width: u32, height: u32, fonts: &'f FontBook) -> Option<Self> {
        let mut pixmap = sk::Pixmap::new(width, height)?;
        pixmap.fill(sk::Color::TRANSPARENT);
        Some(Self {
            pixmap,
            fonts,
            state: State::default(),
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, String> {
        self.pixmap.encode_png().map_err(|e| e.to_string())
    }

    pub fn into_pixmap(self) -> sk::Pixmap {
        self.pixmap
    }

    fn shader(&self, paint: &Paint) -> Option<sk::Shader<'static>> {
        let alpha = self.state.alpha;
        match paint {
            Paint::Solid(c) => Some(sk::Shader::SolidColor(sk_color(c.with_alpha(alpha)))),
            Paint::Linear { start, end, stops } => sk::LinearGradient::new(
                sk_point(*start),
                sk_point(*end),
                sk_stops(stops, alpha, 0.0),
                sk::SpreadMode::Pad,
                sk::Transform::identity(),
            )
            .or_else(|| Some(sk::Shader::SolidColor(sk_color(paint.flat_color().with_alpha(alpha))))),
            Paint::Radial {
                center,
                inner_radius,
                outer_radius,
                stops,
            } => {
                if *outer_radius <= 0.0 {
                    return None;
                }
                let inner = (inner_radius / outer_radius).clamp(0.0, 1.0) as f32;
                sk::RadialGradient::new(
                    sk_point(*center),
                    sk_point(*center),
                    *outer_radius as f32,
                    sk_stops(stops, alpha, inner),
                    sk::SpreadMode::Pad,
                    sk::Transform::identity(),
                )
            }
        }
    }

    fn shadow_paint(&self) -> Option<(sk::Paint<'static>, sk::Transform)> {
        let shadow = self.state.shadow?;
        if shadow.color.a <= 0.0 {
            return None;
        }
        let paint = sk::Paint {
            shader: sk::Shader::SolidColor(sk_color(shadow.color.with_alpha(self.state.alpha))),
            anti_alias: true,
            ..Default::default()
        };
        let ts = sk::Transform::from_translate(shadow.offset.x as f32, shadow.offset.y as f32);
        Some((paint, ts))
    }

    /// Blit a glyph run tinted with `color`, top-left of the run at `(x, y)`.
    fn blit_run(&mut self, run: &GlyphRun, color: Color, x: f64, y: f64) {
        let [r, g, b, a] = color.to_rgba8();
        let mut data = Vec::with_capacity(run.coverage.len() * 4);
        for &cov in &run.coverage {
            let alpha = (cov as u32 * a as u32 + 127) / 255;
            let premul = |ch: u8| ((ch as u32 * alpha + 127) / 255) as u8;
            data.extend_from_slice(&[premul(r), premul(g), premul(b), alpha as u8]);
        }
        let Some(size) = sk::IntSize::from_wh(run.width, run.height) else {
            return;
        };
        let Some(tinted) = sk::Pixmap::from_vec(data, size) else {
            return;
        };
        let paint = sk::PixmapPaint {
            opacity: self.state.alpha,
            ..Default::default()
        };
        self.pixmap.draw_pixmap(
            x.round() as i32,
            y.round() as i32,
            tinted.as_ref(),
            &paint,
            sk::Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    /// Top-left of `run` for a middle-baseline draw anchored at `at`.
    fn run_origin(run: &GlyphRun, at: Point, style: &TextStyle) -> (f64, f64) {
        let m = run.metrics;
        let left = style.align.left_edge(at.x, m.width) - run.origin_x as f64;
        let baseline = at.y + (m.ascent - m.descent) / 2.0;
        (left, baseline - run.baseline as f64)
    }
}

impl TextMeasure for PixmapSurface<'_> {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics {
        self.fonts.measure_text(font, text)
    }
}

impl Surface for PixmapSurface<'_> {
    fn size(&self) -> (f64, f64) {
        (self.pixmap.width() as f64, self.pixmap.height() as f64)
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    fn fill(&mut self, shape: &RoundedRect, paint: &Paint) {
        let Some(path) = sk_path(shape) else {
            return;
        };
        if let Some((shadow, ts)) = self.shadow_paint() {
            self.pixmap
                .fill_path(&path, &shadow, sk::FillRule::Winding, ts, self.state.clip.as_ref());
        }
        let Some(shader) = self.shader(paint) else {
            return;
        };
        let paint = sk::Paint {
            shader,
            anti_alias: true,
            ..Default::default()
        };
        self.pixmap.fill_path(
            &path,
            &paint,
            sk::FillRule::Winding,
            sk::Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    fn clip(&mut self, shape: &RoundedRect) {
        let Some(path) = sk_path(shape) else {
            // Degenerate clip hides everything
            self.state.clip = sk::Mask::new(self.pixmap.width(), self.pixmap.height());
            return;
        };
        match self.state.clip.as_mut() {
            Some(mask) => {
                mask.intersect_path(&path, sk::FillRule::Winding, true, sk::Transform::identity())
            }
            None => {
                if let Some(mut mask) = sk::Mask::new(self.pixmap.width(), self.pixmap.height()) {
                    mask.fill_path(&path, sk::FillRule::Winding, true, sk::Transform::identity());
                    self.state.clip = Some(mask);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &RasterImage, src: Rect, dst: Rect) {
        if src.width() <= 0.0 || src.height() <= 0.0 {
            return;
        }
        let Some(source) = premultiplied_pixmap(image) else {
            return;
        };
        let Some(rect) = sk::Rect::from_ltrb(dst.x0 as f32, dst.y0 as f32, dst.x1 as f32, dst.y1 as f32)
        else {
            return;
        };
        let sx = dst.width() / src.width();
        let sy = dst.height() / src.height();
        let ts = sk::Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            (dst.x0 - src.x0 * sx) as f32,
            (dst.y0 - src.y0 * sy) as f32,
        );
        let paint = sk::Paint {
            shader: sk::Pattern::new(
                source.as_ref(),
                sk::SpreadMode::Pad,
                sk::FilterQuality::Bilinear,
                self.state.alpha,
                ts,
            ),
            anti_alias: true,
            ..Default::default()
        };
        self.pixmap
            .fill_rect(rect, &paint, sk::Transform::identity(), self.state.clip.as_ref());
    }

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        let Some(run) = self.fonts.rasterize_run(&style.font, text) else {
            log::debug!("no font for {:?}, skipping text", style.font.css());
            return;
        };
        let (x, y) = Self::run_origin(&run, at, style);
        if let Some(shadow) = self.state.shadow {
            self.blit_run(&run, shadow.color, x + shadow.offset.x, y + shadow.offset.y);
        }
        self.blit_run(&run, style.color, x, y);
    }

    fn stroke_text(&mut self, text: &str, at: Point, style: &TextStyle, line_width: f64) {
        let Some(run) = self.fonts.rasterize_run(&style.font, text) else {
            return;
        };
        let (x, y) = Self::run_origin(&run, at, style);
        let r = (line_width / 2.0).max(0.5);
        for step in 0..8 {
            let angle = step as f64 * std::f64::consts::FRAC_PI_4;
            self.blit_run(&run, style.color, x + r * angle.cos(), y + r * angle.sin());
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64, dash: Option<[f64; 2]>) {
        let Some(r) = sk::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
        else {
            return;
        };
        let path = sk::PathBuilder::from_rect(r);
        let stroke = sk::Stroke {
            width: line_width as f32,
            dash: dash.and_then(|[on, off]| sk::StrokeDash::new(vec![on as f32, off as f32], 0.0)),
            ..Default::default()
        };
        let paint = sk::Paint {
            shader: sk::Shader::SolidColor(sk_color(color.with_alpha(self.state.alpha))),
            anti_alias: true,
            ..Default::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            sk::Transform::identity(),
            self.state.clip.as_ref(),
        );
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────

fn sk_color(c: Color) -> sk::Color {
    sk::Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        c.a.clamp(0.0, 1.0),
    )
    .unwrap_or(sk::Color::TRANSPARENT)
}

fn sk_point(p: Point) -> sk::Point {
    sk::Point::from_xy(p.x as f32, p.y as f32)
}

/// Stops with alpha applied; offsets remapped into `[start, 1]`.
fn sk_stops(stops: &[GradientStop], alpha: f32, start: f32) -> Vec<sk::GradientStop> {
    stops
        .iter()
        .map(|s| {
            let offset = start + s.offset.clamp(0.0, 1.0) * (1.0 - start);
            sk::GradientStop::new(offset, sk_color(s.color.with_alpha(alpha)))
        })
        .collect()
}

fn sk_path(shape: &RoundedRect) -> Option<sk::Path> {
    let mut pb = sk::PathBuilder::new();
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(a, p) => pb.quad_to(a.x as f32, a.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(a, b, p) => pb.cubic_to(
                a.x as f32, a.y as f32, b.x as f32, b.y as f32, p.x as f32, p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn premultiplied_pixmap(image: &RasterImage) -> Option<sk::Pixmap> {
    let mut data = image.rgba().to_vec();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for ch in &mut px[..3] {
            *ch = ((*ch as u32 * a + 127) / 255) as u8;
        }
    }
    sk::Pixmap::from_vec(data, sk::IntSize::from_wh(image.width(), image.height())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::RoundedRectRadii;

    const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);

    #[test]
    fn solid_fill_and_alpha() {
        let fonts = FontBook::new();
        let mut s = PixmapSurface::new(10, 10, &fonts).unwrap();
        s.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::Solid(Color::BLACK));
        s.set_alpha(0.5);
        s.fill_rect(Rect::new(0.0, 0.0, 5.0, 10.0), &Paint::Solid(Color::WHITE));
        assert_eq!(s.pixel(8, 5), Some([0, 0, 0, 255]));
        let [r, g, b, a] = s.pixel(2, 5).unwrap();
        assert_eq!(a, 255);
        assert!((r as i32 - 128).abs() <= 1 && r == g && g == b);
    }

    #[test]
    fn clip_is_scoped_by_save_restore() {
        let fonts = FontBook::new();
        let mut s = PixmapSurface::new(20, 20, &fonts).unwrap();
        s.save();
        s.clip(&RoundedRect::from_rect(Rect::new(0.0, 0.0, 10.0, 20.0), 0.0));
        s.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), &Paint::Solid(RED));
        s.restore();
        assert_eq!(s.pixel(5, 10), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(15, 10).map(|p| p[3]), Some(0));

        s.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), &Paint::Solid(RED));
        assert_eq!(s.pixel(15, 10), Some([255, 0, 0, 255]));
    }

    #[test]
    fn rounded_top_clip_cuts_corners_only() {
        let fonts = FontBook::new();
        let mut s = PixmapSurface::new(40, 40, &fonts).unwrap();
        let shape = RoundedRect::from_rect(
            Rect::new(0.0, 0.0, 40.0, 40.0),
            RoundedRectRadii::new(20.0, 20.0, 0.0, 0.0),
        );
        s.clip(&shape);
        s.fill_rect(Rect::new(0.0, 0.0, 40.0, 40.0), &Paint::Solid(RED));
        assert_eq!(s.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(s.pixel(0, 39), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(20, 1).map(|p| p[3]), Some(255));
    }

    #[test]
    fn image_is_scaled_into_destination() {
        let fonts = FontBook::new();
        let mut s = PixmapSurface::new(20, 10, &fonts).unwrap();
        let img = RasterImage::from_rgba(
            "two",
            2,
            1,
            vec![255, 0, 0, 255, 0, 0, 255, 255],
        )
        .unwrap();
        s.draw_image(&img, Rect::new(0.0, 0.0, 2.0, 1.0), Rect::new(0.0, 0.0, 20.0, 10.0));
        let left = s.pixel(2, 5).unwrap();
        let right = s.pixel(17, 5).unwrap();
        assert!(left[0] > 200 && left[2] < 50, "{left:?}");
        assert!(right[2] > 200 && right[0] < 50, "{right:?}");
    }

    #[test]
    fn gradient_runs_between_endpoints() {
        let fonts = FontBook::new();
        let mut s = PixmapSurface::new(100, 4, &fonts).unwrap();
        let g = thumb_core::parse_linear_gradient("linear-gradient(90deg, #000000, #ffffff)").unwrap();
        s.fill_rect(
            Rect::new(0.0, 0.0, 100.0, 4.0),
            &Paint::Linear {
                start: Point::new(0.0, 2.0),
                end: Point::new(100.0, 2.0),
                stops: g.stops,
            },
        );
        let dark = s.pixel(2, 2).unwrap()[0];
        let light = s.pixel(97, 2).unwrap()[0];
        assert!(dark < 20 && light > 235, "{dark} {light}");
    }

    #[test]
    fn png_has_configured_size() {
        let fonts = FontBook::new();
        let s = PixmapSurface::new(32, 18, &fonts).unwrap();
        let png = s.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 18));
    }
}
