//! The drawing-surface abstraction, shaped after the 2D canvas API.
//!
//! Every surface is also a [`TextMeasure`], so the renderer measures text
//! with exactly the font machinery that will draw it.

use crate::bitmap::RasterImage;
use kurbo::{Point, Rect, RoundedRect, Vec2};
use smallvec::SmallVec;
use thumb_core::{Color, FontSpec, GradientStop, TextAlign, TextMeasure};

/// Fill paint for shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        start: Point,
        end: Point,
        stops: SmallVec<[GradientStop; 4]>,
    },
    /// Concentric radial gradient; stop offsets run from `inner_radius`
    /// (offset 0) to `outer_radius` (offset 1).
    Radial {
        center: Point,
        inner_radius: f64,
        outer_radius: f64,
        stops: SmallVec<[GradientStop; 4]>,
    },
}

impl Paint {
    /// Representative flat color (first stop for gradients).
    pub fn flat_color(&self) -> Color {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear { stops, .. } | Paint::Radial { stops, .. } => {
                stops.first().map_or(Color::TRANSPARENT, |s| s.color)
            }
        }
    }
}

/// Drop shadow applied to subsequent fills and text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub blur: f64,
    pub offset: Vec2,
}

/// Font, alignment and color for one text draw. Text is always drawn with
/// a middle baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontSpec,
    pub align: TextAlign,
    pub color: Color,
}

pub trait Surface: TextMeasure {
    /// Pixel size of the drawing area.
    fn size(&self) -> (f64, f64);

    /// Push alpha, shadow and clip.
    fn save(&mut self);
    fn restore(&mut self);

    /// Global alpha for subsequent draws (absolute, not multiplied).
    fn set_alpha(&mut self, alpha: f32);
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    fn fill(&mut self, shape: &RoundedRect, paint: &Paint);

    /// Intersect the clip with `shape` until the matching `restore`.
    fn clip(&mut self, shape: &RoundedRect);

    /// Draw the `src` part of `image` (image pixels) into `dst`.
    fn draw_image(&mut self, image: &RasterImage, src: Rect, dst: Rect);

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle);
    fn stroke_text(&mut self, text: &str, at: Point, style: &TextStyle, line_width: f64);

    /// Stroke a rectangle outline, optionally dashed `[on, off]`.
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64, dash: Option<[f64; 2]>);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.fill(&RoundedRect::from_rect(rect, 0.0), paint);
    }
}
