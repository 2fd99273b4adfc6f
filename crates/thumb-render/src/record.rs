//! A surface that records draw calls instead of producing pixels.

use crate::bitmap::RasterImage;
use crate::surface::{Paint, Shadow, Surface, TextStyle};
use kurbo::{Point, Rect, RoundedRect};
use thumb_core::{ApproxMeasure, Color, FontSpec, TextMeasure, TextMetrics};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    SetAlpha(f32),
    SetShadow(Option<Shadow>),
    Fill {
        shape: RoundedRect,
        paint: Paint,
    },
    Clip(RoundedRect),
    Image {
        key: String,
        src: Rect,
        dst: Rect,
    },
    FillText {
        text: String,
        at: Point,
        style: TextStyle,
    },
    StrokeText {
        text: String,
        at: Point,
        style: TextStyle,
        line_width: f64,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f64,
        dash: Option<[f64; 2]>,
    },
}

/// Records every call; measures with [`ApproxMeasure`] unless given a
/// different measurer.
pub struct RecordingSurface<'m> {
    width: f64,
    height: f64,
    measure: &'m dyn TextMeasure,
    ops: Vec<DrawOp>,
}

impl RecordingSurface<'static> {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_measure(width, height, &ApproxMeasure)
    }
}

impl<'m> RecordingSurface<'m> {
    pub fn with_measure(width: f64, height: f64, measure: &'m dyn TextMeasure) -> Self {
        Self {
            width,
            height,
            measure,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Filled text strings, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Keys of drawn images, in draw order.
    pub fn images(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn dashed_rects(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokeRect {
                    rect,
                    dash: Some(_),
                    ..
                } => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl TextMeasure for RecordingSurface<'_> {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics {
        self.measure.measure_text(font, text)
    }
}

impl Surface for RecordingSurface<'_> {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ops.push(DrawOp::SetAlpha(alpha));
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.ops.push(DrawOp::SetShadow(shadow));
    }

    fn fill(&mut self, shape: &RoundedRect, paint: &Paint) {
        self.ops.push(DrawOp::Fill {
            shape: *shape,
            paint: paint.clone(),
        });
    }

    fn clip(&mut self, shape: &RoundedRect) {
        self.ops.push(DrawOp::Clip(*shape));
    }

    fn draw_image(&mut self, image: &RasterImage, src: Rect, dst: Rect) {
        self.ops.push(DrawOp::Image {
            key: image.key().to_owned(),
            src,
            dst,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        self.ops.push(DrawOp::FillText {
            text: text.to_owned(),
            at,
            style: style.clone(),
        });
    }

    fn stroke_text(&mut self, text: &str, at: Point, style: &TextStyle, line_width: f64) {
        self.ops.push(DrawOp::StrokeText {
            text: text.to_owned(),
            at,
            style: style.clone(),
            line_width,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f64, dash: Option<[f64; 2]>) {
        self.ops.push(DrawOp::StrokeRect {
            rect,
            color,
            line_width,
            dash,
        });
    }
}
