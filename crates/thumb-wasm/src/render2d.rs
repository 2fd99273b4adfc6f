//! Canvas2D surface.
//!
//! Implements [`Surface`] over an HTML `<canvas>` via
//! `CanvasRenderingContext2d`, so the browser canvas runs the exact draw
//! sequence the PNG exporter runs.

use kurbo::{Point, Rect, RoundedRect};
use std::collections::HashMap;
use thumb_core::{FontSpec, GradientStop, TextMeasure, TextMetrics};
use thumb_render::{Paint, RasterImage, Shadow, Surface, TextStyle};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Text measurement through the context's own font machinery.
pub struct CanvasMeasure<'a>(pub &'a CanvasRenderingContext2d);

impl TextMeasure for CanvasMeasure<'_> {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics {
        let size = font.size as f64;
        self.0.set_font(&font.css());
        let width = self.0.measure_text(text).map_or(0.0, |m| m.width());
        TextMetrics {
            width,
            ascent: size * 0.8,
            descent: size * 0.2,
        }
    }
}

/// Decoded images uploaded to off-screen canvases, keyed by image key.
#[derive(Default)]
pub struct SpriteCache {
    sprites: HashMap<String, HtmlCanvasElement>,
}

impl SpriteCache {
    fn get_or_upload(&mut self, image: &RasterImage) -> Option<&HtmlCanvasElement> {
        if !self.sprites.contains_key(image.key()) {
            let sprite = upload(image)?;
            self.sprites.insert(image.key().to_owned(), sprite);
        }
        self.sprites.get(image.key())
    }

    /// Drop sprites whose key is not in `keep`.
    pub fn retain(&mut self, keep: &[&str]) {
        self.sprites.retain(|key, _| keep.contains(&key.as_str()));
    }
}

fn upload(image: &RasterImage) -> Option<HtmlCanvasElement> {
    let document = web_sys::window()?.document()?;
    let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
    canvas.set_width(image.width());
    canvas.set_height(image.height());
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
    let data =
        ImageData::new_with_u8_clamped_array_and_sh(Clamped(image.rgba()), image.width(), image.height())
            .ok()?;
    ctx.put_image_data(&data, 0.0, 0.0).ok()?;
    Some(canvas)
}

pub struct Canvas2dSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    sprites: &'a mut SpriteCache,
    width: f64,
    height: f64,
}

impl<'a> Canvas2dSurface<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d, sprites: &'a mut SpriteCache, width: f64, height: f64) -> Self {
        Self {
            ctx,
            sprites,
            width,
            height,
        }
    }
}

impl TextMeasure for Canvas2dSurface<'_> {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics {
        CanvasMeasure(self.ctx).measure_text(font, text)
    }
}

impl Surface for Canvas2dSurface<'_> {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha as f64);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        match shadow {
            Some(shadow) => apply_shadow(self.ctx, &shadow),
            None => clear_shadow(self.ctx),
        }
    }

    fn fill(&mut self, shape: &RoundedRect, paint: &Paint) {
        rounded_rect_path(self.ctx, shape);
        apply_fill(self.ctx, paint);
        self.ctx.fill();
    }

    fn clip(&mut self, shape: &RoundedRect) {
        rounded_rect_path(self.ctx, shape);
        self.ctx.clip();
    }

    fn draw_image(&mut self, image: &RasterImage, src: Rect, dst: Rect) {
        let Some(sprite) = self.sprites.get_or_upload(image) else {
            log::warn!("could not upload image {}", image.key());
            return;
        };
        let _ = self
            .ctx
            .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                sprite,
                src.x0,
                src.y0,
                src.width(),
                src.height(),
                dst.x0,
                dst.y0,
                dst.width(),
                dst.height(),
            );
    }

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle) {
        apply_text_style(self.ctx, style);
        self.ctx.set_fill_style_str(&style.color.to_css());
        let _ = self.ctx.fill_text(text, at.x, at.y);
    }

    fn stroke_text(&mut self, text: &str, at: Point, style: &TextStyle, line_width: f64) {
        apply_text_style(self.ctx, style);
        self.ctx.set_stroke_style_str(&style.color.to_css());
        self.ctx.set_line_width(line_width);
        self.ctx.set_line_join("round");
        let _ = self.ctx.stroke_text(text, at.x, at.y);
    }

    fn stroke_rect(&mut self, rect: Rect, color: thumb_core::Color, line_width: f64, dash: Option<[f64; 2]>) {
        self.ctx.save();
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(line_width);
        if let Some([on, off]) = dash {
            let _ = self.ctx.set_line_dash(&js_sys::Array::of2(
                &JsValue::from_f64(on),
                &JsValue::from_f64(off),
            ));
        }
        self.ctx.stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
        self.ctx.restore();
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Path for a rounded rect with independent corner radii.
fn rounded_rect_path(ctx: &CanvasRenderingContext2d, shape: &RoundedRect) {
    let r = shape.rect();
    let radii = shape.radii();
    let (x, y, w, h) = (r.x0, r.y0, r.width(), r.height());
    let clamp = |v: f64| v.min(w / 2.0).min(h / 2.0).max(0.0);
    let (tl, tr, br, bl) = (
        clamp(radii.top_left),
        clamp(radii.top_right),
        clamp(radii.bottom_right),
        clamp(radii.bottom_left),
    );

    ctx.begin_path();
    ctx.move_to(x + tl, y);
    ctx.line_to(x + w - tr, y);
    ctx.arc_to(x + w, y, x + w, y + tr, tr).unwrap_or(());
    ctx.line_to(x + w, y + h - br);
    ctx.arc_to(x + w, y + h, x + w - br, y + h, br).unwrap_or(());
    ctx.line_to(x + bl, y + h);
    ctx.arc_to(x, y + h, x, y + h - bl, bl).unwrap_or(());
    ctx.line_to(x, y + tl);
    ctx.arc_to(x, y, x + tl, y, tl).unwrap_or(());
    ctx.close_path();
}

/// Set the fill style, creating a CanvasGradient for gradient paints.
fn apply_fill(ctx: &CanvasRenderingContext2d, paint: &Paint) {
    match paint {
        Paint::Solid(c) => ctx.set_fill_style_str(&c.to_css()),
        Paint::Linear { start, end, stops } => {
            let grad = ctx.create_linear_gradient(start.x, start.y, end.x, end.y);
            add_stops(&grad, stops);
            ctx.set_fill_style_canvas_gradient(&grad);
        }
        Paint::Radial {
            center,
            inner_radius,
            outer_radius,
            stops,
        } => match ctx.create_radial_gradient(center.x, center.y, *inner_radius, center.x, center.y, *outer_radius) {
            Ok(grad) => {
                add_stops(&grad, stops);
                ctx.set_fill_style_canvas_gradient(&grad);
            }
            Err(_) => ctx.set_fill_style_str(&paint.flat_color().to_css()),
        },
    }
}

fn add_stops(grad: &web_sys::CanvasGradient, stops: &[GradientStop]) {
    for stop in stops {
        let _ = grad.add_color_stop(stop.offset, &stop.color.to_css());
    }
}

fn apply_text_style(ctx: &CanvasRenderingContext2d, style: &TextStyle) {
    ctx.set_font(&style.font.css());
    ctx.set_text_align(style.align.as_str());
    ctx.set_text_baseline("middle");
}

fn apply_shadow(ctx: &CanvasRenderingContext2d, shadow: &Shadow) {
    ctx.set_shadow_blur(shadow.blur);
    ctx.set_shadow_offset_x(shadow.offset.x);
    ctx.set_shadow_offset_y(shadow.offset.y);
    ctx.set_shadow_color(&shadow.color.to_css());
}

fn clear_shadow(ctx: &CanvasRenderingContext2d) {
    ctx.set_shadow_blur(0.0);
    ctx.set_shadow_offset_x(0.0);
    ctx.set_shadow_offset_y(0.0);
    ctx.set_shadow_color("transparent");
}
