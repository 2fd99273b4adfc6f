//! WASM bridge for the thumbnail editor: exposes an [`EditorSession`] to
//! JavaScript and draws it onto a Canvas2D context.
//!
//! Compiled via `wasm-pack build --target web`. The page owns fetching:
//! it polls [`ThumbCanvas::pending_loads`], downloads each URL and hands
//! the bytes back through [`ThumbCanvas::deliver_image`].

mod render2d;

use render2d::{Canvas2dSurface, CanvasMeasure, SpriteCache};
use serde::Serialize;
use std::collections::HashMap;
use thumb_core::{
    AccentColor, BackgroundEffects, ColorTint, ElementId, PhotoConfig, PhotoRole, TextAlign, TextLine,
    TextOverlay, ThumbnailConfig,
};
use thumb_editor::{ConfigMutation, EditorSession};
use thumb_render::{ImageError, ImageState, LoadTicket, RasterImage};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

#[derive(Serialize)]
struct PendingLoad<'a> {
    role: &'static str,
    url: &'a str,
}

/// The main WASM-facing canvas controller.
#[wasm_bindgen]
pub struct ThumbCanvas {
    session: EditorSession,
    sprites: SpriteCache,
    /// Loads handed to JS and not yet delivered, keyed by URL.
    in_flight: HashMap<String, LoadTicket>,
}

impl Default for ThumbCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ThumbCanvas {
    /// Create a controller holding a default 1280×720 thumbnail.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook_setup();
        Self {
            session: EditorSession::default(),
            sprites: SpriteCache::default(),
            in_flight: HashMap::new(),
        }
    }

    // ─── Config ──────────────────────────────────────────────────────────

    /// Replace the config from a saved JSON blob. Returns `false` on
    /// invalid JSON (the current config is kept).
    pub fn set_config(&mut self, json: &str) -> bool {
        match ThumbnailConfig::from_json(json) {
            Ok(config) => {
                self.session.apply(ConfigMutation::Replace(Box::new(config)));
                true
            }
            Err(e) => {
                log::warn!("rejected config JSON: {e}");
                false
            }
        }
    }

    pub fn get_config(&self) -> String {
        self.session.config().to_json().unwrap_or_default()
    }

    pub fn width(&self) -> u32 {
        self.session.config().width
    }

    pub fn height(&self) -> u32 {
        self.session.config().height
    }

    pub fn set_layout(&mut self, layout: &str) -> bool {
        self.session.apply(ConfigMutation::SetLayout(layout.to_owned()))
    }

    pub fn set_background_color(&mut self, value: &str) -> bool {
        self.session.apply(ConfigMutation::SetBackgroundColor(value.to_owned()))
    }

    /// Empty string clears the background image.
    pub fn set_background_image(&mut self, url: &str) -> bool {
        let url = (!url.is_empty()).then(|| url.to_owned());
        self.session.apply(ConfigMutation::SetBackgroundImage(url))
    }

    pub fn set_background_opacity(&mut self, percent: f64) -> bool {
        self.session.apply(ConfigMutation::SetBackgroundOpacity(percent))
    }

    pub fn set_effects(&mut self, dark_overlay: f64, color_tint: &str, vignette: f64) -> bool {
        self.session.apply(ConfigMutation::SetEffects(BackgroundEffects {
            dark_overlay,
            color_tint: ColorTint::parse(color_tint).unwrap_or_default(),
            vignette_intensity: vignette,
        }))
    }

    pub fn set_accent(&mut self, accent: &str) -> bool {
        let accent = AccentColor::parse(accent).unwrap_or_default();
        self.session.apply(ConfigMutation::SetAccent(accent))
    }

    pub fn set_element_opacity(&mut self, percent: f64) -> bool {
        self.session.apply(ConfigMutation::SetElementOpacity(percent))
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.session.apply(ConfigMutation::Resize { width, height })
    }

    // ─── Headline lines ──────────────────────────────────────────────────

    /// Append a line. Returns its id.
    pub fn add_text_line(&mut self, text: &str, highlight: bool) -> String {
        self.session
            .apply(ConfigMutation::AddTextLine(TextLine::new(text, highlight)));
        // A clashing id is regenerated on add; report the one stored.
        self.session
            .config()
            .text_lines
            .last()
            .map(|l| l.id.to_string())
            .unwrap_or_default()
    }

    pub fn update_text_line(&mut self, id: &str, text: &str) -> bool {
        self.session.apply(ConfigMutation::UpdateTextLine {
            id: ElementId::intern(id),
            text: text.to_owned(),
        })
    }

    pub fn set_highlight(&mut self, id: &str, highlight: bool) -> bool {
        self.session.apply(ConfigMutation::SetHighlight {
            id: ElementId::intern(id),
            highlight,
        })
    }

    pub fn remove_text_line(&mut self, id: &str) -> bool {
        self.session.apply(ConfigMutation::RemoveTextLine {
            id: ElementId::intern(id),
        })
    }

    // ─── Photos ──────────────────────────────────────────────────────────

    /// `role` is `"host"` or `"guest"`.
    pub fn set_photo(&mut self, role: &str, url: &str, scale: f64, offset_x: f64, offset_y: f64) -> bool {
        let Some(role) = parse_role(role) else {
            return false;
        };
        let photo = PhotoConfig {
            scale,
            offset_x,
            offset_y,
            ..PhotoConfig::new(url)
        };
        self.session.apply(ConfigMutation::SetPhoto { role, photo })
    }

    pub fn clear_photo(&mut self, role: &str) -> bool {
        let Some(role) = parse_role(role) else {
            return false;
        };
        self.session.apply(ConfigMutation::ClearPhoto { role })
    }

    // ─── Legacy overlays ─────────────────────────────────────────────────

    pub fn add_overlay(&mut self, text: &str, x: f64, y: f64) -> String {
        self.session
            .apply(ConfigMutation::AddOverlay(TextOverlay::new(text, x, y)));
        self.session
            .config()
            .overlays
            .last()
            .map(|o| o.id.to_string())
            .unwrap_or_default()
    }

    /// Set one overlay property from the properties panel.
    /// Keys: `text`, `x`, `y`, `fontSize`, `fontFamily`, `fontWeight`,
    /// `color`, `textAlign`, `shadow`, `outline`.
    pub fn set_overlay_prop(&mut self, id: &str, key: &str, value: &str) -> bool {
        let Some(mut overlay) = self.session.config().overlay(ElementId::intern(id)).cloned() else {
            return false;
        };
        let number = || value.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let flag = || matches!(value.trim(), "true" | "1" | "on");
        match key {
            "text" => overlay.text = value.to_owned(),
            "x" => overlay.x = number().unwrap_or(overlay.x),
            "y" => overlay.y = number().unwrap_or(overlay.y),
            "fontSize" => overlay.font_size = number().filter(|v| *v > 0.0).unwrap_or(overlay.font_size),
            "fontFamily" => overlay.font_family = value.to_owned(),
            "fontWeight" => overlay.font_weight = value.to_owned(),
            "color" => overlay.color = value.to_owned(),
            "textAlign" => overlay.text_align = TextAlign::parse(value).unwrap_or(overlay.text_align),
            "shadow" => overlay.shadow = flag(),
            "outline" => overlay.outline = flag(),
            _ => return false,
        }
        self.session.apply(ConfigMutation::UpdateOverlay(overlay))
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.session.selected() {
            Some(id) => self.session.apply(ConfigMutation::RemoveOverlay { id }),
            None => false,
        }
    }

    pub fn get_selected_id(&self) -> String {
        self.session
            .selected()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    pub fn select_by_id(&mut self, id: &str) -> bool {
        let id = (!id.is_empty()).then(|| ElementId::intern(id));
        self.session.select(id);
        self.session.selected() == id
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Full redraw onto `ctx`. The context's canvas must be sized to
    /// `width()` × `height()`.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let (w, h) = (self.width() as f64, self.height() as f64);
        let mut surface = Canvas2dSurface::new(ctx, &mut self.sprites, w, h);
        self.session.render(&mut surface);
    }

    pub fn needs_redraw(&self) -> bool {
        self.session.needs_redraw()
    }

    /// CSS size of the canvas element, for pointer mapping.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.session.set_display_size(width, height);
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Handle pointer down in display coordinates. Returns `true` when a
    /// redraw is due.
    pub fn handle_pointer_down(&mut self, ctx: &CanvasRenderingContext2d, x: f64, y: f64) -> bool {
        ctx.save();
        self.session.pointer_down_with(&CanvasMeasure(ctx), x, y);
        ctx.restore();
        self.session.needs_redraw()
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer_move(x, y);
        self.session.needs_redraw()
    }

    pub fn handle_pointer_up(&mut self) {
        self.session.pointer_up();
    }

    pub fn handle_pointer_leave(&mut self) {
        self.session.pointer_leave();
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo().is_some()
    }

    // ─── Images ──────────────────────────────────────────────────────────

    /// Loads to start, as JSON `[{"role":"host","url":"..."}]`.
    pub fn pending_loads(&mut self) -> String {
        let tickets = self.session.pending_loads();
        let loads: Vec<PendingLoad<'_>> = tickets
            .iter()
            .map(|t| PendingLoad {
                role: t.role.as_str(),
                url: &t.url,
            })
            .collect();
        let json = serde_json::to_string(&loads).unwrap_or_else(|_| "[]".to_string());
        self.forget_superseded_loads();
        for ticket in tickets {
            self.in_flight.insert(ticket.url.clone(), ticket);
        }
        json
    }

    /// Deliver fetched, still-encoded bytes (PNG/JPEG/GIF/WebP) for `url`.
    /// Returns `true` when a redraw is due.
    pub fn deliver_image(&mut self, url: &str, bytes: &[u8]) -> bool {
        let Some(ticket) = self.in_flight.remove(url) else {
            log::debug!("unrequested image delivered: {url}");
            return false;
        };
        let result = RasterImage::decode(url, bytes);
        self.finish(ticket, result)
    }

    /// Deliver already-decoded RGBA pixels for `url`.
    pub fn deliver_rgba(&mut self, url: &str, width: u32, height: u32, rgba: Vec<u8>) -> bool {
        let Some(ticket) = self.in_flight.remove(url) else {
            return false;
        };
        let result = RasterImage::from_rgba(url, width, height, rgba);
        self.finish(ticket, result)
    }

    pub fn image_failed(&mut self, url: &str, reason: &str) -> bool {
        let Some(ticket) = self.in_flight.remove(url) else {
            return false;
        };
        self.finish(ticket, Err(ImageError::Unavailable(reason.to_owned())))
    }

    // ─── Fonts & export ──────────────────────────────────────────────────

    /// Register font bytes for PNG export. Returns `false` when the bytes
    /// are not a usable font.
    pub fn register_font(&mut self, family: &str, weight: u16, bytes: &[u8]) -> bool {
        match self.session.fonts_mut().add_bytes(family, weight, bytes) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("font {family} rejected: {e}");
                false
            }
        }
    }

    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        self.session
            .export_png()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn export_data_uri(&self) -> Result<String, JsValue> {
        self.session
            .export_data_uri()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl ThumbCanvas {
    /// Stop waiting on URLs the cache no longer loads; their deliveries
    /// are ignored.
    fn forget_superseded_loads(&mut self) {
        let images = self.session.renderer().images();
        self.in_flight
            .retain(|url, _| matches!(images.state(url), Some(ImageState::Loading)));
    }

    fn finish(&mut self, ticket: LoadTicket, result: Result<RasterImage, ImageError>) -> bool {
        let redraw = self.session.complete_load(&ticket, result);
        if redraw {
            let config = self.session.config();
            let keep: Vec<&str> = [
                config.background_image.as_deref(),
                config.host_photo.as_ref().map(|p| p.url.as_str()),
                config.guest_photo.as_ref().map(|p| p.url.as_str()),
            ]
            .into_iter()
            .flatten()
            .collect();
            self.sprites.retain(&keep);
        }
        self.forget_superseded_loads();
        redraw
    }
}

fn parse_role(role: &str) -> Option<PhotoRole> {
    match role.trim().to_ascii_lowercase().as_str() {
        "host" => Some(PhotoRole::Host),
        "guest" => Some(PhotoRole::Guest),
        _ => None,
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("thumb WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone helpers (no canvas needed) ───────────────────────────────

/// Normalize a stored layout name (`left-aligned` → `soloLeft`).
#[wasm_bindgen]
pub fn normalize_layout(name: &str) -> String {
    thumb_core::normalize_layout(name).to_string()
}

/// Validate a thumbnail JSON blob. Returns `{"ok":true}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match ThumbnailConfig::from_json(json) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}
