//! Editor session: the one owner of a thumbnail being edited.
//!
//! Holds the config, the renderer and its image cache, the drag
//! controller, the selection and the undo history. Every control goes
//! through [`EditorSession::apply`]; every accepted change marks the
//! canvas for a full redraw.

use crate::drag::{DragController, Press};
use crate::history::History;
use crate::input::{PointerEvent, ViewTransform};
use kurbo::Point;
use thumb_core::{
    AccentColor, BackgroundEffects, ElementId, MAX_DIMENSION, MAX_PHOTO_SCALE, MIN_PHOTO_SCALE,
    PhotoConfig, PhotoRole, StoreError, TextLine, TextMeasure, TextOverlay, ThumbnailConfig,
    ThumbnailId, ThumbnailStore,
};
use thumb_render::{
    CanvasRenderer, ExportError, FontBook, ImageError, LoadTicket, RasterImage, RenderOptions,
    Surface, find_text_at_position,
};

/// One edit to the config, as issued by an editor control.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigMutation {
    /// Swap in a whole new config (paste, template, host sync).
    Replace(Box<ThumbnailConfig>),
    SetLayout(String),
    SetBackgroundColor(String),
    SetBackgroundImage(Option<String>),
    SetBackgroundOpacity(f64),
    SetEffects(BackgroundEffects),
    SetAccent(AccentColor),
    SetElementOpacity(f64),
    AddTextLine(TextLine),
    UpdateTextLine { id: ElementId, text: String },
    SetHighlight { id: ElementId, highlight: bool },
    RemoveTextLine { id: ElementId },
    SetPhoto { role: PhotoRole, photo: PhotoConfig },
    ClearPhoto { role: PhotoRole },
    AddOverlay(TextOverlay),
    /// Replace the overlay with the same id.
    UpdateOverlay(TextOverlay),
    MoveOverlay { id: ElementId, x: f64, y: f64 },
    RemoveOverlay { id: ElementId },
    Resize { width: u32, height: u32 },
}

impl ConfigMutation {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Replace(_) => "Replace thumbnail",
            Self::SetLayout(_) => "Layout",
            Self::SetBackgroundColor(_) => "Background color",
            Self::SetBackgroundImage(_) => "Background image",
            Self::SetBackgroundOpacity(_) => "Background opacity",
            Self::SetEffects(_) => "Background effects",
            Self::SetAccent(_) => "Accent color",
            Self::SetElementOpacity(_) => "Element opacity",
            Self::AddTextLine(_) => "Add line",
            Self::UpdateTextLine { .. } => "Edit line",
            Self::SetHighlight { .. } => "Highlight line",
            Self::RemoveTextLine { .. } => "Remove line",
            Self::SetPhoto { .. } => "Set photo",
            Self::ClearPhoto { .. } => "Clear photo",
            Self::AddOverlay(_) => "Add text",
            Self::UpdateOverlay(_) => "Edit text",
            Self::MoveOverlay { .. } => "Move text",
            Self::RemoveOverlay { .. } => "Remove text",
            Self::Resize { .. } => "Resize",
        }
    }
}

fn set_percent(slot: &mut f64, value: f64) {
    if value.is_finite() {
        *slot = value.clamp(0.0, 100.0);
    }
}

/// Apply `mutation` in place. Mutations naming unknown ids or carrying
/// unusable values leave the config untouched.
fn mutate(config: &mut ThumbnailConfig, mutation: ConfigMutation) {
    match mutation {
        ConfigMutation::Replace(next) => *config = *next,
        ConfigMutation::SetLayout(layout) => config.layout = layout,
        ConfigMutation::SetBackgroundColor(color) => config.background_color = color,
        ConfigMutation::SetBackgroundImage(url) => {
            config.background_image = url.filter(|u| !u.trim().is_empty());
        }
        ConfigMutation::SetBackgroundOpacity(v) => set_percent(&mut config.background_opacity, v),
        ConfigMutation::SetEffects(effects) => {
            let current = &mut config.background_effects;
            set_percent(&mut current.dark_overlay, effects.dark_overlay);
            set_percent(&mut current.vignette_intensity, effects.vignette_intensity);
            current.color_tint = effects.color_tint;
        }
        ConfigMutation::SetAccent(accent) => config.accent_color = accent,
        ConfigMutation::SetElementOpacity(v) => set_percent(&mut config.element_opacity, v),
        ConfigMutation::AddTextLine(mut line) => {
            if config.text_lines.iter().any(|l| l.id == line.id) {
                line.id = ElementId::with_prefix("line");
            }
            config.text_lines.push(line);
        }
        ConfigMutation::UpdateTextLine { id, text } => match config.text_line_mut(id) {
            Some(line) => line.text = text,
            None => log::debug!("edit of unknown line {id}"),
        },
        ConfigMutation::SetHighlight { id, highlight } => {
            if let Some(line) = config.text_line_mut(id) {
                line.highlight = highlight;
            }
        }
        ConfigMutation::RemoveTextLine { id } => config.text_lines.retain(|l| l.id != id),
        ConfigMutation::SetPhoto { role, mut photo } => {
            let slot = config.photo_slot_mut(role);
            if photo.url.trim().is_empty() {
                *slot = None;
                return;
            }
            photo.scale = if photo.scale.is_finite() {
                photo.scale.clamp(MIN_PHOTO_SCALE, MAX_PHOTO_SCALE)
            } else {
                100.0
            };
            *slot = Some(photo);
        }
        ConfigMutation::ClearPhoto { role } => *config.photo_slot_mut(role) = None,
        ConfigMutation::AddOverlay(mut overlay) => {
            if config.overlay(overlay.id).is_some() {
                overlay.id = ElementId::with_prefix("overlay");
            }
            config.overlays.push(overlay);
        }
        ConfigMutation::UpdateOverlay(overlay) => match config.overlay_mut(overlay.id) {
            Some(existing) => *existing = overlay,
            None => log::debug!("edit of unknown overlay {}", overlay.id),
        },
        ConfigMutation::MoveOverlay { id, x, y } => {
            if !(x.is_finite() && y.is_finite()) {
                return;
            }
            if let Some(overlay) = config.overlay_mut(id) {
                overlay.x = x;
                overlay.y = y;
            }
        }
        ConfigMutation::RemoveOverlay { id } => config.overlays.retain(|o| o.id != id),
        ConfigMutation::Resize { width, height } => {
            if width == 0 || height == 0 {
                log::debug!("ignoring resize to {width}x{height}");
                return;
            }
            config.width = width.min(MAX_DIMENSION);
            config.height = height.min(MAX_DIMENSION);
        }
    }
}

pub struct EditorSession {
    config: ThumbnailConfig,
    renderer: CanvasRenderer,
    fonts: FontBook,
    drag: DragController,
    selected: Option<ElementId>,
    history: History,
    view: ViewTransform,
    /// Store id the session was opened from or last saved as.
    document: Option<ThumbnailId>,
    needs_redraw: bool,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(ThumbnailConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: ThumbnailConfig) -> Self {
        Self::with_options(config, RenderOptions::default())
    }

    pub fn with_options(config: ThumbnailConfig, options: RenderOptions) -> Self {
        let view = ViewTransform::identity(config.width as f64, config.height as f64);
        let mut session = Self {
            config,
            renderer: CanvasRenderer::new(options),
            fonts: FontBook::new(),
            drag: DragController::new(),
            selected: None,
            history: History::default(),
            view,
            document: None,
            needs_redraw: true,
        };
        session.renderer.images_mut().sync(&session.config);
        session
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn renderer(&self) -> &CanvasRenderer {
        &self.renderer
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        self.needs_redraw = true;
        &mut self.fonts
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        let id = id.filter(|id| self.config.overlay(*id).is_some());
        if id != self.selected {
            self.selected = id;
            self.needs_redraw = true;
        }
    }

    pub fn document_id(&self) -> Option<&ThumbnailId> {
        self.document.as_ref()
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// On-screen size of the canvas element, for pointer mapping.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.view.display_width = width;
        self.view.display_height = height;
    }

    /// Whether something changed since the last [`EditorSession::render`].
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply one control edit. Returns `true` when the config changed.
    pub fn apply(&mut self, mutation: ConfigMutation) -> bool {
        let description = mutation.description();
        let before = self.config.clone();
        mutate(&mut self.config, mutation);
        if self.config == before {
            return false;
        }
        self.history.record(before, &self.config, description);
        self.after_change();
        true
    }

    fn after_change(&mut self) {
        self.renderer.images_mut().sync(&self.config);
        if let Some(id) = self.selected
            && self.config.overlay(id).is_none()
        {
            self.selected = None;
        }
        self.view.canvas_width = self.config.width as f64;
        self.view.canvas_height = self.config.height as f64;
        self.needs_redraw = true;
    }

    pub fn undo(&mut self) -> Option<String> {
        self.finish_drag();
        let description = self.history.undo(&mut self.config)?;
        self.after_change();
        Some(description)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.finish_drag();
        let description = self.history.redo(&mut self.config)?;
        self.after_change();
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    pub fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } => self.pointer_down(x, y),
            PointerEvent::Move { x, y } => self.pointer_move(x, y),
            PointerEvent::Up { .. } => self.pointer_up(),
            PointerEvent::Leave => self.pointer_leave(),
        }
    }

    /// Press at display coordinates, hit testing with the session fonts.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let point = self.view.to_canvas(x, y);
        let hit = find_text_at_position(&self.fonts, &self.config.overlays, point);
        self.press(hit, point);
    }

    /// Press at display coordinates, hit testing with `measure`. Pass the
    /// surface the canvas is drawn with so hit boxes match drawn boxes.
    pub fn pointer_down_with<M: TextMeasure + ?Sized>(&mut self, measure: &M, x: f64, y: f64) {
        let point = self.view.to_canvas(x, y);
        let hit = find_text_at_position(measure, &self.config.overlays, point);
        self.press(hit, point);
    }

    fn press(&mut self, hit: Option<ElementId>, point: Point) {
        self.finish_drag();
        let overlay = hit.and_then(|id| self.config.overlay(id));
        let selected = match self.drag.press(overlay, point) {
            Press::Grab(id) => {
                self.history.begin_batch(&self.config, "Move text");
                Some(id)
            }
            Press::Miss => None,
        };
        if selected != self.selected {
            self.selected = selected;
            self.needs_redraw = true;
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let point = self.view.to_canvas(x, y);
        if let Some((id, to)) = self.drag.drag_to(point) {
            self.apply(ConfigMutation::MoveOverlay { id, x: to.x, y: to.y });
        }
    }

    pub fn pointer_up(&mut self) {
        self.finish_drag();
    }

    pub fn pointer_leave(&mut self) {
        self.finish_drag();
    }

    fn finish_drag(&mut self) {
        if let Some(id) = self.drag.release() {
            log::trace!("drag of {id} finished");
            self.history.end_batch(&self.config);
        }
    }

    // ─── Rendering & images ──────────────────────────────────────────────

    /// Full redraw onto `surface`, selection indicator included.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.renderer.render(surface, &self.config, self.selected);
        self.needs_redraw = false;
    }

    /// PNG of the current config, without selection indicator.
    pub fn export_png(&self) -> Result<Vec<u8>, ExportError> {
        self.renderer.export_png(&self.config, &self.fonts)
    }

    pub fn export_data_uri(&self) -> Result<String, ExportError> {
        self.renderer.export_data_uri(&self.config, &self.fonts)
    }

    /// Image loads the host should start.
    pub fn pending_loads(&mut self) -> Vec<LoadTicket> {
        self.renderer.images_mut().take_pending()
    }

    /// Hand back a finished load. Returns `true` when a redraw is due;
    /// stale and failed loads never ask for one.
    pub fn complete_load(&mut self, ticket: &LoadTicket, result: Result<RasterImage, ImageError>) -> bool {
        let redraw = self.renderer.images_mut().complete(ticket, result);
        if redraw {
            self.renderer.images_mut().evict_unused();
            self.needs_redraw = true;
        }
        redraw
    }

    // ─── Store ───────────────────────────────────────────────────────────

    /// Save under the current document id, or a new one on first save.
    pub fn save<S: ThumbnailStore + ?Sized>(&mut self, store: &mut S) -> Result<ThumbnailId, StoreError> {
        let id = match &self.document {
            Some(id) => {
                store.save_as(id, &self.config)?;
                id.clone()
            }
            None => store.save(&self.config)?,
        };
        log::debug!("saved thumbnail {id}");
        self.document = Some(id.clone());
        Ok(id)
    }

    /// Replace the session with a stored thumbnail. History is reset.
    pub fn open<S: ThumbnailStore + ?Sized>(&mut self, store: &S, id: &ThumbnailId) -> Result<(), StoreError> {
        let config = store.load(id)?;
        log::debug!("opened thumbnail {id}");
        self.drag.release();
        self.history.clear();
        self.config = config;
        self.selected = None;
        self.document = Some(id.clone());
        self.after_change();
        Ok(())
    }
}
