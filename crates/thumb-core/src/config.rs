//! Thumbnail configuration: the single source of truth for a render.
//!
//! Saved thumbnails are JSON blobs written by several generations of the
//! editor. Deserialization therefore goes through a tolerant raw form
//! (every field optional, numbers may arrive as strings, enums as free
//! text) and is converted once into a fully-populated [`ThumbnailConfig`].
//! Renderers and controls never special-case a missing field.
//!
//! Percentages and photo scale are clamped on load *and* by the accessors
//! used at draw time, so values written by controls are safe too.

use crate::color::Color;
use crate::id::ElementId;
use crate::layout::{Layout, PhotoRole, Viewport};
use crate::text::{FontSpec, TextAlign, TextMeasure, parse_font_weight, text_bounds};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const MAX_DIMENSION: u32 = 8192;
pub const DEFAULT_BACKGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND_OPACITY: f64 = 100.0;
pub const DEFAULT_ELEMENT_OPACITY: f64 = 70.0;
pub const MIN_PHOTO_SCALE: f64 = 50.0;
pub const MAX_PHOTO_SCALE: f64 = 200.0;
const DEFAULT_OVERLAY_FONT_SIZE: f64 = 48.0;

fn percent(v: f64, default: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 100.0)
    } else {
        default
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

// ─── Enumerations ────────────────────────────────────────────────────────

/// Highlight-box color for headline lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    #[default]
    Orange,
    Blue,
    Purple,
}

impl AccentColor {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orange" => Some(Self::Orange),
            "blue" => Some(Self::Blue),
            "purple" => Some(Self::Purple),
            _ => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Orange => Color::from_rgba8(0xF9, 0x73, 0x16, 0xFF),
            Self::Blue => Color::from_rgba8(0x3B, 0x82, 0xF6, 0xFF),
            Self::Purple => Color::from_rgba8(0x8B, 0x5C, 0xF6, 0xFF),
        }
    }
}

/// Full-canvas color wash applied after the dark overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTint {
    #[default]
    None,
    Purple,
    Blue,
    Orange,
}

impl ColorTint {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "purple" => Some(Self::Purple),
            "blue" => Some(Self::Blue),
            "orange" => Some(Self::Orange),
            _ => None,
        }
    }

    /// Opaque tint color, `None` for no tint.
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::None => None,
            Self::Purple => Some(Color::from_rgba8(0x93, 0x33, 0xEA, 0xFF)),
            Self::Blue => Some(Color::from_rgba8(0x25, 0x63, 0xEB, 0xFF)),
            Self::Orange => Some(Color::from_rgba8(0xEA, 0x58, 0x0C, 0xFF)),
        }
    }
}

// ─── Config parts ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundEffects {
    /// 0–100
    pub dark_overlay: f64,
    pub color_tint: ColorTint,
    /// 0–100
    pub vignette_intensity: f64,
}

impl BackgroundEffects {
    pub fn dark_alpha(&self) -> f32 {
        (percent(self.dark_overlay, 0.0) / 100.0) as f32
    }

    pub fn vignette_alpha(&self) -> f32 {
        (percent(self.vignette_intensity, 0.0) / 100.0) as f32
    }
}

/// One structured headline line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub id: ElementId,
    pub text: String,
    pub highlight: bool,
}

impl TextLine {
    pub fn new(text: impl Into<String>, highlight: bool) -> Self {
        Self {
            id: ElementId::with_prefix("line"),
            text: text.into(),
            highlight,
        }
    }
}

/// A person cutout placed into a layout zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoConfig {
    pub url: String,
    /// Percent, 50–200.
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl PhotoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scale: 100.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Scale as a multiplier, clamped to [0.5, 2.0].
    pub fn scale_factor(&self) -> f64 {
        if self.scale.is_finite() {
            self.scale.clamp(MIN_PHOTO_SCALE, MAX_PHOTO_SCALE) / 100.0
        } else {
            1.0
        }
    }
}

/// Free-positioned text from the older editor, drawn on top of everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub id: ElementId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
    pub color: String,
    pub text_align: TextAlign,
    pub shadow: bool,
    pub outline: bool,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: ElementId::with_prefix("overlay"),
            text: text.into(),
            x,
            y,
            font_size: DEFAULT_OVERLAY_FONT_SIZE,
            font_family: "Inter".into(),
            font_weight: "bold".into(),
            color: "#FFFFFF".into(),
            text_align: TextAlign::Center,
            shadow: false,
            outline: false,
        }
    }

    /// Font used for both drawing and measuring this overlay.
    pub fn font(&self) -> FontSpec {
        let size = if self.font_size.is_finite() && self.font_size > 0.0 {
            self.font_size
        } else {
            DEFAULT_OVERLAY_FONT_SIZE
        };
        FontSpec::new(self.font_family.clone(), parse_font_weight(&self.font_weight), size as f32)
    }

    pub fn fill_color(&self) -> Color {
        Color::parse(&self.color).unwrap_or(Color::WHITE)
    }

    /// Drawn box of the overlay text (no padding).
    pub fn bounds<M: TextMeasure + ?Sized>(&self, measure: &M) -> Rect {
        text_bounds(measure, &self.font(), &self.text, self.x, self.y, self.text_align)
    }
}

// ─── ThumbnailConfig ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawThumbnailConfig")]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// 0–100, applies to `background_image` only.
    pub background_opacity: f64,
    pub background_effects: BackgroundEffects,
    /// Stored verbatim; use [`ThumbnailConfig::layout_kind`] to read it.
    pub layout: String,
    pub accent_color: AccentColor,
    /// 0–100, alpha of headline highlight boxes.
    pub element_opacity: f64,
    pub text_lines: Vec<TextLine>,
    pub host_photo: Option<PhotoConfig>,
    pub guest_photo: Option<PhotoConfig>,
    pub overlays: Vec<TextOverlay>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background_color: DEFAULT_BACKGROUND.into(),
            background_image: None,
            background_opacity: DEFAULT_BACKGROUND_OPACITY,
            background_effects: BackgroundEffects::default(),
            layout: Layout::Centered.as_str().into(),
            accent_color: AccentColor::default(),
            element_opacity: DEFAULT_ELEMENT_OPACITY,
            text_lines: Vec::new(),
            host_photo: None,
            guest_photo: None,
            overlays: Vec::new(),
        }
    }
}

impl ThumbnailConfig {
    /// Parse a saved JSON blob, tolerating legacy and partial data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn layout_kind(&self) -> Layout {
        Layout::normalize(&self.layout)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width.max(1) as f64, self.height.max(1) as f64)
    }

    pub fn background_alpha(&self) -> f32 {
        (percent(self.background_opacity, DEFAULT_BACKGROUND_OPACITY) / 100.0) as f32
    }

    pub fn element_alpha(&self) -> f32 {
        (percent(self.element_opacity, DEFAULT_ELEMENT_OPACITY) / 100.0) as f32
    }

    pub fn photo(&self, role: PhotoRole) -> Option<&PhotoConfig> {
        match role {
            PhotoRole::Host => self.host_photo.as_ref(),
            PhotoRole::Guest => self.guest_photo.as_ref(),
        }
    }

    pub fn photo_slot_mut(&mut self, role: PhotoRole) -> &mut Option<PhotoConfig> {
        match role {
            PhotoRole::Host => &mut self.host_photo,
            PhotoRole::Guest => &mut self.guest_photo,
        }
    }

    pub fn text_line_mut(&mut self, id: ElementId) -> Option<&mut TextLine> {
        self.text_lines.iter_mut().find(|l| l.id == id)
    }

    pub fn overlay(&self, id: ElementId) -> Option<&TextOverlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    pub fn overlay_mut(&mut self, id: ElementId) -> Option<&mut TextOverlay> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }
}

// ─── Tolerant raw form ───────────────────────────────────────────────────

/// A number that older clients sometimes wrote as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Num(f64),
    Text(String),
}

impl Lenient {
    fn value(&self) -> Option<f64> {
        match self {
            Lenient::Num(v) => v.is_finite().then_some(*v),
            Lenient::Text(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        }
    }
}

fn num(v: &Option<Lenient>) -> Option<f64> {
    v.as_ref().and_then(Lenient::value)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn id_or_generate(id: Option<String>, prefix: &str) -> ElementId {
    match non_empty(id) {
        Some(id) => ElementId::intern(&id),
        None => ElementId::with_prefix(prefix),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawThumbnailConfig {
    width: Option<Lenient>,
    height: Option<Lenient>,
    background_color: Option<String>,
    background_image: Option<String>,
    background_opacity: Option<Lenient>,
    background_effects: Option<RawBackgroundEffects>,
    layout: Option<String>,
    accent_color: Option<String>,
    element_opacity: Option<Lenient>,
    text_lines: Option<Vec<RawTextLine>>,
    host_photo: Option<RawPhotoConfig>,
    guest_photo: Option<RawPhotoConfig>,
    overlays: Option<Vec<RawTextOverlay>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawBackgroundEffects {
    dark_overlay: Option<Lenient>,
    color_tint: Option<String>,
    vignette_intensity: Option<Lenient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTextLine {
    id: Option<String>,
    text: Option<String>,
    highlight: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPhotoConfig {
    url: Option<String>,
    scale: Option<Lenient>,
    offset_x: Option<Lenient>,
    offset_y: Option<Lenient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTextOverlay {
    id: Option<String>,
    text: Option<String>,
    x: Option<Lenient>,
    y: Option<Lenient>,
    font_size: Option<Lenient>,
    font_family: Option<String>,
    font_weight: Option<Lenient>,
    color: Option<String>,
    text_align: Option<String>,
    shadow: Option<bool>,
    outline: Option<bool>,
}

fn dimension(v: &Option<Lenient>, default: u32) -> u32 {
    match num(v) {
        Some(v) if v >= 1.0 => (v.round() as u32).min(MAX_DIMENSION),
        _ => default,
    }
}

impl From<RawBackgroundEffects> for BackgroundEffects {
    fn from(raw: RawBackgroundEffects) -> Self {
        Self {
            dark_overlay: percent(num(&raw.dark_overlay).unwrap_or(0.0), 0.0),
            color_tint: raw
                .color_tint
                .as_deref()
                .and_then(ColorTint::parse)
                .unwrap_or_default(),
            vignette_intensity: percent(num(&raw.vignette_intensity).unwrap_or(0.0), 0.0),
        }
    }
}

impl RawPhotoConfig {
    /// A photo without a URL is the same as no photo.
    fn into_photo(self) -> Option<PhotoConfig> {
        let url = non_empty(self.url)?;
        Some(PhotoConfig {
            url,
            scale: num(&self.scale)
                .unwrap_or(100.0)
                .clamp(MIN_PHOTO_SCALE, MAX_PHOTO_SCALE),
            offset_x: num(&self.offset_x).map(finite_or_zero).unwrap_or(0.0),
            offset_y: num(&self.offset_y).map(finite_or_zero).unwrap_or(0.0),
        })
    }
}

impl From<RawTextLine> for TextLine {
    fn from(raw: RawTextLine) -> Self {
        Self {
            id: id_or_generate(raw.id, "line"),
            text: raw.text.unwrap_or_default(),
            highlight: raw.highlight.unwrap_or(false),
        }
    }
}

impl From<RawTextOverlay> for TextOverlay {
    fn from(raw: RawTextOverlay) -> Self {
        let font_weight = match raw.font_weight {
            Some(Lenient::Num(w)) => format!("{}", w.round() as i64),
            Some(Lenient::Text(w)) if !w.trim().is_empty() => w,
            _ => "bold".into(),
        };
        Self {
            id: id_or_generate(raw.id, "overlay"),
            text: raw.text.unwrap_or_default(),
            x: num(&raw.x).unwrap_or(0.0),
            y: num(&raw.y).unwrap_or(0.0),
            font_size: num(&raw.font_size)
                .filter(|s| *s > 0.0)
                .unwrap_or(DEFAULT_OVERLAY_FONT_SIZE),
            font_family: non_empty(raw.font_family).unwrap_or_else(|| "Inter".into()),
            font_weight,
            color: non_empty(raw.color).unwrap_or_else(|| "#FFFFFF".into()),
            text_align: raw
                .text_align
                .as_deref()
                .and_then(TextAlign::parse)
                .unwrap_or_default(),
            shadow: raw.shadow.unwrap_or(false),
            outline: raw.outline.unwrap_or(false),
        }
    }
}

impl From<RawThumbnailConfig> for ThumbnailConfig {
    fn from(raw: RawThumbnailConfig) -> Self {
        let accent_color = match raw.accent_color.as_deref() {
            Some(s) => AccentColor::parse(s).unwrap_or_else(|| {
                log::debug!("unknown accent color {s:?}, using orange");
                AccentColor::default()
            }),
            None => AccentColor::default(),
        };

        Self {
            width: dimension(&raw.width, DEFAULT_WIDTH),
            height: dimension(&raw.height, DEFAULT_HEIGHT),
            background_color: non_empty(raw.background_color)
                .unwrap_or_else(|| DEFAULT_BACKGROUND.into()),
            background_image: non_empty(raw.background_image),
            background_opacity: percent(
                num(&raw.background_opacity).unwrap_or(DEFAULT_BACKGROUND_OPACITY),
                DEFAULT_BACKGROUND_OPACITY,
            ),
            background_effects: raw.background_effects.map(Into::into).unwrap_or_default(),
            layout: non_empty(raw.layout).unwrap_or_else(|| Layout::Centered.as_str().into()),
            accent_color,
            element_opacity: percent(
                num(&raw.element_opacity).unwrap_or(DEFAULT_ELEMENT_OPACITY),
                DEFAULT_ELEMENT_OPACITY,
            ),
            text_lines: raw
                .text_lines
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            host_photo: raw.host_photo.and_then(RawPhotoConfig::into_photo),
            guest_photo: raw.guest_photo.and_then(RawPhotoConfig::into_photo),
            overlays: raw
                .overlays
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

// Nested parts are deserialized through their raw forms as well, so a
// mutation payload like `{"scale": "300"}` is tolerated the same way.

impl<'de> Deserialize<'de> for BackgroundEffects {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawBackgroundEffects::deserialize(deserializer).map(Into::into)
    }
}

impl<'de> Deserialize<'de> for TextLine {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawTextLine::deserialize(deserializer).map(Into::into)
    }
}

impl<'de> Deserialize<'de> for TextOverlay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawTextOverlay::deserialize(deserializer).map(Into::into)
    }
}

impl<'de> Deserialize<'de> for PhotoConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawPhotoConfig::deserialize(deserializer)?;
        raw.into_photo()
            .ok_or_else(|| serde::de::Error::custom("photo requires a non-empty url"))
    }
}
