//! Fonts, text alignment, and text measurement.
//!
//! Every surface measures text through [`TextMeasure`] with the same
//! [`FontSpec`] it draws with, so highlight boxes, selection boxes and hit
//! boxes line up with the glyphs.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    /// Lenient parse (`start`/`end` map to left/right); unknown → `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "centre" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Left edge of a run of `width` anchored at `x` with this alignment.
    pub fn left_edge(&self, x: f64, width: f64) -> f64 {
        match self {
            Self::Left => x,
            Self::Center => x - width / 2.0,
            Self::Right => x - width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16, // 100..900
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Inter".into(),
            weight: 400,
            size: 16.0,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>, weight: u16, size: f32) -> Self {
        Self {
            family: family.into(),
            weight,
            size,
        }
    }

    /// CSS font shorthand, e.g. `700 80px Inter`.
    pub fn css(&self) -> String {
        format!("{} {}px {}", self.weight, self.size, self.family)
    }

    /// First family of a comma-separated list, unquoted.
    pub fn primary_family(&self) -> &str {
        self.family
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
    }
}

/// Parse a CSS font weight (`bold`, `normal`, `600`, ...). Unknown → 400.
pub fn parse_font_weight(s: &str) -> u16 {
    match s.trim().to_ascii_lowercase().as_str() {
        "thin" | "hairline" => 100,
        "light" | "lighter" => 300,
        "normal" | "regular" | "" => 400,
        "medium" => 500,
        "semibold" | "semi-bold" => 600,
        "bold" | "bolder" => 700,
        "extrabold" | "extra-bold" => 800,
        "black" | "heavy" => 900,
        other => other
            .parse::<u16>()
            .map(|w| w.clamp(100, 900))
            .unwrap_or(400),
    }
}

/// Measured extent of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

/// Measures text the way the owning surface will draw it.
pub trait TextMeasure {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics;
}

/// Font-independent fallback metrics from per-character width classes.
///
/// Used when no real font is available (tests, headless runs without a
/// font file). Deterministic across platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics {
        let size = font.size as f64;
        let em: f64 = text
            .chars()
            .map(|c| match c {
                'i' | 'l' | 'j' | '.' | ',' | '\'' | '!' | '|' | ':' | ';' => 0.28,
                ' ' => 0.3,
                'M' | 'W' | 'm' | 'w' => 0.85,
                c if c.is_uppercase() => 0.68,
                _ => 0.55,
            })
            .sum();
        let bold = if font.weight >= 600 { 1.06 } else { 1.0 };
        TextMetrics {
            width: em * size * bold,
            ascent: size * 0.8,
            descent: size * 0.2,
        }
    }
}

/// Box of a single line drawn with a middle baseline at `(x, y)`.
///
/// The vertical extent is the font's em box, horizontally the measured
/// advance width placed according to `align`.
pub fn text_bounds<M: TextMeasure + ?Sized>(
    measure: &M,
    font: &FontSpec,
    text: &str,
    x: f64,
    y: f64,
    align: TextAlign,
) -> Rect {
    let width = measure.measure_text(font, text).width;
    let height = font.size as f64;
    let left = align.left_edge(x, width);
    Rect::new(left, y - height / 2.0, left + width, y + height / 2.0)
}
