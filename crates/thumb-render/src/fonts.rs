//! Font book for the raster surface, backed by `fontdue`.
//!
//! Faces are registered per family and weight. Lookups match the first
//! family of a [`FontSpec`] case-insensitively and pick the nearest weight;
//! when the family is unknown any registered face is used. With no faces
//! at all, measurement falls back to [`ApproxMeasure`] and text is skipped.

use fontdue::{Font, FontSettings};
use std::path::Path;
use thiserror::Error;
use thumb_core::{ApproxMeasure, FontSpec, TextMeasure, TextMetrics};

/// Well-known locations probed by [`FontBook::with_system_fallback`].
const SYSTEM_FONTS: &[(&str, u16, &str)] = &[
    ("DejaVu Sans", 700, "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
    ("DejaVu Sans", 400, "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    ("Liberation Sans", 700, "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf"),
    ("Liberation Sans", 400, "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
    ("Arial", 700, "/Library/Fonts/Arial Bold.ttf"),
    ("Arial", 700, "C:\\Windows\\Fonts\\arialbd.ttf"),
    ("Arial", 400, "C:\\Windows\\Fonts\\arial.ttf"),
];

#[derive(Debug, Error)]
pub enum FontError {
    #[error("could not read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse font: {0}")]
    Parse(&'static str),
}

struct Face {
    family: String,
    weight: u16,
    font: Font,
}

/// Coverage bitmap of one laid-out line of text.
#[derive(Debug, Clone)]
pub struct GlyphRun {
    pub width: u32,
    pub height: u32,
    /// One coverage byte per pixel, row-major.
    pub coverage: Vec<u8>,
    /// Pixel offset of the pen origin inside the bitmap.
    pub origin_x: f32,
    /// Distance from the bitmap top to the alphabetic baseline.
    pub baseline: f32,
    pub metrics: TextMetrics,
}

const RUN_PADDING: f32 = 2.0;

#[derive(Default)]
pub struct FontBook {
    faces: Vec<Face>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.faces.iter().map(|face| (&face.family, face.weight)))
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A book holding whichever well-known system fonts exist.
    pub fn with_system_fallback() -> Self {
        let mut book = Self::new();
        for (family, weight, path) in SYSTEM_FONTS {
            if Path::new(path).exists() {
                match book.load_file(family, Some(*weight), path) {
                    Ok(()) => log::debug!("loaded system font {path}"),
                    Err(e) => log::debug!("skipping system font {path}: {e}"),
                }
            }
        }
        book
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn add_bytes(&mut self, family: &str, weight: u16, bytes: &[u8]) -> Result<(), FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(FontError::Parse)?;
        self.faces.push(Face {
            family: family.trim().to_ascii_lowercase(),
            weight,
            font,
        });
        Ok(())
    }

    /// Register a font file. Without an explicit weight it is guessed
    /// from the file name (`Inter-Bold.ttf` → 700).
    pub fn load_file(
        &mut self,
        family: &str,
        weight: Option<u16>,
        path: impl AsRef<Path>,
    ) -> Result<(), FontError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let weight = weight.unwrap_or_else(|| weight_from_file_name(path));
        self.add_bytes(family, weight, &bytes)
    }

    fn resolve(&self, spec: &FontSpec) -> Option<&Font> {
        let family = spec.primary_family().to_ascii_lowercase();
        nearest_weight(self.faces.iter().filter(|f| f.family == family), spec.weight)
            .or_else(|| nearest_weight(self.faces.iter(), spec.weight))
    }

    fn layout(font: &Font, text: &str, size: f32) -> (Vec<(char, f32)>, f32) {
        let mut pen = 0.0;
        let mut prev: Option<char> = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for c in text.chars() {
            if let Some(p) = prev {
                pen += font.horizontal_kern(p, c, size).unwrap_or(0.0);
            }
            glyphs.push((c, pen));
            pen += font.metrics(c, size).advance_width;
            prev = Some(c);
        }
        (glyphs, pen)
    }

    fn line_metrics(font: &Font, size: f32) -> (f32, f32) {
        match font.horizontal_line_metrics(size) {
            Some(m) => (m.ascent, -m.descent),
            None => (size * 0.8, size * 0.2),
        }
    }

    /// Rasterize one line. `None` when no font is registered or the text
    /// is empty.
    pub fn rasterize_run(&self, spec: &FontSpec, text: &str) -> Option<GlyphRun> {
        if text.is_empty() {
            return None;
        }
        let font = self.resolve(spec)?;
        let size = spec.size;
        let (glyphs, advance) = Self::layout(font, text, size);
        let (ascent, descent) = Self::line_metrics(font, size);

        let width = (advance + RUN_PADDING * 2.0).ceil().max(1.0) as u32;
        let height = (ascent + descent + RUN_PADDING * 2.0).ceil().max(1.0) as u32;
        let baseline = RUN_PADDING + ascent;
        let mut coverage = vec![0u8; width as usize * height as usize];

        for (c, pen) in glyphs {
            let (m, bitmap) = font.rasterize(c, size);
            let gx = (RUN_PADDING + pen).round() as i32 + m.xmin;
            let gy = baseline.round() as i32 - (m.ymin + m.height as i32);
            for row in 0..m.height {
                let py = gy + row as i32;
                if py < 0 || py >= height as i32 {
                    continue;
                }
                for col in 0..m.width {
                    let px = gx + col as i32;
                    if px < 0 || px >= width as i32 {
                        continue;
                    }
                    let dst = &mut coverage[py as usize * width as usize + px as usize];
                    *dst = dst.saturating_add(bitmap[row * m.width + col]);
                }
            }
        }

        Some(GlyphRun {
            width,
            height,
            coverage,
            origin_x: RUN_PADDING,
            baseline,
            metrics: TextMetrics {
                width: advance as f64,
                ascent: ascent as f64,
                descent: descent as f64,
            },
        })
    }
}

impl TextMeasure for FontBook {
    fn measure_text(&self, font: &FontSpec, text: &str) -> TextMetrics {
        let Some(face) = self.resolve(font) else {
            return ApproxMeasure.measure_text(font, text);
        };
        let (_, advance) = Self::layout(face, text, font.size);
        let (ascent, descent) = Self::line_metrics(face, font.size);
        TextMetrics {
            width: advance as f64,
            ascent: ascent as f64,
            descent: descent as f64,
        }
    }
}

fn nearest_weight<'a>(faces: impl Iterator<Item = &'a Face>, weight: u16) -> Option<&'a Font> {
    faces
        .min_by_key(|f| (f.weight as i32 - weight as i32).unsigned_abs())
        .map(|f| &f.font)
}

fn weight_from_file_name(path: &Path) -> u16 {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
        .replace(['-', '_', ' '], "");
    // Longest names first so "extrabold" does not match "bold"
    const WEIGHTS: &[(&str, u16)] = &[
        ("extrabold", 800),
        ("semibold", 600),
        ("extralight", 200),
        ("black", 900),
        ("heavy", 900),
        ("bold", 700),
        ("medium", 500),
        ("light", 300),
        ("thin", 100),
    ];
    WEIGHTS
        .iter()
        .find(|(needle, _)| name.contains(needle))
        .map_or(400, |(_, w)| *w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_book_measures_approximately() {
        let book = FontBook::new();
        let spec = FontSpec::new("Inter", 700, 80.0);
        assert_eq!(
            book.measure_text(&spec, "HELLO"),
            ApproxMeasure.measure_text(&spec, "HELLO")
        );
        assert!(book.rasterize_run(&spec, "HELLO").is_none());
    }

    #[test]
    fn weight_is_guessed_from_file_name() {
        assert_eq!(weight_from_file_name(Path::new("Inter-ExtraBold.ttf")), 800);
        assert_eq!(weight_from_file_name(Path::new("Inter-Bold.ttf")), 700);
        assert_eq!(weight_from_file_name(Path::new("Inter_SemiBold.otf")), 600);
        assert_eq!(weight_from_file_name(Path::new("Inter.ttf")), 400);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut book = FontBook::new();
        assert!(matches!(
            book.add_bytes("Broken", 400, b"definitely not a font"),
            Err(FontError::Parse(_))
        ));
        assert!(book.is_empty());
    }

    #[test]
    fn system_fonts_measure_consistently_when_present() {
        let book = FontBook::with_system_fallback();
        if book.is_empty() {
            return;
        }
        let spec = FontSpec::new("Inter", 700, 40.0);
        let metrics = book.measure_text(&spec, "Hello");
        let run = book.rasterize_run(&spec, "Hello").unwrap();
        assert_eq!(run.metrics.width, metrics.width);
        assert!(run.coverage.iter().any(|&c| c > 0));
    }
}
