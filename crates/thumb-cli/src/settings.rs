//! CLI settings: environment first, then command-line flags on top.

use crate::CliError;
use std::path::PathBuf;
use thumb_render::FontBook;

pub const STORE_DIR_ENV: &str = "THUMB_STORE_DIR";
pub const FONT_ENV: &str = "THUMB_FONT";
const DEFAULT_STORE_DIR: &str = "thumbnails";
/// Family the `THUMB_FONT` / `--default-font` file is registered under.
const DEFAULT_FONT_FAMILY: &str = "Inter";

/// A `--font <family>=<path>` registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontArg {
    pub family: String,
    pub path: PathBuf,
}

impl FontArg {
    pub fn parse(s: &str) -> Result<Self, CliError> {
        let (family, path) = s
            .split_once('=')
            .filter(|(family, path)| !family.trim().is_empty() && !path.trim().is_empty())
            .ok_or_else(|| CliError::Usage(format!("expected --font <family>=<path>, got {s:?}")))?;
        Ok(Self {
            family: family.trim().to_owned(),
            path: PathBuf::from(path.trim()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_dir: PathBuf,
    pub default_font: Option<PathBuf>,
    pub fonts: Vec<FontArg>,
    /// Skip well-known system font paths.
    pub no_system_fonts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            default_font: None,
            fonts: Vec::new(),
            no_system_fonts: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup; empty values count as unset.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| var(name).filter(|v: &String| !v.trim().is_empty());
        let mut settings = Self::default();
        if let Some(dir) = var(STORE_DIR_ENV) {
            settings.store_dir = PathBuf::from(dir);
        }
        settings.default_font = var(FONT_ENV).map(PathBuf::from);
        settings
    }

    /// Consume the flags this struct understands and return the remaining
    /// positional arguments in order.
    pub fn apply_flags(&mut self, args: &[String]) -> Result<Vec<String>, CliError> {
        let mut positional = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))
            };
            match arg.as_str() {
                "--store" => self.store_dir = PathBuf::from(value("--store")?),
                "--font" => self.fonts.push(FontArg::parse(&value("--font")?)?),
                "--default-font" => self.default_font = Some(PathBuf::from(value("--default-font")?)),
                "--no-system-fonts" => self.no_system_fonts = true,
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option {flag}")));
                }
                _ => positional.push(arg.clone()),
            }
        }
        Ok(positional)
    }

    /// Fonts for raster export. Explicit registrations fail loudly; the
    /// system fallback is best effort.
    pub fn font_book(&self) -> Result<FontBook, CliError> {
        let mut book = if self.no_system_fonts {
            FontBook::new()
        } else {
            FontBook::with_system_fallback()
        };
        if let Some(path) = &self.default_font {
            book.load_file(DEFAULT_FONT_FAMILY, None, path)
                .map_err(|source| CliError::Font {
                    path: path.clone(),
                    source,
                })?;
        }
        for font in &self.fonts {
            book.load_file(&font.family, None, &font.path)
                .map_err(|source| CliError::Font {
                    path: font.path.clone(),
                    source,
                })?;
        }
        if book.is_empty() {
            log::warn!("no fonts available; exported text will be missing");
        }
        Ok(book)
    }
}
