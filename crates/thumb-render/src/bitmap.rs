//! Decoded images shared by every surface.

use base64::Engine as _;
use base64::engine::general_purpose;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("invalid data URI: {0}")]
    DataUri(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("pixel buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("image unavailable: {0}")]
    Unavailable(String),
}

/// Straight (non-premultiplied) RGBA8 pixels, cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    key: Arc<str>,
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterImage {
    pub fn from_rgba(
        key: impl Into<Arc<str>>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(ImageError::BufferSize {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            key: key.into(),
            width,
            height,
            rgba: rgba.into(),
        })
    }

    /// Decode PNG/JPEG/GIF/WebP bytes.
    pub fn decode(key: impl Into<Arc<str>>, bytes: &[u8]) -> Result<Self, ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(key, width, height, rgba.into_raw())
    }

    /// Decode a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let bytes = decode_data_uri(uri)?;
        Self::decode(uri, &bytes)
    }

    /// Source URL or data URI this image was loaded from.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

pub fn is_data_uri(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Payload bytes of a base64 data URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImageError> {
    let uri = uri.trim();
    if !is_data_uri(uri) {
        return Err(ImageError::DataUri("missing data: scheme".into()));
    }
    let (meta, payload) = uri[5..]
        .split_once(',')
        .ok_or_else(|| ImageError::DataUri("missing ',' separator".into()))?;
    if !meta.to_ascii_lowercase().ends_with(";base64") {
        return Err(ImageError::DataUri(format!("unsupported encoding in {meta:?}")));
    }
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(general_purpose::STANDARD.decode(payload)?)
}

/// Encode bytes as a `data:<mime>;base64,...` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}
