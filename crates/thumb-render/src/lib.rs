//! Thumbnail rendering: one draw sequence over any [`Surface`].
//!
//! The same [`CanvasRenderer::render`] drives the interactive canvas and
//! the off-screen raster surface used for PNG export.

pub mod bitmap;
pub mod cache;
pub mod fonts;
pub mod hit;
pub mod pixmap;
pub mod record;
pub mod renderer;
pub mod surface;

pub use bitmap::{ImageError, RasterImage};
pub use cache::{ImageCache, ImageRole, ImageState, LoadTicket};
pub use fonts::{FontBook, FontError};
pub use hit::{HIT_PADDING, find_text_at_position, overlay_hit_box};
pub use pixmap::PixmapSurface;
pub use record::{DrawOp, RecordingSurface};
pub use renderer::{CanvasRenderer, ExportError, RenderOptions, headline_font, headline_line_centers};
pub use surface::{Paint, Shadow, Surface, TextStyle};
