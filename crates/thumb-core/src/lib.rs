pub mod color;
pub mod config;
pub mod fit;
pub mod gradient;
pub mod id;
pub mod layout;
pub mod store;
pub mod text;

pub use color::Color;
pub use config::*;
pub use fit::{CoverFit, clip_radius, cover_fit, place_photo};
pub use gradient::{GradientStop, LinearGradient, parse_linear_gradient};
pub use id::ElementId;
pub use layout::{
    ClipShape, Layout, LayoutPlan, PhotoRole, Viewport, Zone, ZoneKind, normalize_layout, plan_layout,
};
pub use store::{FileStore, MemoryStore, StoreError, ThumbnailId, ThumbnailStore};
pub use text::{
    ApproxMeasure, FontSpec, TextAlign, TextMeasure, TextMetrics, parse_font_weight, text_bounds,
};

// Re-export kurbo geometry so downstream crates share one `Rect` type
pub use kurbo::{Point, Rect};
