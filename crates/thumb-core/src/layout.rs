//! Layout engine: named layout → headline anchor + photo zones.
//!
//! Layout names are stored verbatim in saved configs (including the legacy
//! spellings `left-aligned` and `stacked`) and normalized here, at read time.
//! Anything unrecognized renders as [`Layout::Centered`].

use crate::text::TextAlign;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// The canvas (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Normalized layout variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layout {
    #[default]
    Centered,
    TwoFace,
    SoloLeft,
    SoloRight,
}

/// Legacy layout names still found in older saved thumbnails.
const LEGACY_LAYOUTS: &[(&str, Layout)] = &[
    ("left-aligned", Layout::SoloLeft),
    ("stacked", Layout::Centered),
];

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::Centered,
        Layout::TwoFace,
        Layout::SoloLeft,
        Layout::SoloRight,
    ];

    /// Map a stored layout name to its variant. Never fails.
    pub fn normalize(name: &str) -> Self {
        let name = name.trim();
        if let Some((_, layout)) = LEGACY_LAYOUTS
            .iter()
            .find(|(legacy, _)| legacy.eq_ignore_ascii_case(name))
        {
            return *layout;
        }
        Self::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| {
                if !name.is_empty() {
                    log::debug!("unknown layout {name:?}, using centered");
                }
                Layout::Centered
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Centered => "centered",
            Layout::TwoFace => "twoFace",
            Layout::SoloLeft => "soloLeft",
            Layout::SoloRight => "soloRight",
        }
    }
}

/// Normalize a layout name to its canonical spelling.
pub fn normalize_layout(name: &str) -> &'static str {
    Layout::normalize(name).as_str()
}

// ─── Zones ───────────────────────────────────────────────────────────────

/// Which configured person photo a zone is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoRole {
    Host,
    Guest,
}

/// Named photo placement regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    Left,
    Right,
    CenterBottom,
    RightThird,
}

/// How a placed photo is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipShape {
    /// Plain rectangle (the placed box itself).
    Rect,
    /// Rounded top corners with radius = half the placed box width.
    RoundedTop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub kind: ZoneKind,
    pub rect: Rect,
    pub clip: ClipShape,
}

/// Resolved placement for one layout at one canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPlan {
    pub layout: Layout,
    /// Headline anchor X; the block's lines are aligned on it.
    pub text_x: f64,
    pub text_align: TextAlign,
    pub host: Option<Zone>,
    pub guest: Option<Zone>,
}

impl LayoutPlan {
    pub fn zone_for(&self, role: PhotoRole) -> Option<Zone> {
        match role {
            PhotoRole::Host => self.host,
            PhotoRole::Guest => self.guest,
        }
    }
}

const SIDE_ZONE_WIDTH: f64 = 0.30;
const SIDE_ZONE_HEIGHT: f64 = 0.80;
const SIDE_ZONE_MARGIN: f64 = 0.04;
const CENTER_ZONE_WIDTH: f64 = 0.35;
const CENTER_ZONE_HEIGHT: f64 = 0.85;
const SOLO_LEFT_TEXT_X: f64 = 0.55;
const SOLO_RIGHT_TEXT_X: f64 = 0.45;

fn zone(kind: ZoneKind, vp: Viewport, clip: ClipShape) -> Zone {
    let (w, h) = (vp.width, vp.height);
    let rect = match kind {
        ZoneKind::Left => {
            let x0 = w * SIDE_ZONE_MARGIN;
            Rect::new(x0, h * (1.0 - SIDE_ZONE_HEIGHT), x0 + w * SIDE_ZONE_WIDTH, h)
        }
        ZoneKind::Right => {
            let x1 = w * (1.0 - SIDE_ZONE_MARGIN);
            Rect::new(x1 - w * SIDE_ZONE_WIDTH, h * (1.0 - SIDE_ZONE_HEIGHT), x1, h)
        }
        ZoneKind::CenterBottom => {
            let zw = w * CENTER_ZONE_WIDTH;
            Rect::new((w - zw) / 2.0, h * (1.0 - CENTER_ZONE_HEIGHT), (w + zw) / 2.0, h)
        }
        ZoneKind::RightThird => {
            let zw = w * SIDE_ZONE_WIDTH;
            let cx = w * 5.0 / 6.0;
            Rect::new(cx - zw / 2.0, h * (1.0 - SIDE_ZONE_HEIGHT), cx + zw / 2.0, h)
        }
    };
    Zone { kind, rect, clip }
}

/// Compute headline anchor and photo zones for `layout`.
///
/// `guest_in_centered` controls whether the centered layout gets a guest
/// zone at all; the other single-person layouts never do.
pub fn plan_layout(layout: Layout, vp: Viewport, guest_in_centered: bool) -> LayoutPlan {
    let (text_x, text_align, host, guest) = match layout {
        Layout::Centered => (
            vp.width / 2.0,
            TextAlign::Center,
            Some(zone(ZoneKind::CenterBottom, vp, ClipShape::Rect)),
            guest_in_centered.then(|| zone(ZoneKind::RightThird, vp, ClipShape::RoundedTop)),
        ),
        Layout::TwoFace => (
            vp.width / 2.0,
            TextAlign::Center,
            Some(zone(ZoneKind::Left, vp, ClipShape::RoundedTop)),
            Some(zone(ZoneKind::Right, vp, ClipShape::RoundedTop)),
        ),
        Layout::SoloLeft => (
            vp.width * SOLO_LEFT_TEXT_X,
            TextAlign::Left,
            Some(zone(ZoneKind::Right, vp, ClipShape::RoundedTop)),
            None,
        ),
        Layout::SoloRight => (
            vp.width * SOLO_RIGHT_TEXT_X,
            TextAlign::Right,
            Some(zone(ZoneKind::Left, vp, ClipShape::RoundedTop)),
            None,
        ),
    };

    LayoutPlan {
        layout,
        text_x,
        text_align,
        host,
        guest,
    }
}
