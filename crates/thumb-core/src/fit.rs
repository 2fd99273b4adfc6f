//! Cover-fit geometry for person photos and background images.

use crate::config::PhotoConfig;
use crate::layout::{ClipShape, Zone};
use kurbo::Rect;

/// Result of fitting an image over a target box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    /// Box the image must cover.
    pub target: Rect,
    /// Where the whole image is drawn; covers `target`, centered on it.
    pub draw: Rect,
    /// Part of the image (in image pixels) that lands inside `target`.
    pub crop: Rect,
}

/// Scale an `image_w × image_h` image uniformly so it covers `target`,
/// overflowing symmetrically on one axis.
///
/// Returns `None` for degenerate images or targets.
pub fn cover_fit(image_w: f64, image_h: f64, target: Rect) -> Option<CoverFit> {
    let (tw, th) = (target.width(), target.height());
    if !(image_w > 0.0 && image_h > 0.0 && tw > 0.0 && th > 0.0) {
        return None;
    }

    let sx = tw / image_w;
    let sy = th / image_h;
    // The binding axis is set exactly so it never drifts below the target.
    let (dw, dh, scale) = if sx >= sy {
        (tw, image_h * sx, sx)
    } else {
        (image_w * sy, th, sy)
    };

    let center = target.center();
    let draw = Rect::new(
        center.x - dw / 2.0,
        center.y - dh / 2.0,
        center.x + dw / 2.0,
        center.y + dh / 2.0,
    );

    let crop_w = tw / scale;
    let crop_h = th / scale;
    let crop = Rect::new(
        (image_w - crop_w) / 2.0,
        (image_h - crop_h) / 2.0,
        (image_w + crop_w) / 2.0,
        (image_h + crop_h) / 2.0,
    );

    Some(CoverFit { target, draw, crop })
}

/// The box a photo occupies inside its zone after scale and offset.
///
/// Scale grows or shrinks the zone box around its bottom-center (cutouts
/// stand on the bottom edge); the offset then translates it.
pub fn place_photo(zone: &Zone, photo: &PhotoConfig) -> Rect {
    let factor = photo.scale_factor();
    let w = zone.rect.width() * factor;
    let h = zone.rect.height() * factor;
    let cx = zone.rect.center().x + photo.offset_x;
    let bottom = zone.rect.y1 + photo.offset_y;
    Rect::new(cx - w / 2.0, bottom - h, cx + w / 2.0, bottom)
}

/// Corner radius of the clip for a placed photo box.
pub fn clip_radius(clip: ClipShape, placed: Rect) -> f64 {
    match clip {
        ClipShape::Rect => 0.0,
        ClipShape::RoundedTop => placed.width() / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ZoneKind;

    fn covers(fit: &CoverFit) -> bool {
        let eps = 1e-9;
        fit.draw.x0 <= fit.target.x0 + eps
            && fit.draw.y0 <= fit.target.y0 + eps
            && fit.draw.x1 >= fit.target.x1 - eps
            && fit.draw.y1 >= fit.target.y1 - eps
    }

    #[test]
    fn cover_fit_covers_for_many_aspects() {
        let targets = [
            Rect::new(0.0, 0.0, 384.0, 576.0),
            Rect::new(10.0, 20.0, 1290.0, 740.0),
            Rect::new(5.0, 5.0, 6.0, 500.0),
        ];
        let images = [(100.0, 100.0), (1920.0, 1080.0), (300.0, 1200.0), (1.0, 999.0)];
        for target in targets {
            for (iw, ih) in images {
                let fit = cover_fit(iw, ih, target).unwrap();
                assert!(covers(&fit), "{iw}x{ih} over {target:?} -> {:?}", fit.draw);
                let w_eq = fit.draw.width() == target.width();
                let h_eq = fit.draw.height() == target.height();
                assert!(w_eq || h_eq, "one axis must match exactly");
                let aspect_in = iw / ih;
                let aspect_out = fit.draw.width() / fit.draw.height();
                assert!((aspect_in - aspect_out).abs() / aspect_in < 1e-9);
            }
        }
    }

    #[test]
    fn crop_is_symmetric() {
        let fit = cover_fit(200.0, 100.0, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(fit.crop, Rect::new(50.0, 0.0, 150.0, 100.0));
        assert_eq!(fit.draw, Rect::new(-50.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(cover_fit(0.0, 10.0, Rect::new(0.0, 0.0, 10.0, 10.0)).is_none());
        assert!(cover_fit(10.0, 10.0, Rect::new(0.0, 0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn placement_scales_around_bottom_center() {
        let zone = Zone {
            kind: ZoneKind::Left,
            rect: Rect::new(100.0, 200.0, 300.0, 600.0),
            clip: ClipShape::RoundedTop,
        };
        let photo = PhotoConfig {
            url: "host.png".into(),
            scale: 150.0,
            offset_x: 10.0,
            offset_y: -5.0,
        };
        let placed = place_photo(&zone, &photo);
        assert_eq!(placed.width(), 300.0);
        assert_eq!(placed.height(), 600.0);
        assert_eq!(placed.center().x, 210.0);
        assert_eq!(placed.y1, 595.0);
        assert_eq!(clip_radius(zone.clip, placed), 150.0);
    }

    #[test]
    fn out_of_range_scale_is_clamped() {
        let zone = Zone {
            kind: ZoneKind::CenterBottom,
            rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            clip: ClipShape::Rect,
        };
        for (raw, expected) in [(-40.0, 50.0), (0.0, 50.0), (10_000.0, 200.0), (f64::NAN, 100.0)] {
            let photo = PhotoConfig {
                url: "x".into(),
                scale: raw,
                offset_x: 0.0,
                offset_y: 0.0,
            };
            let placed = place_photo(&zone, &photo);
            assert!(placed.width() > 0.0 && placed.height() > 0.0);
            assert_eq!(placed.width(), expected, "scale {raw}");
        }
    }
}
