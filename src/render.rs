//! Raster rendering of traced outlines.
//!
//! Converts kurbo paths back to pixels via tiny-skia, either at grid
//! resolution for pixel-by-pixel comparison with the source, or scaled up
//! as an anti-aliased PNG preview.

use std::path::Path;

use kurbo::{BezPath, PathEl};

use crate::bitmap::PixelGrid;
use crate::error::TraceError;
use crate::outline::Outline;

/// Convert a kurbo `BezPath` to a `tiny_skia::Path`.
fn kurbo_to_tinyskia(bezpath: &BezPath, transform: tiny_skia::Transform) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for el in bezpath.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                let (x, y) = transform_point(p.x, p.y, transform);
                pb.move_to(x, y);
            }
            PathEl::LineTo(p) => {
                let (x, y) = transform_point(p.x, p.y, transform);
                pb.line_to(x, y);
            }
            PathEl::QuadTo(c, p) => {
                let (cx, cy) = transform_point(c.x, c.y, transform);
                let (px, py) = transform_point(p.x, p.y, transform);
                pb.quad_to(cx, cy, px, py);
            }
            PathEl::CurveTo(c1, c2, p) => {
                let (c1x, c1y) = transform_point(c1.x, c1.y, transform);
                let (c2x, c2y) = transform_point(c2.x, c2.y, transform);
                let (px, py) = transform_point(p.x, p.y, transform);
                pb.cubic_to(c1x, c1y, c2x, c2y, px, py);
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Apply transform manually to a point (f64 → f32).
fn transform_point(x: f64, y: f64, t: tiny_skia::Transform) -> (f32, f32) {
    let x = x as f32;
    let y = y as f32;
    (t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty)
}

/// Fill the outline into a fresh pixmap of `scale` × the grid size.
///
/// The grid frame and tiny-skia's frame agree (row 0 on top), so only a
/// uniform scale is applied. Holes cut out under the nonzero rule because
/// they run opposite to their parents.
fn fill(outline: &Outline, scale: f32, anti_alias: bool, background: tiny_skia::Color) -> Result<tiny_skia::Pixmap, TraceError> {
    let w = (outline.width() as f32 * scale).round() as u32;
    let h = (outline.height() as f32 * scale).round() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| TraceError::Render(format!("cannot allocate {}x{} pixmap", w, h)))?;
    pixmap.fill(background);

    let mut paint = tiny_skia::Paint::default();
    paint.set_color(tiny_skia::Color::BLACK);
    paint.anti_alias = anti_alias;

    if let Some(sk_path) = kurbo_to_tinyskia(&outline.to_bezpath(), tiny_skia::Transform::from_scale(scale, scale)) {
        pixmap.fill_path(
            &sk_path,
            &paint,
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );
    }
    Ok(pixmap)
}

/// Rasterize an outline back onto its source grid.
///
/// A pixel is foreground when its center falls inside the filled outline.
pub fn rasterize(outline: &Outline) -> Result<PixelGrid, TraceError> {
    let pixmap = fill(outline, 1.0, false, tiny_skia::Color::TRANSPARENT)?;
    let width = pixmap.width();
    let pixels = pixmap.pixels();
    PixelGrid::from_fn(outline.width(), outline.height(), |x, y| {
        pixels[(y * width + x) as usize].alpha() > 0
    })
}

/// Render a black-on-white, anti-aliased PNG preview at `scale` × the grid size.
pub fn save_preview(outline: &Outline, path: &Path, scale: f32) -> Result<(), TraceError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(TraceError::Render(format!("invalid preview scale {}", scale)));
    }
    let pixmap = fill(outline, scale, true, tiny_skia::Color::WHITE)?;
    pixmap
        .save_png(path)
        .map_err(|e| TraceError::Render(e.to_string()))?;
    tracing::debug!(path = %path.display(), width = pixmap.width(), height = pixmap.height(), "saved preview");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TraceParams;

    #[test]
    fn transform_point_applies_scale_and_offset() {
        let t = tiny_skia::Transform::from_row(2.0, 0.0, 0.0, 3.0, 1.0, -1.0);
        assert_eq!(transform_point(1.0, 1.0, t), (3.0, 2.0));
    }

    #[test]
    fn polygonal_block_rasterizes_exactly() {
        let grid = PixelGrid::from_ascii(&["......", ".####.", ".####.", ".####.", "......"]).unwrap();
        let params = TraceParams {
            alphamax: 0.0,
            ..TraceParams::default()
        };
        let outline = crate::trace(&grid, &params).unwrap();
        assert_eq!(rasterize(&outline).unwrap(), grid);
    }

    #[test]
    fn bad_preview_scale_is_rejected() {
        let grid = PixelGrid::from_ascii(&["##", "##"]).unwrap();
        let outline = crate::trace(&grid, &TraceParams::default()).unwrap();
        let err = save_preview(&outline, Path::new("unused.png"), 0.0).unwrap_err();
        assert!(matches!(err, TraceError::Render(_)));
    }
}
