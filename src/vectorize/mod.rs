//! Vectorization pipeline: bitmap → closed segment loops.
//!
//! 1. Pixel-edge contour extraction (dual grid)
//! 2. Containment forest and outer/hole signs
//! 3. Optimal polygon approximation (DP)
//! 4. Sub-pixel vertex refinement
//! 5. Alpha-based corner detection and Bezier curve generation
//! 6. Merging of adjacent curves (optional)

pub mod curve;
pub mod decompose;
pub mod nesting;
pub mod opticurve;
pub mod polygon;

use rayon::prelude::*;

use crate::bitmap::PixelGrid;
use crate::config::TraceParams;
use crate::outline::{self, Outline, Segment, Sign};

use decompose::Contour;
use polygon::PathSums;

/// Run the full vectorization pipeline on a validated parameter set.
pub fn trace(grid: &PixelGrid, params: &TraceParams) -> Outline {
    // Stage 1-2: contours and their nesting.
    let mut contours = decompose::decompose(grid, params.turn_policy, params.speckle_size);
    nesting::organize(&mut contours);

    // Stage 3-6: contours are independent from here on, so they are fitted
    // in parallel. `collect` keeps the scan order.
    let fitted: Vec<(Option<Vec<Segment>>, usize)> = contours
        .par_iter()
        .map(|contour| fit_contour(contour, params))
        .collect();

    let vertices: usize = fitted.iter().map(|f| f.1).sum();
    let dropped = fitted.iter().filter(|f| f.0.is_none()).count();
    tracing::debug!(vertices, dropped, "reduced contours to polygons");

    let traced = fitted
        .into_iter()
        .zip(&contours)
        .map(|((segments, _), contour)| (segments, contour.sign, contour.parent))
        .collect();
    let outline = outline::assemble(grid.width(), grid.height(), traced);
    tracing::debug!(
        segments = outline.segment_count(),
        curves = outline.curve_count(),
        "fitted curves"
    );
    outline
}

/// Polygon → curve → segments for one contour, plus the polygon's vertex
/// count. No segments if the polygon collapses below a triangle.
fn fit_contour(contour: &Contour, params: &TraceParams) -> (Option<Vec<Segment>>, usize) {
    let sums = PathSums::new(&contour.points);
    let poly = polygon::reduce(contour, &sums);
    if poly.len() < 3 {
        return (None, poly.len());
    }

    let mut vertex = curve::adjust_vertices(contour, &poly, &sums);
    // Holes run clockwise in the result.
    if contour.sign == Sign::Negative {
        vertex.reverse();
    }

    let mut fitted = curve::smooth(vertex, params.alphamax);
    if params.merges_curves() {
        fitted = opticurve::optimize(&fitted, params.opttolerance);
    }
    (Some(fitted.segments()), poly.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TurnPolicy;

    fn run(rows: &[&str], params: &TraceParams) -> Outline {
        trace(&PixelGrid::from_ascii(rows).unwrap(), params)
    }

    const RING: [&str; 8] = [
        "########",
        "########",
        "##....##",
        "##....##",
        "##....##",
        "##....##",
        "########",
        "########",
    ];

    #[test]
    fn hole_is_reversed() {
        let outline = run(&RING, &TraceParams::default());
        assert_eq!(outline.contours().len(), 2);
        let outer = &outline.contours()[0];
        let hole = &outline.contours()[1];
        assert_eq!(hole.parent, Some(0));
        assert!(outer.area() > 0.0);
        assert!(hole.area() < 0.0);
    }

    #[test]
    fn loops_are_closed() {
        let params = TraceParams {
            turn_policy: TurnPolicy::Black,
            ..TraceParams::default()
        };
        let outline = run(&RING, &params);
        for contour in outline.contours() {
            let segs = &contour.segments;
            for (a, b) in segs.iter().zip(segs.iter().cycle().skip(1)) {
                assert_eq!(a.end(), b.start());
            }
        }
    }

    #[test]
    fn merging_never_adds_segments() {
        let rows = [
            "....######....",
            "..##########..",
            ".############.",
            "##############",
            "##############",
            "##############",
            ".############.",
            "..##########..",
            "....######....",
        ];
        let merged = run(&rows, &TraceParams::default());
        let plain = run(
            &rows,
            &TraceParams {
                opticurve: false,
                ..TraceParams::default()
            },
        );
        assert!(merged.segment_count() <= plain.segment_count());
    }
}
