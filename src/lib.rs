//! pixtrace: two-valued bitmap → smooth vector outline.
//!
//! Traces the boundaries of a pixel grid into closed loops of straight
//! segments and cubic Bezier curves, organized into a containment forest
//! of outer contours and holes.
//!
//! # Example
//!
//! ```
//! use pixtrace::{trace, PixelGrid, TraceParams};
//!
//! let grid = PixelGrid::from_ascii(&["####", "####", "####", "####"])?;
//! let outline = trace(&grid, &TraceParams::default())?;
//! assert_eq!(outline.contours().len(), 1);
//! # Ok::<(), pixtrace::TraceError>(())
//! ```

#![forbid(unsafe_code)]

mod bitmap;
mod config;
mod geom;
mod outline;
mod vectorize;

pub mod error;
pub mod output;
pub mod render;

// Re-export kurbo so downstream users get the same version
// used by `Segment` and `Outline::to_bezpath`.
pub use kurbo;

pub use bitmap::{load_bitmap, PixelGrid};
pub use config::{LoadOptions, ThresholdMethod, TraceParams, TurnPolicy};
pub use error::TraceError;
pub use outline::{Outline, Segment, Sign, TracedContour};

use std::path::Path;
use std::time::Instant;

/// Full pipeline: pixel grid → outline.
///
/// Pipeline: pixel-edge contour extraction on the dual grid, containment
/// organization, optimal polygon approximation via DP, alpha-based curve
/// generation and optional merging of adjacent curves.
///
/// An all-background grid gives an empty outline, not an error.
pub fn trace(grid: &PixelGrid, params: &TraceParams) -> Result<Outline, TraceError> {
    params.validate()?;
    let t_start = Instant::now();

    let outline = vectorize::trace(grid, params);

    let holes = outline.contours().iter().filter(|c| c.sign.is_hole()).count();
    tracing::info!(
        width = grid.width(),
        height = grid.height(),
        contours = outline.contours().len(),
        holes,
        segments = outline.segment_count(),
        curves = outline.curve_count(),
        elapsed_ms = t_start.elapsed().as_millis() as u64,
        "traced bitmap"
    );
    Ok(outline)
}

/// Convenience: decode an image file, threshold it and trace it.
///
/// Parameters are checked before the file is touched, so a bad tolerance
/// fails fast without paying for decoding.
pub fn trace_image(path: &Path, load: &LoadOptions, params: &TraceParams) -> Result<Outline, TraceError> {
    params.validate()?;
    let grid = load_bitmap(path, load)?;
    trace(&grid, params)
}
