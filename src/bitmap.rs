//! Two-valued pixel grid and the image decoding adapter.
//!
//! Pixel (x, y) covers the unit square [x, x+1] × [y, y+1] of the tracing
//! plane. Row 0 of the grid is row 0 of the source image; no flipping is
//! performed, so traced coordinates line up with the image's own pixels.

use std::path::Path;

use image::GrayImage;
use imageproc::contrast::otsu_level;

use crate::config::{LoadOptions, ThresholdMethod};
use crate::error::TraceError;

/// Largest side length; keeps corner coordinates (and their doubles) in `i32`.
/// Cell offsets are computed in `usize`, so the cell count may exceed `i32::MAX`.
const MAX_SIDE: u32 = 1 << 20;

/// Dense foreground/background raster.
///
/// Immutable once built; reads outside the grid return background, which
/// acts as a one-pixel background border around the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    data: Vec<bool>,
    width: u32,
    height: u32,
}

impl PixelGrid {
    /// Build from a row-major buffer of `width * height` cells.
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> Result<Self, TraceError> {
        let expected = width as usize * height as usize;
        if width == 0
            || height == 0
            || data.len() != expected
            || width > MAX_SIDE
            || height > MAX_SIDE
        {
            return Err(TraceError::InvalidGrid {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Build by evaluating `f(x, y)` for every cell.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> bool,
    ) -> Result<Self, TraceError> {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    /// Parse rows of text: `#`, `X` and `1` are foreground, anything else is
    /// background. Ragged rows are rejected.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, TraceError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for row in rows {
            if row.chars().count() as u32 != width {
                return Err(TraceError::InvalidGrid {
                    width,
                    height,
                    len: data.len() + row.chars().count(),
                });
            }
            data.extend(row.chars().map(|c| matches!(c, '#' | 'X' | '1')));
        }
        Self::new(width, height, data)
    }

    /// Threshold a grayscale image. Dark pixels become foreground.
    pub fn from_luma(img: &GrayImage, options: &LoadOptions) -> Result<Self, TraceError> {
        // Otsu's level is the last value of the dark class.
        let limit = match options.threshold {
            ThresholdMethod::Fixed(t) => t as u16,
            ThresholdMethod::Otsu => {
                let t = otsu_level(img);
                tracing::debug!(threshold = t, "otsu threshold");
                t as u16 + 1
            }
        };
        let (w, h) = img.dimensions();
        Self::from_fn(w, h, |x, y| {
            ((img.get_pixel(x, y).0[0] as u16) < limit) != options.invert
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y). Out-of-range coordinates are background.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&set| set).count()
    }

    /// Copy with foreground and background swapped.
    pub fn inverted(&self) -> Self {
        Self {
            data: self.data.iter().map(|&set| !set).collect(),
            width: self.width,
            height: self.height,
        }
    }

    pub(crate) fn cells(&self) -> &[bool] {
        &self.data
    }
}

/// Decode an image file and threshold it into a grid.
pub fn load_bitmap(path: &Path, options: &LoadOptions) -> Result<PixelGrid, TraceError> {
    let img = image::open(path)
        .map_err(|e| TraceError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .into_luma8();
    PixelGrid::from_luma(&img, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn out_of_range_reads_are_background() {
        let grid = PixelGrid::from_ascii(&["##", "##"]).unwrap();
        assert!(grid.get(0, 0));
        assert!(grid.get(1, 1));
        assert!(!grid.get(-1, 0));
        assert!(!grid.get(0, -1));
        assert!(!grid.get(2, 0));
        assert!(!grid.get(0, 2));
    }

    #[test]
    fn malformed_grids_are_rejected() {
        assert!(matches!(
            PixelGrid::new(0, 3, vec![]),
            Err(TraceError::InvalidGrid { .. })
        ));
        assert!(matches!(
            PixelGrid::new(2, 2, vec![true; 3]),
            Err(TraceError::InvalidGrid { len: 3, .. })
        ));
        assert!(matches!(
            PixelGrid::from_ascii(&["##", "#"]),
            Err(TraceError::InvalidGrid { .. })
        ));
        assert!(matches!(
            PixelGrid::from_ascii(&[]),
            Err(TraceError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn ascii_layout_is_row_major() {
        let grid = PixelGrid::from_ascii(&["#..", "..#"]).unwrap();
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert!(grid.get(0, 0));
        assert!(grid.get(2, 1));
        assert!(!grid.get(2, 0));
        assert_eq!(grid.count_foreground(), 2);
        assert_eq!(grid.inverted().count_foreground(), 4);
    }

    #[test]
    fn luma_threshold_marks_dark_pixels() {
        let img = GrayImage::from_fn(4, 1, |x, _| Luma([if x < 2 { 10 } else { 240 }]));
        let grid = PixelGrid::from_luma(&img, &LoadOptions::default()).unwrap();
        assert!(grid.get(0, 0) && grid.get(1, 0));
        assert!(!grid.get(2, 0) && !grid.get(3, 0));

        let inverted = LoadOptions { invert: true, ..LoadOptions::default() };
        let grid = PixelGrid::from_luma(&img, &inverted).unwrap();
        assert!(!grid.get(0, 0) && grid.get(3, 0));

        let otsu = LoadOptions { threshold: ThresholdMethod::Otsu, invert: false };
        let grid = PixelGrid::from_luma(&img, &otsu).unwrap();
        assert_eq!(grid.count_foreground(), 2);
    }
}
