//! Pixel-edge contour extraction on the dual grid.
//!
//! Contours are traced on the pixel-corner grid (between pixels) rather
//! than through pixel centers, so every step is one unit along x or y.
//! A working copy of the bitmap is XOR-filled after each trace; that copy
//! is the scan-wide "consumed" marker and guarantees no boundary is
//! walked twice.

use crate::bitmap::PixelGrid;
use crate::config::TurnPolicy;
use crate::outline::Sign;

/// A closed boundary on the pixel-corner grid.
#[derive(Debug, Clone)]
pub struct Contour {
    /// Corner points; consecutive points (cyclically) differ by one unit step.
    /// Foreground of the working bitmap lies to the left of travel.
    pub points: Vec<(i32, i32)>,
    /// Enclosed area in pixels (always positive).
    pub area: i64,
    /// Outer boundary or hole.
    pub sign: Sign,
    /// Index of the immediately enclosing contour. Filled in by `nesting`.
    pub parent: Option<usize>,
}

impl Contour {
    /// A point strictly inside the contour: the center of its first pixel.
    ///
    /// Returned doubled, so the half-pixel offset stays integral.
    pub fn probe2(&self) -> (i64, i64) {
        let (x, y) = self.points[0];
        (2 * x as i64 + 1, 2 * y as i64 + 1)
    }
}

/// Mutable working copy of the grid, owned by one decomposition run.
struct Bitmap {
    data: Vec<bool>,
    width: i32,
    height: i32,
}

/// Row-major offset of in-range cell (x, y). Widened before multiplying:
/// a grid may hold more than `i32::MAX` cells.
fn cell_index(width: i32, x: i32, y: i32) -> usize {
    y as usize * width as usize + x as usize
}

impl Bitmap {
    fn from_grid(grid: &PixelGrid) -> Self {
        Bitmap {
            data: grid.cells().to_vec(),
            width: grid.width() as i32,
            height: grid.height() as i32,
        }
    }

    /// Get pixel at (x, y). Out-of-bounds = false.
    fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return false;
        }
        self.data[cell_index(self.width, x, y)]
    }

    /// XOR all pixels in row y from column x to the right edge.
    fn xor_row_from(&mut self, x: i32, y: i32) {
        if y < 0 || y >= self.height {
            return;
        }
        let start = cell_index(self.width, x.max(0), y);
        let end = cell_index(self.width, self.width, y);
        for cell in &mut self.data[start..end] {
            *cell ^= true;
        }
    }

    /// Whether foreground dominates the neighbourhood of corner (x, y).
    ///
    /// Checks square rings of growing radius (2 to 4) and returns on the
    /// first ring that is not a tie.
    fn majority(&self, x: i32, y: i32) -> bool {
        for i in 2..5 {
            let mut ct = 0i32;
            for a in (-i + 1)..i {
                ct += if self.get(x + a, y + i - 1) { 1 } else { -1 };
                ct += if self.get(x + i - 1, y + a - 1) { 1 } else { -1 };
                ct += if self.get(x + a - 1, y - i) { 1 } else { -1 };
                ct += if self.get(x - i, y + a) { 1 } else { -1 };
            }
            if ct > 0 {
                return true;
            } else if ct < 0 {
                return false;
            }
        }
        false
    }
}

impl TurnPolicy {
    /// Resolve an ambiguous crossing at corner (x, y): `true` = turn right.
    ///
    /// Turning right joins the two diagonal pixels that are set in the
    /// working bitmap. For holes those pixels are background in the source.
    fn turns_right(self, sign: Sign, bm: &Bitmap, x: i32, y: i32) -> bool {
        match self {
            TurnPolicy::Right => true,
            TurnPolicy::Left => false,
            TurnPolicy::Black => sign == Sign::Positive,
            TurnPolicy::White => sign == Sign::Negative,
            TurnPolicy::Majority => bm.majority(x, y),
            TurnPolicy::Minority => !bm.majority(x, y),
        }
    }
}

/// Extract every boundary of the grid as a closed contour.
///
/// Scans in row-major order; each set pixel of the working copy starts a
/// new trace, after which the traced interior is XOR-flipped. Contours
/// enclosing fewer than `speckle_size` pixels are dropped, but their
/// interior is still flipped so the scan never revisits them.
pub fn decompose(grid: &PixelGrid, policy: TurnPolicy, speckle_size: u32) -> Vec<Contour> {
    let mut bm = Bitmap::from_grid(grid);
    let mut contours = Vec::new();
    let mut speckles = 0usize;

    for y in 0..bm.height {
        for x in 0..bm.width {
            if !bm.get(x, y) {
                continue;
            }
            // Set in the source too → outer boundary; otherwise this is a
            // background pixel that an earlier XOR fill turned on: a hole.
            let sign = if grid.get(x, y) {
                Sign::Positive
            } else {
                Sign::Negative
            };
            let contour = find_path(&bm, x, y, sign, policy);
            xor_fill(&mut bm, &contour.points);
            if contour.area < speckle_size as i64 {
                speckles += 1;
            } else {
                contours.push(contour);
            }
        }
    }

    tracing::debug!(
        contours = contours.len(),
        speckles,
        "decomposed bitmap into contours"
    );
    contours
}

/// Trace one closed contour starting at the lower-left corner of pixel (x0, y0).
///
/// Every pixel scanned before (x0, y0) is clear, so the walk starts along the
/// pixel's bottom edge heading +x, with foreground on the left.
fn find_path(bm: &Bitmap, x0: i32, y0: i32, sign: Sign, policy: TurnPolicy) -> Contour {
    let mut points = Vec::new();
    let (mut x, mut y) = (x0, y0);
    let (mut dx, mut dy) = (1i32, 0i32);
    let mut area: i64 = 0;

    loop {
        points.push((x, y));
        x += dx;
        y += dy;
        area += x as i64 * dy as i64;

        if x == x0 && y == y0 {
            break;
        }

        // The two pixels sharing the edge ahead of (x, y):
        //
        //   dir (dx,dy)  │ c = ahead-right         d = ahead-left
        //   ─────────────┼──────────────────────────────────────────
        //   +x  (1, 0)   │ (x,   y-1)              (x,   y)
        //   +y  (0, 1)   │ (x,   y)                (x-1, y)
        //   -x  (-1,0)   │ (x-1, y)                (x-1, y-1)
        //   -y  (0,-1)   │ (x-1, y-1)              (x,   y-1)
        let c = bm.get(x + (dx + dy - 1) / 2, y + (dy - dx - 1) / 2);
        let d = bm.get(x + (dx - dy - 1) / 2, y + (dy + dx - 1) / 2);

        //   c  d  │ action
        //   ──────┼─────────────────────────────
        //   1  0  │ ambiguous: ask the turn policy
        //   1  1  │ turn right
        //   0  0  │ turn left
        //   0  1  │ straight
        if c && !d {
            if policy.turns_right(sign, bm, x, y) {
                (dx, dy) = (dy, -dx);
            } else {
                (dx, dy) = (-dy, dx);
            }
        } else if c {
            (dx, dy) = (dy, -dx);
        } else if !d {
            (dx, dy) = (-dy, dx);
        }
    }

    Contour {
        points,
        area,
        sign,
        parent: None,
    }
}

/// XOR-fill the interior of a path.
///
/// For each vertical step in the path, toggle all pixels from that column
/// to the right edge of the row. Pairs of toggles cancel outside the
/// contour, leaving only the interior flipped.
fn xor_fill(bm: &mut Bitmap, points: &[(i32, i32)]) {
    let n = points.len();
    if n == 0 {
        return;
    }

    let mut y_prev = points[n - 1].1;
    for &(x, y) in points {
        if y != y_prev {
            bm.xor_row_from(x, y.min(y_prev));
        }
        y_prev = y;
    }
}

/// Signed area of a corner path via the shoelace formula.
#[cfg(test)]
fn path_area(points: &[(i32, i32)]) -> i64 {
    let n = points.len();
    let mut area: i64 = 0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].0 as i64 * points[j].1 as i64 - points[j].0 as i64 * points[i].1 as i64;
    }
    area / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(rows: &[&str], policy: TurnPolicy, speckle: u32) -> Vec<Contour> {
        decompose(&PixelGrid::from_ascii(rows).unwrap(), policy, speckle)
    }

    fn assert_unit_steps(contour: &Contour) {
        let n = contour.points.len();
        for i in 0..n {
            let (ax, ay) = contour.points[i];
            let (bx, by) = contour.points[(i + 1) % n];
            assert_eq!((ax - bx).abs() + (ay - by).abs(), 1, "non-unit step at {}", i);
        }
    }

    #[test]
    fn single_block_is_one_ccw_contour() {
        let contours = trace(&["####", "####", "####", "####"], TurnPolicy::Majority, 2);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.sign, Sign::Positive);
        assert_eq!(c.area, 16);
        assert_eq!(c.points.len(), 16);
        assert_eq!(c.points[0], (0, 0));
        assert_eq!(path_area(&c.points), 16);
        assert_unit_steps(c);
    }

    #[test]
    fn ring_yields_outer_and_hole() {
        let rows = [
            "########",
            "########",
            "##....##",
            "##....##",
            "##....##",
            "##....##",
            "########",
            "########",
        ];
        let contours = trace(&rows, TurnPolicy::Majority, 2);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].sign, Sign::Positive);
        assert_eq!(contours[0].area, 64);
        assert_eq!(contours[1].sign, Sign::Negative);
        assert_eq!(contours[1].area, 16);
        assert_eq!(contours[1].points[0], (2, 2));
        for c in &contours {
            assert_unit_steps(c);
        }
    }

    #[test]
    fn speckles_are_dropped_by_area() {
        let rows = ["#.....", "......", "...###", "...###"];
        let kept = trace(&rows, TurnPolicy::Majority, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, 6);

        let all = trace(&rows, TurnPolicy::Majority, 0);
        assert_eq!(all.len(), 2);

        let none = trace(&rows, TurnPolicy::Majority, 7);
        assert!(none.is_empty());
    }

    #[test]
    fn diagonal_pixels_follow_turn_policy() {
        let rows = ["#.", ".#"];
        // Joined through the shared corner: one contour around both pixels.
        let black = trace(&rows, TurnPolicy::Black, 0);
        assert_eq!(black.len(), 1);
        assert_eq!(black[0].area, 2);
        assert_eq!(black[0].points.len(), 8);

        // Separated: two single-pixel contours.
        let white = trace(&rows, TurnPolicy::White, 0);
        assert_eq!(white.len(), 2);
        assert!(white.iter().all(|c| c.area == 1 && c.points.len() == 4));

        assert_eq!(trace(&rows, TurnPolicy::Right, 0).len(), 1);
        assert_eq!(trace(&rows, TurnPolicy::Left, 0).len(), 2);
    }

    #[test]
    fn cell_index_past_i32_range() {
        // 50 000 × 50 000 grid: row 42 950 starts beyond i32::MAX.
        assert_eq!(cell_index(50_000, 0, 42_950), 2_147_500_000);
        assert_eq!(cell_index(50_000, 49_999, 49_999), 2_499_999_999);
        assert_eq!(cell_index(6, 2, 3), 20);
    }

    #[test]
    fn xor_row_flips_to_the_right_edge() {
        let grid = PixelGrid::from_ascii(&["....", "#..."]).unwrap();
        let mut bm = Bitmap::from_grid(&grid);
        bm.xor_row_from(1, 1);
        assert_eq!(bm.data, vec![false, false, false, false, true, true, true, true]);
        bm.xor_row_from(-3, 0);
        assert!(bm.data[..4].iter().all(|&c| c));
    }

    #[test]
    fn majority_reads_local_neighbourhood() {
        let dense = PixelGrid::from_ascii(&["######", "######", "######", "######", "######", "######"]).unwrap();
        assert!(Bitmap::from_grid(&dense).majority(3, 3));
        let sparse = PixelGrid::from_ascii(&["......", "......", "......", "......", "......", "......"]).unwrap();
        assert!(!Bitmap::from_grid(&sparse).majority(3, 3));
    }
}
