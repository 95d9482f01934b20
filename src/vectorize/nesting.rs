//! Containment forest: which contour immediately encloses which.
//!
//! Each contour is probed at the center of its first pixel, which lies
//! strictly inside it. Contours from one decomposition never cross, so the
//! probe is inside another contour exactly when the whole contour is.

use super::decompose::Contour;
use crate::outline::Sign;

/// Axis-aligned bounds in doubled coordinates.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl Bounds {
    fn of(contour: &Contour) -> Self {
        let mut b = Bounds {
            min_x: i64::MAX,
            min_y: i64::MAX,
            max_x: i64::MIN,
            max_y: i64::MIN,
        };
        for &(x, y) in &contour.points {
            b.min_x = b.min_x.min(2 * x as i64);
            b.min_y = b.min_y.min(2 * y as i64);
            b.max_x = b.max_x.max(2 * x as i64);
            b.max_y = b.max_y.max(2 * y as i64);
        }
        b
    }

    fn contains(&self, (px, py): (i64, i64)) -> bool {
        px > self.min_x && px < self.max_x && py > self.min_y && py < self.max_y
    }
}

/// Fill in `parent` and `sign` for every contour.
///
/// The parent is the smallest enclosing contour; the sign follows the
/// nesting depth (even = outer, odd = hole).
pub fn organize(contours: &mut [Contour]) {
    let bounds: Vec<Bounds> = contours.iter().map(Bounds::of).collect();
    let links: Vec<(Option<usize>, usize)> = (0..contours.len())
        .map(|i| {
            let probe = contours[i].probe2();
            let mut parent: Option<usize> = None;
            let mut depth = 0usize;
            for (j, other) in contours.iter().enumerate() {
                if j == i || !bounds[j].contains(probe) || !encloses(other, probe) {
                    continue;
                }
                depth += 1;
                if parent.map_or(true, |p| other.area < contours[p].area) {
                    parent = Some(j);
                }
            }
            (parent, depth)
        })
        .collect();

    let mut holes = 0usize;
    for (contour, (parent, depth)) in contours.iter_mut().zip(links) {
        let sign = Sign::from_depth(depth);
        if sign != contour.sign {
            tracing::warn!(depth, "nesting depth disagrees with traced sign");
        }
        if sign == Sign::Negative {
            holes += 1;
        }
        contour.parent = parent;
        contour.sign = sign;
    }
    tracing::debug!(contours = contours.len(), holes, "organized containment");
}

/// Even-odd ray test of a doubled probe against the contour's vertical edges.
fn encloses(contour: &Contour, (px, py): (i64, i64)) -> bool {
    let n = contour.points.len();
    let mut inside = false;
    for i in 0..n {
        let (ax, ay) = contour.points[i];
        let (bx, by) = contour.points[(i + 1) % n];
        if ax != bx {
            continue;
        }
        let x = 2 * ax as i64;
        let (lo, hi) = (2 * ay.min(by) as i64, 2 * ay.max(by) as i64);
        if x > px && py > lo && py < hi {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::super::decompose::decompose;
    use super::*;
    use crate::bitmap::PixelGrid;
    use crate::config::TurnPolicy;

    fn organized(rows: &[&str]) -> Vec<Contour> {
        let grid = PixelGrid::from_ascii(rows).unwrap();
        let mut contours = decompose(&grid, TurnPolicy::Majority, 0);
        organize(&mut contours);
        contours
    }

    #[test]
    fn ring_hole_points_at_outer() {
        let contours = organized(&[
            "######",
            "#....#",
            "#....#",
            "#....#",
            "######",
        ]);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].parent, None);
        assert_eq!(contours[0].sign, Sign::Positive);
        assert_eq!(contours[1].parent, Some(0));
        assert_eq!(contours[1].sign, Sign::Negative);
    }

    #[test]
    fn island_in_hole_is_outer_again() {
        let contours = organized(&[
            "#########",
            "#.......#",
            "#.......#",
            "#..###..#",
            "#..###..#",
            "#..###..#",
            "#.......#",
            "#.......#",
            "#########",
        ]);
        assert_eq!(contours.len(), 3);
        let island = contours
            .iter()
            .position(|c| c.area == 9)
            .expect("island contour");
        let hole = contours
            .iter()
            .position(|c| c.sign == Sign::Negative)
            .expect("hole contour");
        assert_eq!(contours[island].parent, Some(hole));
        assert_eq!(contours[island].sign, Sign::Positive);
        assert_eq!(contours[hole].parent, Some(0));
    }

    #[test]
    fn siblings_share_no_parent() {
        let contours = organized(&["##..##", "##..##"]);
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| c.parent.is_none()));
        assert!(contours.iter().all(|c| c.sign == Sign::Positive));
    }
}
