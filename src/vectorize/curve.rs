//! Vertex refinement and corner/curve classification.
//!
//! Each polygon vertex is first moved to the sub-pixel point that best
//! fits its two adjacent edges. The vertex then becomes either a corner
//! (two straight segments meeting at it) or one cubic running from the
//! midpoint of its incoming edge to the midpoint of its outgoing edge,
//! tangent to both edges.

use kurbo::Point;

use super::decompose::Contour;
use super::polygon::{PathSums, Polygon};
use crate::geom::{dpara, fsign, interval};
use crate::outline::Segment;

/// Per-vertex classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Tag {
    Corner,
    Curve,
}

/// Closed curve over polygon vertices, one entry per vertex.
///
/// Entry i ends at `c[i][2]`, the midpoint of edge i→i+1, and starts at
/// `c[i-1][2]`. For curves `c[i][0]`, `c[i][1]` are the control points;
/// corners pass through `vertex[i]`.
#[derive(Debug, Clone)]
pub(super) struct Curve {
    pub tag: Vec<Tag>,
    pub c: Vec<[Point; 3]>,
    pub vertex: Vec<Point>,
    /// Clamped alpha of curve entries (unused for corners).
    pub alpha: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.tag.len()
    }

    /// Emit the closed segment loop.
    pub fn segments(&self) -> Vec<Segment> {
        let m = self.len();
        let mut out = Vec::with_capacity(m * 2);
        for i in 0..m {
            let start = self.c[(i + m - 1) % m][2];
            let [c0, c1, end] = self.c[i];
            match self.tag[i] {
                Tag::Corner => {
                    out.push(Segment::Line {
                        start,
                        end: self.vertex[i],
                    });
                    out.push(Segment::Line {
                        start: self.vertex[i],
                        end,
                    });
                }
                Tag::Curve => out.push(Segment::Cubic {
                    start,
                    ctrl1: c0,
                    ctrl2: c1,
                    end,
                }),
            }
        }
        out
    }
}

// ── Vertex adjustment ────────────────────────────────────

/// Refine each polygon vertex to the optimal sub-pixel position.
///
/// Each polygon edge gets a best-fit line through the contour points it
/// replaces, written as a 3×3 quadratic form Q with
///
/// ```text
///   dist²(x, y) = [x, y, 1] · Q · [x, y, 1]ᵀ
/// ```
///
/// A vertex minimizes the sum of the forms of its two edges. If the
/// minimum lies within ±0.5 of the lattice point it is used directly;
/// otherwise the minimum over the boundary of that unit square is taken.
/// Coordinates are computed relative to the contour's first point.
pub(super) fn adjust_vertices(contour: &Contour, polygon: &Polygon, sums: &PathSums) -> Vec<Point> {
    let pt = &contour.points;
    let n = pt.len();
    let po = &polygon.indices;
    let m = po.len();
    let (x0, y0) = sums.origin();

    let forms: Vec<Quadform> = (0..m)
        .map(|i| {
            let j = (po[(i + 1) % m] + n - po[i]) % n + po[i];
            let (ctr, dir) = point_slope(sums, po[i], j);
            Quadform::from_line(ctr, dir)
        })
        .collect();

    (0..m)
        .map(|i| {
            let s = Point::new((pt[po[i]].0 - x0) as f64, (pt[po[i]].1 - y0) as f64);
            let mut q = forms[(i + m - 1) % m].add(&forms[i]);
            let w = loop {
                if let Some(w) = q.minimum() {
                    break w;
                }
                // Parallel edges: pin the free direction with an orthogonal
                // axis through the lattice point.
                q = q.add(&q.orthogonal_through(s));
            };
            let w = if (w.x - s.x).abs() <= 0.5 && (w.y - s.y).abs() <= 0.5 {
                w
            } else {
                q.minimum_on_square(s)
            };
            Point::new(w.x + x0 as f64, w.y + y0 as f64)
        })
        .collect()
}

/// Best-fit line through contour range [a..=b] (b may exceed n).
///
/// Returns (centroid, unit direction), relative to the contour origin.
/// The direction is the eigenvector of the 2×2 covariance matrix for its
/// larger eigenvalue; zero when the range is a single point.
fn point_slope(sums: &PathSums, a: usize, b: usize) -> (Point, (f64, f64)) {
    let w = sums.window(a as isize, b as isize);
    let k = w.k;
    let ctr = Point::new(w.x / k, w.y / k);

    let mut a = (w.x2 - w.x * w.x / k) / k;
    let b = (w.xy - w.x * w.y / k) / k;
    let mut c = (w.y2 - w.y * w.y / k) / k;

    let lambda2 = (a + c + ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / 2.0;
    a -= lambda2;
    c -= lambda2;

    let dir = if a.abs() >= c.abs() {
        let l = (a * a + b * b).sqrt();
        if l != 0.0 { (-b / l, a / l) } else { (0.0, 0.0) }
    } else {
        let l = (c * c + b * b).sqrt();
        if l != 0.0 { (-c / l, b / l) } else { (0.0, 0.0) }
    };
    (ctr, dir)
}

/// Symmetric 3×3 form: squared distance to a line in homogeneous coordinates.
#[derive(Debug, Clone, Copy)]
struct Quadform([[f64; 3]; 3]);

impl Quadform {
    fn from_line(ctr: Point, dir: (f64, f64)) -> Self {
        let d = dir.0 * dir.0 + dir.1 * dir.1;
        if d == 0.0 {
            return Quadform([[0.0; 3]; 3]);
        }
        let v0 = dir.1;
        let v1 = -dir.0;
        Self::outer([v0, v1, -v1 * ctr.y - v0 * ctr.x], d)
    }

    fn outer(v: [f64; 3], d: f64) -> Self {
        let mut q = [[0.0f64; 3]; 3];
        for (l, row) in q.iter_mut().enumerate() {
            for (k, cell) in row.iter_mut().enumerate() {
                *cell = v[l] * v[k] / d;
            }
        }
        Quadform(q)
    }

    fn add(&self, other: &Quadform) -> Quadform {
        let mut q = self.0;
        for (row, orow) in q.iter_mut().zip(other.0.iter()) {
            for (cell, o) in row.iter_mut().zip(orow.iter()) {
                *cell += o;
            }
        }
        Quadform(q)
    }

    /// Unconstrained minimum, or `None` if the form is singular.
    fn minimum(&self) -> Option<Point> {
        let q = &self.0;
        let det = q[0][0] * q[1][1] - q[0][1] * q[1][0];
        if det == 0.0 {
            return None;
        }
        Some(Point::new(
            (-q[0][2] * q[1][1] + q[1][2] * q[0][1]) / det,
            (q[0][2] * q[1][0] - q[1][2] * q[0][0]) / det,
        ))
    }

    /// Form of an axis through `s`, orthogonal to the degenerate direction.
    fn orthogonal_through(&self, s: Point) -> Quadform {
        let q = &self.0;
        let (v0, v1) = if q[0][0] > q[1][1] {
            (-q[0][1], q[0][0])
        } else if q[1][1] != 0.0 {
            (-q[1][1], q[1][0])
        } else {
            (1.0, 0.0)
        };
        let d = v0 * v0 + v1 * v1;
        Self::outer([v0, v1, -v1 * s.y - v0 * s.x], d)
    }

    fn eval(&self, p: Point) -> f64 {
        let v = [p.x, p.y, 1.0];
        let mut sum = 0.0;
        for (l, row) in self.0.iter().enumerate() {
            for (k, cell) in row.iter().enumerate() {
                sum += v[l] * cell * v[k];
            }
        }
        sum
    }

    /// Minimum over the boundary of the unit square centered at `s`.
    fn minimum_on_square(&self, s: Point) -> Point {
        let q = &self.0;
        let mut best = s;
        let mut min = self.eval(s);
        let mut consider = |w: Point| {
            let cand = self.eval(w);
            if cand < min {
                min = cand;
                best = w;
            }
        };

        // Horizontal edges: y fixed, optimal x.
        if q[0][0] != 0.0 {
            for z in 0..2 {
                let y = s.y - 0.5 + z as f64;
                let x = -(q[0][1] * y + q[0][2]) / q[0][0];
                if (x - s.x).abs() <= 0.5 {
                    consider(Point::new(x, y));
                }
            }
        }
        // Vertical edges: x fixed, optimal y.
        if q[1][1] != 0.0 {
            for z in 0..2 {
                let x = s.x - 0.5 + z as f64;
                let y = -(q[1][0] * x + q[1][2]) / q[1][1];
                if (y - s.y).abs() <= 0.5 {
                    consider(Point::new(x, y));
                }
            }
        }
        for l in 0..2 {
            for k in 0..2 {
                consider(Point::new(s.x - 0.5 + l as f64, s.y - 0.5 + k as f64));
            }
        }
        best
    }
}

// ── Corner classification ────────────────────────────────

/// Classify each vertex and place control points.
///
/// Alpha measures how far vertex j sits from the chord of its neighbours,
/// relative to the L∞-snapped chord normal; 0 is flat, 4/3 is the
/// largest value. `alpha >= alphamax` makes a corner. Smooth vertices
/// clamp alpha to [0.55, 1] and put the control points at 0.5 + 0.5·alpha
/// of the way from each edge midpoint toward the vertex.
pub(super) fn smooth(vertex: Vec<Point>, alphamax: f64) -> Curve {
    let m = vertex.len();
    let mut curve = Curve {
        tag: vec![Tag::Corner; m],
        c: vec![[Point::ZERO; 3]; m],
        vertex,
        alpha: vec![0.0; m],
    };

    for i in 0..m {
        let j = (i + 1) % m;
        let k = (i + 2) % m;
        let (vi, vj, vk) = (curve.vertex[i], curve.vertex[j], curve.vertex[k]);
        let mid = interval(0.5, vk, vj);

        let alpha = compute_alpha(vi, vj, vk);
        if alpha >= alphamax {
            curve.tag[j] = Tag::Corner;
            curve.c[j] = [Point::ZERO, vj, mid];
        } else {
            let alpha = alpha.clamp(0.55, 1.0);
            curve.tag[j] = Tag::Curve;
            curve.c[j] = [
                interval(0.5 + 0.5 * alpha, vi, vj),
                interval(0.5 + 0.5 * alpha, vk, vj),
                mid,
            ];
            curve.alpha[j] = alpha;
        }
    }
    curve
}

/// Alpha (roundness) of vertex j with neighbours i and k.
///
/// Dividing by 0.75 rescales so that `alphamax = 1.0` corresponds to a
/// 3/4-pixel deviation threshold.
fn compute_alpha(vi: Point, vj: Point, vk: Point) -> f64 {
    let denom = ddenom(vi, vk);
    if denom == 0.0 {
        return 4.0 / 3.0;
    }
    let dd = (dpara(vi, vj, vk) / denom).abs();
    let alpha = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
    alpha / 0.75
}

/// Cross of the chord p0→p2 with its 90° rotation snapped to a diagonal
/// or axis direction.
fn ddenom(p0: Point, p2: Point) -> f64 {
    let ry = fsign(p2.x - p0.x) as f64;
    let rx = -(fsign(p2.y - p0.y) as f64);
    ry * (p2.x - p0.x) - rx * (p2.y - p0.y)
}
