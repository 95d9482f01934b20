//! Curve merging: replace runs of adjacent curve entries by one cubic.
//!
//! A run i..j (polygon vertices i+1..j) may be merged when it is
//! corner-free, turns consistently one way, never bends by 179° or more,
//! and the single cubic that preserves the run's area stays within
//! `opttolerance` of every polygon edge and edge-midpoint chord it
//! replaces. A dynamic program over end points picks the grouping with
//! the fewest entries, breaking ties by the smallest sum of squared
//! deviations.

use kurbo::{CubicBez, ParamCurve, Point};

use super::curve::{Curve, Tag};
use crate::geom::{cprod, dpara, fsign, interval, iprod, iprod1};

/// cos(179°): bends sharper than this end a mergeable run.
const COS179: f64 = -0.999_847_695_156_391_3;

/// A merge candidate: one cubic replacing entries i+1..=j.
#[derive(Debug, Clone, Copy)]
struct Merge {
    pen: f64,
    c: [Point; 2],
    alpha: f64,
    /// Position of the new joint vertex along the end midpoint → vertex j.
    s: f64,
}

/// Per-curve data shared by every candidate.
struct Scratch<'a> {
    curve: &'a Curve,
    /// +1/-1 turn direction of each curve entry, 0 for corners.
    convc: Vec<i32>,
    /// Cumulative area between the polygon origin and the curve up to entry i.
    areac: Vec<f64>,
}

impl<'a> Scratch<'a> {
    fn new(curve: &'a Curve) -> Self {
        let m = curve.len();
        let v = &curve.vertex;

        let convc = (0..m)
            .map(|i| match curve.tag[i] {
                Tag::Curve => fsign(dpara(v[(i + m - 1) % m], v[i], v[(i + 1) % m])),
                Tag::Corner => 0,
            })
            .collect();

        let mut areac = vec![0.0; m + 1];
        let mut area = 0.0;
        let p0 = v[0];
        for i in 0..m {
            let i1 = (i + 1) % m;
            if curve.tag[i1] == Tag::Curve {
                let alpha = curve.alpha[i1];
                area += 0.3 * alpha * (4.0 - alpha) * dpara(curve.c[i][2], v[i1], curve.c[i1][2]) / 2.0;
                area += dpara(p0, curve.c[i][2], curve.c[i1][2]) / 2.0;
            }
            areac[i + 1] = area;
        }

        Scratch { curve, convc, areac }
    }

    /// Try to merge entries i+1..=j into one cubic. `None` if not allowed.
    fn penalty(&self, i: usize, j: usize, opttolerance: f64) -> Option<Merge> {
        let curve = self.curve;
        let m = curve.len();
        let v = &curve.vertex;
        let mid = |k: usize| curve.c[k][2];

        if i == j {
            return None;
        }

        // Convexity, corner-freeness, and maximum bend.
        let i1 = (i + 1) % m;
        let conv = self.convc[i1];
        if conv == 0 {
            return None;
        }
        let d = v[i].distance(v[i1]);
        let mut k = i1;
        while k != j {
            let k1 = (k + 1) % m;
            let k2 = (k + 2) % m;
            if self.convc[k1] != conv {
                return None;
            }
            if fsign(cprod(v[i], v[i1], v[k1], v[k2])) != conv {
                return None;
            }
            if iprod1(v[i], v[i1], v[k1], v[k2]) < d * v[k1].distance(v[k2]) * COS179 {
                return None;
            }
            k = k1;
        }

        let p0 = mid(i % m);
        let p1 = v[i1];
        let p2 = v[j % m];
        let p3 = mid(j % m);

        let mut area = self.areac[j] - self.areac[i];
        area -= dpara(v[0], mid(i), mid(j)) / 2.0;
        if i >= j {
            area += self.areac[m];
        }

        // o = intersection of p0p1 and p2p3 = interval(t, p0, p1) = interval(s, p3, p2);
        // A = area of triangle (p0, o, p3).
        let a1 = dpara(p0, p1, p2);
        let a2 = dpara(p0, p1, p3);
        let a3 = dpara(p0, p2, p3);
        let a4 = a1 + a3 - a2;

        if a2 == a1 {
            return None;
        }

        let t = a3 / (a3 - a4);
        let s = a2 / (a2 - a1);
        let tri = a2 * t / 2.0;
        if tri == 0.0 {
            return None;
        }

        let r = area / tri;
        let alpha = 2.0 - (4.0 - r / 0.3).sqrt();
        if !alpha.is_finite() {
            return None;
        }

        let c0 = interval(t * alpha, p0, p1);
        let c1 = interval(s * alpha, p3, p2);
        let bez = CubicBez::new(p0, c0, c1, p3);
        let mut pen = 0.0;

        // Deviation from each polygon edge.
        let mut k = i1;
        while k != j {
            let k1 = (k + 1) % m;
            let tt = tangent(&bez, v[k], v[k1])?;
            let pt = bez.eval(tt);
            let d = v[k].distance(v[k1]);
            if d == 0.0 {
                return None;
            }
            let d1 = dpara(v[k], v[k1], pt) / d;
            if d1.abs() > opttolerance {
                return None;
            }
            if iprod(v[k], v[k1], pt) < 0.0 || iprod(v[k1], v[k], pt) < 0.0 {
                return None;
            }
            pen += d1 * d1;
            k = k1;
        }

        // Deviation from each midpoint chord, compared with where the
        // unmerged curve would have been.
        let mut k = i;
        while k != j {
            let k1 = (k + 1) % m;
            let tt = tangent(&bez, mid(k), mid(k1))?;
            let pt = bez.eval(tt);
            let d = mid(k).distance(mid(k1));
            if d == 0.0 {
                return None;
            }
            let mut d1 = dpara(mid(k), mid(k1), pt) / d;
            let mut d2 = dpara(mid(k), mid(k1), v[k1]) / d * 0.75 * curve.alpha[k1];
            if d2 < 0.0 {
                d1 = -d1;
                d2 = -d2;
            }
            if d1 < d2 - opttolerance {
                return None;
            }
            if d1 < d2 {
                pen += (d1 - d2) * (d1 - d2);
            }
            k = k1;
        }

        Some(Merge {
            pen,
            c: [c0, c1],
            alpha,
            s,
        })
    }
}

/// Parameter in [0, 1] where the cubic runs parallel to q0→q1.
fn tangent(bez: &CubicBez, q0: Point, q1: Point) -> Option<f64> {
    let a = cprod(bez.p0, bez.p1, q0, q1);
    let b = cprod(bez.p1, bez.p2, q0, q1);
    let c = cprod(bez.p2, bez.p3, q0, q1);

    let qa = a - 2.0 * b + c;
    let qb = -2.0 * a + 2.0 * b;
    let qc = a;
    let disc = qb * qb - 4.0 * qa * qc;

    if qa == 0.0 || disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let r1 = (-qb + sq) / (2.0 * qa);
    let r2 = (-qb - sq) / (2.0 * qa);
    if (0.0..=1.0).contains(&r1) {
        Some(r1)
    } else if (0.0..=1.0).contains(&r2) {
        Some(r2)
    } else {
        None
    }
}

/// Merge curve entries as far as `opttolerance` allows.
///
/// The search starts at entry 0; a run never wraps past it.
pub(super) fn optimize(curve: &Curve, opttolerance: f64) -> Curve {
    let m = curve.len();
    let scratch = Scratch::new(curve);

    // pt[j]: start of the last entry on the best path 0 → j.
    let mut pt = vec![0usize; m + 1];
    let mut pen = vec![0.0f64; m + 1];
    let mut len = vec![0usize; m + 1];
    let mut opt: Vec<Option<Merge>> = vec![None; m + 1];

    for j in 1..=m {
        pt[j] = j - 1;
        pen[j] = pen[j - 1];
        len[j] = len[j - 1] + 1;

        for i in (0..j.saturating_sub(1)).rev() {
            let Some(o) = scratch.penalty(i, j % m, opttolerance) else {
                break;
            };
            if len[j] > len[i] + 1 || (len[j] == len[i] + 1 && pen[j] > pen[i] + o.pen) {
                pt[j] = i;
                pen[j] = pen[i] + o.pen;
                len[j] = len[i] + 1;
                opt[j] = Some(o);
            }
        }
    }

    let om = len[m];
    let mut out = Curve {
        tag: vec![Tag::Corner; om],
        c: vec![[Point::ZERO; 3]; om],
        vertex: vec![Point::ZERO; om],
        alpha: vec![0.0; om],
    };

    let mut j = m;
    for i in (0..om).rev() {
        let jm = j % m;
        match opt[j] {
            Some(o) if pt[j] != j - 1 => {
                out.tag[i] = Tag::Curve;
                out.c[i] = [o.c[0], o.c[1], curve.c[jm][2]];
                out.vertex[i] = interval(o.s, curve.c[jm][2], curve.vertex[jm]);
                out.alpha[i] = o.alpha;
            }
            _ => {
                out.tag[i] = curve.tag[jm];
                out.c[i] = curve.c[jm];
                out.vertex[i] = curve.vertex[jm];
                out.alpha[i] = curve.alpha[jm];
            }
        }
        j = pt[j];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::super::curve::smooth;
    use super::*;
    use std::f64::consts::TAU;

    fn regular_polygon(m: usize, radius: f64) -> Vec<Point> {
        (0..m)
            .map(|i| {
                let a = TAU * i as f64 / m as f64;
                Point::new(radius * a.cos(), radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn smooth_circle_merges_into_fewer_curves() {
        let curve = smooth(regular_polygon(24, 20.0), 1.0);
        assert!(curve.tag.iter().all(|&t| t == Tag::Curve));
        let merged = optimize(&curve, 0.2);
        assert!(merged.len() < curve.len(), "{} !< {}", merged.len(), curve.len());
        assert!(merged.tag.iter().all(|&t| t == Tag::Curve));
    }

    #[test]
    fn merged_loop_stays_closed() {
        let curve = smooth(regular_polygon(24, 20.0), 1.0);
        let merged = optimize(&curve, 0.5);
        let segments = merged.segments();
        for (a, b) in segments.iter().zip(segments.iter().cycle().skip(1)) {
            assert_eq!(a.end(), b.start());
        }
    }

    #[test]
    fn corners_block_merging() {
        let curve = smooth(regular_polygon(24, 20.0), 0.0);
        let merged = optimize(&curve, 10.0);
        assert_eq!(merged.len(), curve.len());
        assert!(merged.tag.iter().all(|&t| t == Tag::Corner));
    }

    #[test]
    fn larger_tolerance_never_adds_entries() {
        let curve = smooth(regular_polygon(40, 30.0), 1.0);
        let tight = optimize(&curve, 0.05).len();
        let loose = optimize(&curve, 1.0).len();
        assert!(loose <= tight, "{} > {}", loose, tight);
    }

    #[test]
    fn tangent_parallel_to_chord() {
        let bez = CubicBez::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 2.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        );
        // Derivative crossed with +x is -3t² + 6t - 2.
        let t = tangent(&bez, Point::new(0.0, 0.0), Point::new(1.0, 0.0)).unwrap();
        assert!((t - (1.0 - 1.0 / 3f64.sqrt())).abs() < 1e-12, "t = {}", t);
    }

    #[test]
    fn symmetric_cubic_has_no_quadratic_tangent() {
        let bez = CubicBez::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        );
        assert!(tangent(&bez, Point::new(0.0, 0.0), Point::new(1.0, 0.0)).is_none());
    }
}
