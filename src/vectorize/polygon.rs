//! Optimal polygon approximation via dynamic programming.
//!
//! Given a closed pixel-edge contour, finds the polygon with the fewest
//! vertices whose edges stay within half a pixel of the contour points
//! they replace. A 200-point circle typically reduces to ~20 vertices.
//!
//! ## Algorithm
//!
//! 1. **Prefix sums** (`PathSums`): O(1) line-fit statistics for any
//!    cyclic sub-range of the path.
//! 2. **Longest straight subpath** (`calc_lon`): for each point, the
//!    farthest point reachable by a chord that keeps every point in
//!    between within ±0.5 of the chord and never sees all four step
//!    directions (which would mean the path bulges both ways).
//! 3. **DP optimal polygon** (`best_polygon`): among all admissible
//!    polygons with the minimum number of edges, pick the one with the
//!    smallest total line-fit penalty.

use super::decompose::Contour;

/// Minimal polygon over a contour: indices into `Contour::points`.
///
/// Indices start at 0 and are strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    pub indices: Vec<usize>,
}

impl Polygon {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Prefix sum accumulator for O(1) line-fit statistics.
#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    x: f64,
    y: f64,
    x2: f64,
    xy: f64,
    y2: f64,
}

/// Line-fit statistics of a contour sub-range, relative to the origin point.
#[derive(Debug, Clone, Copy)]
pub(super) struct Window {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub xy: f64,
    pub y2: f64,
    /// Number of points in the range.
    pub k: f64,
}

/// Prefix sums of point coordinates, taken relative to the first point.
///
/// For any sub-range [i..=j] the sums of x, y, x², xy, y² are
/// `sums[j+1] - sums[i]`, plus whole-loop totals for each wrap-around.
pub(super) struct PathSums {
    sums: Vec<Sums>,
    origin: (i32, i32),
}

impl PathSums {
    pub fn new(pt: &[(i32, i32)]) -> Self {
        let (x0, y0) = pt[0];
        let mut sums = vec![Sums::default(); pt.len() + 1];
        for (i, &(px, py)) in pt.iter().enumerate() {
            let x = (px - x0) as f64;
            let y = (py - y0) as f64;
            sums[i + 1] = Sums {
                x: sums[i].x + x,
                y: sums[i].y + y,
                x2: sums[i].x2 + x * x,
                xy: sums[i].xy + x * y,
                y2: sums[i].y2 + y * y,
            };
        }
        PathSums {
            sums,
            origin: (x0, y0),
        }
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Statistics over the cyclic range [i..=j]. Either bound may lie
    /// outside 0..n; each wrap adds or removes one full loop.
    pub fn window(&self, i: isize, j: isize) -> Window {
        let n = (self.sums.len() - 1) as isize;
        let (mut i, mut j, mut r) = (i, j, 0isize);
        while j >= n {
            j -= n;
            r += 1;
        }
        while i >= n {
            i -= n;
            r -= 1;
        }
        while j < 0 {
            j += n;
            r -= 1;
        }
        while i < 0 {
            i += n;
            r += 1;
        }
        let (a, b, t) = (
            &self.sums[i as usize],
            &self.sums[j as usize + 1],
            &self.sums[n as usize],
        );
        let rf = r as f64;
        Window {
            x: b.x - a.x + rf * t.x,
            y: b.y - a.y + rf * t.y,
            x2: b.x2 - a.x2 + rf * t.x2,
            xy: b.xy - a.xy + rf * t.xy,
            y2: b.y2 - a.y2 + rf * t.y2,
            k: (j + 1 - i + r * n) as f64,
        }
    }
}

/// Compute the minimal polygon for a contour.
pub(super) fn reduce(contour: &Contour, sums: &PathSums) -> Polygon {
    let pt = &contour.points;
    let lon = calc_lon(pt);
    Polygon {
        indices: best_polygon(pt, &lon, sums),
    }
}

// ── Longest straight subpath ─────────────────────────────

/// For each point i, the first point that can no longer be reached by a
/// straight chord from i.
///
/// ## Algorithm: constraint propagation
///
/// Starting from `i`, walk forward corner by corner, maintaining two
/// constraint vectors that bound an angular corridor of chord directions
/// keeping every visited point within ±0.5 of the chord.
///
/// 1. **Four-direction test**: once the path has stepped in all four
///    cardinal directions, no chord can follow it.
/// 2. **Constraint violation**: the current point falls outside the
///    corridor (cross products against both constraint vectors).
/// 3. **Constraint tightening**: every point farther than one unit from
///    `i` narrows the corridor by half a pixel on each side.
///
/// The step direction (dx, dy) maps to a counter slot via
/// `(3 + 3*dx + dy) / 2`: West 0, South 1, North 2, East 3.
fn calc_lon(pt: &[(i32, i32)]) -> Vec<usize> {
    let n = pt.len();

    // nc[i]: next corner (direction change) after i, cyclically.
    let mut nc = vec![0usize; n];
    let mut k = 0usize;
    for i in (0..n).rev() {
        if pt[i].0 != pt[k].0 && pt[i].1 != pt[k].1 {
            k = i + 1;
        }
        nc[i] = k;
    }

    let mut pivk = vec![0usize; n];

    for i in (0..n).rev() {
        let mut ct = [0i32; 4];
        let mut constraint = [(0i32, 0i32); 2];

        let i1 = (i + 1) % n;
        ct[dir_slot(pt[i1].0 - pt[i].0, pt[i1].1 - pt[i].1)] += 1;

        let mut k = nc[i];
        let mut k1 = i;
        let mut violated = true;

        loop {
            ct[dir_slot(sign(pt[k].0 - pt[k1].0), sign(pt[k].1 - pt[k1].1))] += 1;

            if ct.iter().all(|&c| c != 0) {
                pivk[i] = k1;
                violated = false;
                break;
            }

            let cur = (pt[k].0 - pt[i].0, pt[k].1 - pt[i].1);

            if xprod(constraint[0], cur) < 0 || xprod(constraint[1], cur) > 0 {
                break;
            }

            // Points within one unit of i impose no constraint.
            if cur.0.abs() > 1 || cur.1.abs() > 1 {
                let off = (
                    cur.0 + if cur.1 >= 0 && (cur.1 > 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 <= 0 && (cur.0 < 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[0], off) >= 0 {
                    constraint[0] = off;
                }
                let off = (
                    cur.0 + if cur.1 <= 0 && (cur.1 < 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 >= 0 && (cur.0 > 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[1], off) <= 0 {
                    constraint[1] = off;
                }
            }

            k1 = k;
            k = nc[k1];
            if !cyclic(k, i, k1) {
                break;
            }
        }

        if violated {
            pivk[i] = pivot_at_violation(pt, &constraint, k, k1, i);
        }
    }

    // lon[i]: the largest k such that every i' in [i, k) also reaches k.
    let mut lon = vec![0usize; n];
    let mut j = pivk[n - 1];
    lon[n - 1] = j;
    for i in (0..n - 1).rev() {
        if cyclic(i + 1, pivk[i], j) {
            j = pivk[i];
        }
        lon[i] = j;
    }

    let mut i = n - 1;
    while cyclic((i + 1) % n, j, lon[i]) {
        lon[i] = j;
        if i == 0 {
            break;
        }
        i -= 1;
    }

    lon
}

/// Last point on the corner run k1..k that still satisfies the corridor.
///
/// The cross products `a = cross(c0, k1 - i)` and `b = cross(c0, step)`
/// give the signed distance to constraint 0 at k1 and its rate of change
/// per step; the run leaves the corridor after `floor(a / -b)` steps (or
/// `floor(-c / d)` for constraint 1), whichever comes first.
fn pivot_at_violation(
    pt: &[(i32, i32)],
    constraint: &[(i32, i32); 2],
    k: usize,
    k1: usize,
    i: usize,
) -> usize {
    let n = pt.len() as i64;
    let dk = (sign(pt[k].0 - pt[k1].0), sign(pt[k].1 - pt[k1].1));
    let cur = (pt[k1].0 - pt[i].0, pt[k1].1 - pt[i].1);
    let a = xprod(constraint[0], cur);
    let b = xprod(constraint[0], dk);
    let c = xprod(constraint[1], cur);
    let d = xprod(constraint[1], dk);

    let mut j = 10_000_000i64;
    if b < 0 {
        j = floordiv(a, -b);
    }
    if d > 0 {
        j = j.min(floordiv(-c, d));
    }
    (k1 as i64 + j).rem_euclid(n) as usize
}

// ── Dynamic programming optimal polygon ──────────────────

/// Find the optimal polygon: fewest edges first, then least penalty.
///
/// Returns polygon vertex indices into the contour, starting at 0.
fn best_polygon(pt: &[(i32, i32)], lon: &[usize], sums: &PathSums) -> Vec<usize> {
    let n = pt.len();

    // clip0[i]: farthest index an edge starting at i may reach.
    let mut clip0 = vec![0usize; n];
    for i in 0..n {
        let prev = lon[(i + n - 1) % n];
        let mut c = (prev + n - 1) % n;
        if c == i {
            c = (i + 1) % n;
        }
        clip0[i] = if c < i { n } else { c };
    }

    // clip1[j]: smallest index from which an edge may reach j.
    let mut clip1 = vec![0usize; n + 1];
    let mut j = 1usize;
    for (i, &c0) in clip0.iter().enumerate() {
        while j <= c0 {
            clip1[j] = i;
            j += 1;
        }
    }

    // seg0[j]: greedy forward walk, the largest index reachable in j edges.
    let mut seg0 = vec![0usize; n + 1];
    let mut i = 0usize;
    let mut m = 0usize;
    while i < n {
        seg0[m] = i;
        i = clip0[i];
        m += 1;
    }
    seg0[m] = n;

    // seg1[j]: greedy backward walk, the smallest index reachable in j edges.
    let mut seg1 = vec![0usize; m + 1];
    let mut i = n;
    for j in (1..=m).rev() {
        seg1[j] = i;
        i = clip1[i];
    }
    seg1[0] = 0;

    // pen[i]: least penalty of an m-minimal path 0 → i; prev[i]: its predecessor.
    let mut pen = vec![-1.0f64; n + 1];
    let mut prev = vec![0usize; n + 1];
    pen[0] = 0.0;

    for j in 1..=m {
        for i in seg1[j]..=seg0[j] {
            let mut best = -1.0f64;
            if clip1[i] <= seg0[j - 1] {
                for k in (clip1[i]..=seg0[j - 1]).rev() {
                    let thispen = penalty3(pt, sums, k, i) + pen[k];
                    if best < 0.0 || thispen < best {
                        prev[i] = k;
                        best = thispen;
                    }
                }
            }
            pen[i] = best;
        }
    }

    let mut po = vec![0usize; m];
    let mut i = n;
    for j in (0..m).rev() {
        i = prev[i];
        po[j] = i;
    }
    po
}

/// Penalty for replacing path range [i..=j] by the straight edge i→j.
///
/// RMS distance of the range's points from the line through the edge
/// midpoint, scaled by the edge length:
///
/// ```text
///   px, py  = midpoint of (pt[i], pt[j])
///   ex, ey  = edge normal: (-(j.y - i.y), j.x - i.x)
///   a       = E[x²] - 2·E[x]·px + px²
///   b       = E[xy] - E[x]·py - E[y]·px + px·py
///   c       = E[y²] - 2·E[y]·py + py²
///   penalty = sqrt(ex²·a + 2·ex·ey·b + ey²·c)
/// ```
///
/// `j` may equal n (the loop closing back on point 0).
fn penalty3(pt: &[(i32, i32)], sums: &PathSums, i: usize, j: usize) -> f64 {
    let n = pt.len();
    let w = sums.window(i as isize, j as isize);
    let jn = j % n;
    let (x0, y0) = sums.origin();

    let px = (pt[i].0 + pt[jn].0) as f64 / 2.0 - x0 as f64;
    let py = (pt[i].1 + pt[jn].1) as f64 / 2.0 - y0 as f64;
    let ey = (pt[jn].0 - pt[i].0) as f64;
    let ex = -(pt[jn].1 - pt[i].1) as f64;

    let a = (w.x2 - 2.0 * w.x * px) / w.k + px * px;
    let b = (w.xy - w.x * py - w.y * px) / w.k + px * py;
    let c = (w.y2 - 2.0 * w.y * py) / w.k + py * py;

    let s = ex * ex * a + 2.0 * ex * ey * b + ey * ey * c;
    s.max(0.0).sqrt()
}

// ── Helpers ──────────────────────────────────────────────

/// Counter slot for a unit step.
fn dir_slot(dx: i32, dy: i32) -> usize {
    ((3 + 3 * dx + dy) / 2) as usize
}

/// Integer cross product.
fn xprod(a: (i32, i32), b: (i32, i32)) -> i64 {
    a.0 as i64 * b.1 as i64 - a.1 as i64 * b.0 as i64
}

fn sign(x: i32) -> i32 {
    x.signum()
}

/// Floor division (rounds toward negative infinity); `b > 0`.
fn floordiv(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

/// Check if b is in the cyclic interval [a, c).
fn cyclic(a: usize, b: usize, c: usize) -> bool {
    if a <= c {
        a <= b && b < c
    } else {
        a <= b || b < c
    }
}
