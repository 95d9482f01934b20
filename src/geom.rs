//! Shared geometry utilities.

use kurbo::{BezPath, PathEl, Point};

/// Signed area of a BezPath via the shoelace formula (on-curve points only).
///
/// Positive = counter-clockwise in a y-up frame.
pub fn signed_area(path: &BezPath) -> f64 {
    let mut area = 0.0;
    let mut first = Point::ZERO;
    let mut current = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                first = p;
                current = p;
            }
            PathEl::LineTo(p) | PathEl::CurveTo(_, _, p) | PathEl::QuadTo(_, p) => {
                area += current.x * p.y - p.x * current.y;
                current = p;
            }
            PathEl::ClosePath => {
                area += current.x * first.y - first.x * current.y;
            }
        }
    }
    area / 2.0
}

/// Twice the signed area of triangle (p0, p1, p2): (p1-p0) × (p2-p0).
pub fn dpara(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1 - p0).cross(p2 - p0)
}

/// Cross product of the vectors p0→p1 and p2→p3.
pub fn cprod(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1 - p0).cross(p3 - p2)
}

/// Dot product of p0→p1 and p0→p2.
pub fn iprod(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1 - p0).dot(p2 - p0)
}

/// Dot product of the vectors p0→p1 and p2→p3.
pub fn iprod1(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1 - p0).dot(p3 - p2)
}

/// Point at fraction `t` of the way from `a` to `b`.
pub fn interval(t: f64, a: Point, b: Point) -> Point {
    a.lerp(b, t)
}

/// Sign function for f64: -1, 0, or 1.
pub fn fsign(x: f64) -> i32 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area_follows_orientation() {
        let mut ccw = BezPath::new();
        ccw.move_to((0.0, 0.0));
        ccw.line_to((1.0, 0.0));
        ccw.line_to((1.0, 1.0));
        ccw.line_to((0.0, 1.0));
        ccw.close_path();
        assert!((signed_area(&ccw) - 1.0).abs() < 1e-12);

        let mut cw = BezPath::new();
        cw.move_to((0.0, 0.0));
        cw.line_to((0.0, 1.0));
        cw.line_to((1.0, 1.0));
        cw.line_to((1.0, 0.0));
        cw.close_path();
        assert!((signed_area(&cw) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn products() {
        let o = Point::ZERO;
        assert_eq!(dpara(o, Point::new(2.0, 0.0), Point::new(0.0, 3.0)), 6.0);
        assert_eq!(iprod(o, Point::new(2.0, 0.0), Point::new(5.0, 3.0)), 10.0);
        assert_eq!(interval(0.25, o, Point::new(4.0, 8.0)), Point::new(1.0, 2.0));
        assert_eq!(fsign(-0.5), -1);
        assert_eq!(fsign(0.0), 0);
    }
}
