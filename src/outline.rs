//! Traced result: closed segment loops with their containment forest.
//!
//! Coordinates are in the grid frame: pixel (x, y) covers the unit square
//! `[x, x+1] × [y, y+1]`. Outer contours run counter-clockwise in that
//! frame (positive shoelace area) and holes clockwise, so the whole
//! outline fills correctly under the nonzero rule.

use kurbo::{BezPath, Point};

use crate::geom::signed_area;

/// Whether a contour bounds foreground (outer) or background (hole).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Sign of a contour nested `depth` levels deep: even = outer, odd = hole.
    pub fn from_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }

    pub fn value(self) -> i8 {
        match self {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }

    pub fn is_hole(self) -> bool {
        self == Sign::Negative
    }
}

/// One piece of a closed contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        start: Point,
        end: Point,
    },
    Cubic {
        start: Point,
        ctrl1: Point,
        ctrl2: Point,
        end: Point,
    },
}

impl Segment {
    pub fn start(&self) -> Point {
        match *self {
            Segment::Line { start, .. } | Segment::Cubic { start, .. } => start,
        }
    }

    pub fn end(&self) -> Point {
        match *self {
            Segment::Line { end, .. } | Segment::Cubic { end, .. } => end,
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, Segment::Cubic { .. })
    }
}

/// A closed loop of segments plus its place in the containment forest.
#[derive(Debug, Clone)]
pub struct TracedContour {
    /// Each segment ends where the next begins; the last ends at the first's start.
    pub segments: Vec<Segment>,
    pub sign: Sign,
    /// Index (into `Outline::contours`) of the immediately enclosing contour.
    pub parent: Option<usize>,
}

impl TracedContour {
    /// Convert to a closed kurbo path.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        self.append_to(&mut path);
        path
    }

    /// Signed shoelace area of the on-curve points: positive for outer
    /// contours, negative for holes.
    pub fn area(&self) -> f64 {
        signed_area(&self.to_bezpath())
    }

    fn append_to(&self, path: &mut BezPath) {
        let Some(first) = self.segments.first() else {
            return;
        };
        path.move_to(first.start());
        for seg in &self.segments {
            match *seg {
                Segment::Line { end, .. } => path.line_to(end),
                Segment::Cubic {
                    ctrl1, ctrl2, end, ..
                } => path.curve_to(ctrl1, ctrl2, end),
            }
        }
        path.close_path();
    }
}

/// All traced contours of one grid.
///
/// Every parent index refers to an earlier contour, so iterating in order
/// visits parents before their children.
#[derive(Debug, Clone)]
pub struct Outline {
    width: u32,
    height: u32,
    contours: Vec<TracedContour>,
}

impl Outline {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contours(&self) -> &[TracedContour] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Indices of contours with no parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.contours
            .iter()
            .enumerate()
            .filter(|(_, c)| c.parent.is_none())
            .map(|(i, _)| i)
    }

    /// Indices of the contours immediately inside contour `i`.
    pub fn children(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.contours
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.parent == Some(i))
            .map(|(j, _)| j)
    }

    /// Number of ancestors of contour `i`.
    pub fn depth(&self, i: usize) -> usize {
        let mut depth = 0;
        let mut cur = self.contours[i].parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.contours[p].parent;
        }
        depth
    }

    pub fn segment_count(&self) -> usize {
        self.contours.iter().map(|c| c.segments.len()).sum()
    }

    pub fn curve_count(&self) -> usize {
        self.contours
            .iter()
            .flat_map(|c| &c.segments)
            .filter(|s| s.is_curve())
            .count()
    }

    /// All contours as one path, for nonzero filling.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for contour in &self.contours {
            contour.append_to(&mut path);
        }
        path
    }

    /// Contour `root` and all of its descendants as one path.
    pub(crate) fn group_bezpath(&self, root: usize) -> BezPath {
        let mut path = BezPath::new();
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            self.contours[i].append_to(&mut path);
            stack.extend(self.children(i));
        }
        path
    }
}

/// Build an outline from traced contours, some of which may have been
/// dropped (`None`) as degenerate.
///
/// Parents of survivors are redirected to their nearest surviving
/// ancestor and indices are compacted.
pub(crate) fn assemble(
    width: u32,
    height: u32,
    traced: Vec<(Option<Vec<Segment>>, Sign, Option<usize>)>,
) -> Outline {
    let parents: Vec<Option<usize>> = traced.iter().map(|t| t.2).collect();
    let mut remap: Vec<Option<usize>> = vec![None; traced.len()];
    let mut next = 0;
    for (i, t) in traced.iter().enumerate() {
        if t.0.is_some() {
            remap[i] = Some(next);
            next += 1;
        }
    }

    let surviving_ancestor = |mut p: Option<usize>| -> Option<usize> {
        while let Some(i) = p {
            if let Some(j) = remap[i] {
                return Some(j);
            }
            p = parents[i];
        }
        None
    };

    let contours = traced
        .into_iter()
        .filter_map(|(segments, sign, parent)| {
            segments.map(|segments| TracedContour {
                segments,
                sign,
                parent: surviving_ancestor(parent),
            })
        })
        .collect();

    Outline {
        width,
        height,
        contours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, side: f64, ccw: bool) -> Vec<Segment> {
        let mut pts = vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ];
        if !ccw {
            pts.reverse();
        }
        (0..4)
            .map(|i| Segment::Line {
                start: pts[i],
                end: pts[(i + 1) % 4],
            })
            .collect()
    }

    #[test]
    fn sign_alternates_with_depth() {
        assert_eq!(Sign::from_depth(0), Sign::Positive);
        assert_eq!(Sign::from_depth(1), Sign::Negative);
        assert_eq!(Sign::from_depth(2), Sign::Positive);
        assert_eq!(Sign::Negative.value(), -1);
        assert!(Sign::Negative.is_hole());
        assert!(!Sign::Positive.is_hole());
    }

    #[test]
    fn segment_accessors() {
        let cubic = Segment::Cubic {
            start: Point::new(0.0, 0.0),
            ctrl1: Point::new(1.0, 0.0),
            ctrl2: Point::new(2.0, 1.0),
            end: Point::new(2.0, 2.0),
        };
        assert!(cubic.is_curve());
        assert_eq!(cubic.start(), Point::new(0.0, 0.0));
        assert_eq!(cubic.end(), Point::new(2.0, 2.0));
    }

    #[test]
    fn bezpath_area_carries_sign() {
        let outer = TracedContour {
            segments: square(0.0, 0.0, 4.0, true),
            sign: Sign::Positive,
            parent: None,
        };
        let hole = TracedContour {
            segments: square(1.0, 1.0, 2.0, false),
            sign: Sign::Negative,
            parent: Some(0),
        };
        assert!((outer.area() - 16.0).abs() < 1e-12);
        assert!((hole.area() + 4.0).abs() < 1e-12);
    }

    #[test]
    fn assemble_reparents_past_dropped_contours() {
        // 0 ⊃ 1 ⊃ 2, with 1 dropped.
        let outline = assemble(
            8,
            8,
            vec![
                (Some(square(0.0, 0.0, 8.0, true)), Sign::Positive, None),
                (None, Sign::Negative, Some(0)),
                (Some(square(3.0, 3.0, 2.0, true)), Sign::Positive, Some(1)),
                (Some(square(1.0, 1.0, 1.0, false)), Sign::Negative, Some(0)),
            ],
        );
        assert_eq!(outline.contours().len(), 3);
        assert_eq!(outline.contours()[1].parent, Some(0));
        assert_eq!(outline.contours()[2].parent, Some(0));
        assert_eq!(outline.roots().collect::<Vec<_>>(), vec![0]);
        assert_eq!(outline.children(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(outline.depth(1), 1);
        assert_eq!(outline.segment_count(), 12);
        assert_eq!(outline.curve_count(), 0);
        assert_eq!(outline.group_bezpath(0).elements().len(), 18);
    }
}
