//! Path geometry shared by path objects and clip paths.

use crate::utils::{
    Matrix, Point, RECT_EMPTY, Rect, apply_matrix_pt, approx_eq, get_bound, normalize_rect,
};

/// Kind of a path point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointType {
    Move,
    Line,
    /// One of three consecutive Bézier points.
    Bezier,
}

/// A point in a path, optionally closing its subpath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub point: Point,
    pub kind: PointType,
    pub close: bool,
}

impl PathPoint {
    pub const fn new(point: Point, kind: PointType, close: bool) -> Self {
        Self { point, kind, close }
    }

    /// An unclosed point of the given kind.
    pub fn is_open(&self, kind: PointType) -> bool {
        self.kind == kind && !self.close
    }
}

/// Fill rule of a painted or clipping path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillType {
    #[default]
    NoFill,
    EvenOdd,
    Winding,
}

/// A sequence of subpaths.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    points: Vec<PathPoint>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<PathPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).map(|p| p.point)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn append_point(&mut self, point: Point, kind: PointType) {
        self.points.push(PathPoint::new(point, kind, false));
    }

    pub fn append_point_and_close(&mut self, point: Point, kind: PointType) {
        self.points.push(PathPoint::new(point, kind, true));
    }

    /// A closed axis-aligned rectangle: a move and four lines.
    pub fn append_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        self.append_point((x0, y0), PointType::Move);
        self.append_point((x0, y1), PointType::Line);
        self.append_point((x1, y1), PointType::Line);
        self.append_point((x1, y0), PointType::Line);
        self.append_point_and_close((x0, y0), PointType::Line);
    }

    pub fn transform(&mut self, m: Matrix) {
        for p in &mut self.points {
            p.point = apply_matrix_pt(m, p.point);
        }
    }

    /// Bounding box of the control points.
    pub fn bounding_box(&self) -> Rect {
        if self.points.is_empty() {
            return RECT_EMPTY;
        }
        get_bound(self.points.iter().map(|p| p.point))
    }

    /// Bounding box widened by half the stroke width (or the miter
    /// extension when joins can spike).
    pub fn bounding_box_for_stroke(&self, line_width: f64, miter_limit: f64) -> Rect {
        let r = self.bounding_box();
        if self.points.is_empty() {
            return r;
        }
        let half = line_width.abs() / 2.0;
        let grow = if self.points.len() > 2 && miter_limit > 1.0 {
            half * miter_limit.min(2.0)
        } else {
            half
        };
        (r.0 - grow, r.1 - grow, r.2 + grow, r.3 + grow)
    }

    /// Whether the path is a single axis-aligned rectangle.
    pub fn is_rect(&self) -> bool {
        let pts = &self.points;
        let corners = match pts.len() {
            5 if pts[4].kind == PointType::Line
                && same_point(pts[0].point, pts[4].point) =>
            {
                &pts[..4]
            }
            4 if pts[3].close => &pts[..4],
            _ => return false,
        };
        if corners[0].kind != PointType::Move
            || corners[1..].iter().any(|p| p.kind != PointType::Line)
        {
            return false;
        }
        let p: Vec<Point> = corners.iter().map(|c| c.point).collect();
        if same_point(p[0], p[2]) || same_point(p[1], p[3]) {
            return false;
        }
        let vertical_first = approx_eq(p[0].0, p[1].0, f64::EPSILON)
            && approx_eq(p[1].1, p[2].1, f64::EPSILON)
            && approx_eq(p[2].0, p[3].0, f64::EPSILON)
            && approx_eq(p[3].1, p[0].1, f64::EPSILON);
        let horizontal_first = approx_eq(p[0].1, p[1].1, f64::EPSILON)
            && approx_eq(p[1].0, p[2].0, f64::EPSILON)
            && approx_eq(p[2].1, p[3].1, f64::EPSILON)
            && approx_eq(p[3].0, p[0].0, f64::EPSILON);
        vertical_first || horizontal_first
    }

    /// Rectangle spanned by points 0 and 2 of a rectangular path.
    pub fn rect(&self) -> Option<Rect> {
        if !self.is_rect() {
            return None;
        }
        let (p0, p2) = (self.points[0].point, self.points[2].point);
        Some(normalize_rect((p0.0, p0.1, p2.0, p2.1)))
    }
}

fn same_point(a: Point, b: Point) -> bool {
    approx_eq(a.0, b.0, f64::EPSILON) && approx_eq(a.1, b.1, f64::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_rect_is_rect() {
        let mut path = Path::new();
        path.append_rect(10.0, 20.0, 110.0, 70.0);
        assert_eq!(path.len(), 5);
        assert!(path.is_rect());
        assert_eq!(path.rect(), Some((10.0, 20.0, 110.0, 70.0)));
        assert_eq!(path.bounding_box(), (10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn triangle_is_not_rect() {
        let mut path = Path::new();
        path.append_point((0.0, 0.0), PointType::Move);
        path.append_point((10.0, 0.0), PointType::Line);
        path.append_point((5.0, 5.0), PointType::Line);
        path.append_point_and_close((0.0, 0.0), PointType::Line);
        assert!(!path.is_rect());
    }

    #[test]
    fn transform_moves_points() {
        let mut path = Path::new();
        path.append_point((1.0, 1.0), PointType::Move);
        path.append_point((2.0, 3.0), PointType::Line);
        path.transform((2.0, 0.0, 0.0, 2.0, 5.0, 5.0));
        assert_eq!(path.point(1), Some((9.0, 11.0)));
    }
}
