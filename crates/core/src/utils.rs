//! Geometry helpers and number formatting.
//!
//! Provides:
//! - Geometric types (Point, Rect, Matrix)
//! - Matrix composition, inversion and application
//! - Rectangle set operations used by clip handling
//! - The compact number writer used when generating content streams

use itertools::Itertools;

/// Small epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle defined by (x0, y0, x1, y1) where (x0, y0) is bottom-left
/// and (x1, y1) is top-right once normalized.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// The empty rectangle at the origin.
pub const RECT_EMPTY: Rect = (0.0, 0.0, 0.0, 0.0);

/// Compares two floats for approximate equality.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Multiplies two matrices: result = m1 * m0.
/// A point transformed by the result goes through m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Translates a matrix by (x, y) inside the projection.
///
/// The matrix is changed so that its origin is at the specified point in its own
/// coordinate system.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a rectangle.
///
/// The result is the axis-aligned rectangle that tightly fits the
/// transformed corners.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    get_bound([
        apply_matrix_pt(m, (x0, y0)),
        apply_matrix_pt(m, (x1, y0)),
        apply_matrix_pt(m, (x1, y1)),
        apply_matrix_pt(m, (x0, y1)),
    ])
}

/// Applies matrix transformation to a vector (ignoring translation).
pub fn apply_matrix_norm(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, _e, _f) = m;
    let (p, q) = v;
    (a * p + c * q, b * p + d * q)
}

/// Whether `m` is exactly the identity matrix.
pub fn is_identity(m: Matrix) -> bool {
    m == MATRIX_IDENTITY
}

/// Whether `m` is the identity up to rounding noise.
pub fn is_near_identity(m: Matrix) -> bool {
    let (a, b, c, d, e, f) = m;
    approx_eq(a, 1.0, 1e-6)
        && approx_eq(b, 0.0, 1e-6)
        && approx_eq(c, 0.0, 1e-6)
        && approx_eq(d, 1.0, 1e-6)
        && approx_eq(e, 0.0, 1e-6)
        && approx_eq(f, 0.0, 1e-6)
}

/// Inverts an affine matrix. Singular matrices invert to the identity.
pub fn invert_matrix(m: Matrix) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det.abs() < f64::EPSILON * 16.0 {
        return MATRIX_IDENTITY;
    }
    let ia = d / det;
    let ib = -b / det;
    let ic = -c / det;
    let id = a / det;
    (ia, ib, ic, id, -(ia * e + ic * f), -(ib * e + id * f))
}

/// Builds a matrix from a six-number slice, falling back to identity.
pub fn matrix_from_slice(values: &[f64]) -> Matrix {
    match values {
        [a, b, c, d, e, f] => (*a, *b, *c, *d, *e, *f),
        _ => MATRIX_IDENTITY,
    }
}

/// Bounding rectangle of a point set.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Rect {
    let mut x0 = f64::INFINITY;
    let mut y0 = f64::INFINITY;
    let mut x1 = f64::NEG_INFINITY;
    let mut y1 = f64::NEG_INFINITY;
    for (x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    if x0 > x1 {
        return RECT_EMPTY;
    }
    (x0, y0, x1, y1)
}

/// Orders the corners of a rectangle so that x0 <= x1 and y0 <= y1.
pub fn normalize_rect(r: Rect) -> Rect {
    (r.0.min(r.2), r.1.min(r.3), r.0.max(r.2), r.1.max(r.3))
}

/// A rectangle with no area.
pub fn rect_is_empty(r: Rect) -> bool {
    r.0 >= r.2 || r.1 >= r.3
}

/// Whether `outer` fully contains `inner`. Both must be normalized.
pub fn rect_contains(outer: Rect, inner: Rect) -> bool {
    inner.0 >= outer.0 && inner.2 <= outer.2 && inner.1 >= outer.1 && inner.3 <= outer.3
}

/// Intersection of two normalized rectangles; empty when disjoint.
pub fn rect_intersect(a: Rect, b: Rect) -> Rect {
    let r = (a.0.max(b.0), a.1.max(b.1), a.2.min(b.2), a.3.min(b.3));
    if r.0 > r.2 || r.1 > r.3 {
        return RECT_EMPTY;
    }
    r
}

/// Smallest rectangle covering both inputs.
pub fn rect_union(a: Rect, b: Rect) -> Rect {
    (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
}

/// Formats a number the way content streams are written: at most six
/// decimals, no trailing zeros and no leading zero (`.5`, `-.25`).
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{value:.6}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" || s.is_empty() {
        return "0".to_string();
    }
    if let Some(rest) = s.strip_prefix("0.") {
        return format!(".{rest}");
    }
    if let Some(rest) = s.strip_prefix("-0.") {
        return format!("-.{rest}");
    }
    s
}

/// Writes the six matrix entries separated by spaces.
pub fn format_matrix(m: Matrix) -> String {
    let (a, b, c, d, e, f) = m;
    [a, b, c, d, e, f].into_iter().map(format_number).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_round_trips() {
        let m = (2.0, 0.0, 0.0, 4.0, 10.0, -6.0);
        let product = mult_matrix(m, invert_matrix(m));
        assert!(approx_eq(product.0, 1.0, EPSILON));
        assert!(approx_eq(product.3, 1.0, EPSILON));
        assert!(approx_eq(product.4, 0.0, EPSILON));
        assert!(approx_eq(product.5, 0.0, EPSILON));
    }

    #[test]
    fn singular_matrix_inverts_to_identity() {
        assert_eq!(invert_matrix((0.0, 0.0, 0.0, 0.0, 1.0, 1.0)), MATRIX_IDENTITY);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(0.5), ".5");
        assert_eq!(format_number(-0.5), "-.5");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0000001), "0");
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1e12), "1000000000000");
        assert_eq!(format_number(0.000001), ".000001");
        assert_eq!(format_number(3.25), "3.25");
    }
}
