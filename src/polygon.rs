//! Validated 2D polygons.
//!
//! [`Polygon2D`] enforces the loop invariants the meshing engine relies on:
//! counterclockwise orientation, at least 3 vertices, no zero-length edges,
//! no duplicate vertices, no self-intersection. The validating factory
//! auto-reverses clockwise input and rejects everything else with a
//! descriptive error, so the rest of the engine never re-checks loops.

use serde::{Deserialize, Serialize};

use crate::core::{Tolerance, Vec2};
use crate::error::MeshError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon2D {
    vertices: Vec<Vec2>,
}

impl Polygon2D {
    /// Validating factory. Clockwise input is reversed to counterclockwise
    /// before validation; invalid loops are rejected.
    pub fn new(vertices: Vec<Vec2>, tol: Tolerance) -> Result<Self, MeshError> {
        let mut vertices = vertices;
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }
        validate_loop(&vertices, tol)?;
        Ok(Self { vertices })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Signed area; positive for the canonical counterclockwise orientation.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let n = self.vertices.len();
        let mut sum = 0.0;
        for i in 0..n {
            sum += (self.vertices[(i + 1) % n] - self.vertices[i]).length();
        }
        sum
    }

    /// Axis-aligned bounding box as `(min, max)`.
    #[must_use]
    pub fn bounding_box(&self) -> (Vec2, Vec2) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        (min, max)
    }

    /// True when the polygon is exactly an axis-aligned rectangle: four
    /// vertices that are the four bounding-box corners, each edge
    /// axis-aligned within `eps`.
    #[must_use]
    pub fn is_axis_aligned_rectangle(&self, eps: f64) -> bool {
        if self.vertices.len() != 4 {
            return false;
        }
        let (min, max) = self.bounding_box();
        let corners = [
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
        ];
        for v in &self.vertices {
            if !corners
                .iter()
                .any(|c| (v.x - c.x).abs() <= eps && (v.y - c.y).abs() <= eps)
            {
                return false;
            }
        }
        for i in 0..4 {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % 4];
            if (a.x - b.x).abs() > eps && (a.y - b.y).abs() > eps {
                return false;
            }
        }
        true
    }

    /// Point containment via the ray-cast oracle; boundary points count as
    /// inside within `eps`.
    #[must_use]
    pub fn contains_point(&self, p: Vec2, eps: f64) -> bool {
        crate::proximity::point_in_polygon(&self.vertices, p, eps)
    }
}

/// Signed area of a closed loop: `½·Σ(x_j·y_i − x_i·y_j)` over cyclic edges.
#[must_use]
pub fn signed_area(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + n - 1) % n;
        sum += vertices[j].x * vertices[i].y - vertices[i].x * vertices[j].y;
    }
    0.5 * sum
}

/// Orientation of the triple `(a, b, c)`: +1 counterclockwise, −1 clockwise,
/// 0 collinear within `eps`.
#[must_use]
pub fn orient(a: Vec2, b: Vec2, c: Vec2, eps: f64) -> i32 {
    let cross = (b - a).cross(c - a);
    if cross > eps {
        1
    } else if cross < -eps {
        -1
    } else {
        0
    }
}

/// True when `p` lies on segment `ab`: collinear within `eps` and inside the
/// segment's bounding box.
#[must_use]
pub fn on_segment(a: Vec2, b: Vec2, p: Vec2, eps: f64) -> bool {
    if orient(a, b, p, eps) != 0 {
        return false;
    }
    p.x >= a.x.min(b.x) - eps
        && p.x <= a.x.max(b.x) + eps
        && p.y >= a.y.min(b.y) - eps
        && p.y <= a.y.max(b.y) + eps
}

/// Proper or degenerate intersection test for segments `p1q1` and `p2q2`,
/// via the four-orientation test plus collinear-overlap handling.
#[must_use]
pub fn segments_intersect(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2, eps: f64) -> bool {
    let o1 = orient(p1, q1, p2, eps);
    let o2 = orient(p1, q1, q2, eps);
    let o3 = orient(p2, q2, p1, eps);
    let o4 = orient(p2, q2, q1, eps);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, q1, p2, eps))
        || (o2 == 0 && on_segment(p1, q1, q2, eps))
        || (o3 == 0 && on_segment(p2, q2, p1, eps))
        || (o4 == 0 && on_segment(p2, q2, q1, eps))
}

/// Validates a counterclockwise loop against the polygon invariants.
pub fn validate_loop(vertices: &[Vec2], tol: Tolerance) -> Result<(), MeshError> {
    let eps = tol.value();
    let n = vertices.len();

    if n < 3 {
        return Err(MeshError::InvalidInput(format!(
            "polygon requires at least 3 vertices, got {n}"
        )));
    }
    if vertices.iter().any(|v| !v.is_finite()) {
        return Err(MeshError::InvalidInput(
            "polygon vertices must be finite".into(),
        ));
    }
    if signed_area(vertices).abs() < eps {
        return Err(MeshError::InvalidInput(
            "polygon is degenerate (near-zero area)".into(),
        ));
    }
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        if (b - a).length() < eps {
            return Err(MeshError::InvalidInput(format!(
                "polygon edge {i} has near-zero length"
            )));
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if tol.approx_eq_vec2(vertices[i], vertices[j]) {
                return Err(MeshError::InvalidInput(format!(
                    "polygon vertices {i} and {j} are duplicates"
                )));
            }
        }
    }
    // Non-adjacent edge pairs must not intersect.
    for i in 0..n {
        let p1 = vertices[i];
        let q1 = vertices[(i + 1) % n];
        for j in (i + 1)..n {
            // Skip the edge itself and the two edges sharing a vertex with it.
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let p2 = vertices[j];
            let q2 = vertices[(j + 1) % n];
            if segments_intersect(p1, q1, p2, q2, eps) {
                return Err(MeshError::InvalidInput(format!(
                    "polygon edges {i} and {j} intersect"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn ccw_input_is_kept() {
        let poly = Polygon2D::new(square(), tol()).unwrap();
        assert!(poly.signed_area() > 0.0);
        assert_eq!(poly.vertices()[1], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn cw_input_is_reversed() {
        let mut verts = square();
        verts.reverse();
        let poly = Polygon2D::new(verts, tol()).unwrap();
        assert!(poly.signed_area() > 0.0);
    }

    #[test]
    fn rejects_two_vertices() {
        let verts = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        assert!(Polygon2D::new(verts, tol()).is_err());
    }

    #[test]
    fn rejects_collinear_triangle() {
        let verts = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
        ];
        assert!(Polygon2D::new(verts, tol()).is_err());
    }

    #[test]
    fn rejects_figure_eight() {
        let verts = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!(Polygon2D::new(verts, tol()).is_err());
    }

    #[test]
    fn rejects_duplicate_vertices() {
        let verts = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ];
        assert!(Polygon2D::new(verts, tol()).is_err());
    }

    #[test]
    fn perimeter_of_unit_square() {
        let poly = Polygon2D::new(square(), tol()).unwrap();
        assert!((poly.perimeter() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rectangle_detection() {
        let rect = Polygon2D::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(4.0, 2.0),
                Vec2::new(0.0, 2.0),
            ],
            tol(),
        )
        .unwrap();
        assert!(rect.is_axis_aligned_rectangle(1e-9));

        let skewed = Polygon2D::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(4.0, 0.5),
                Vec2::new(4.0, 2.0),
                Vec2::new(0.0, 2.0),
            ],
            tol(),
        )
        .unwrap();
        assert!(!skewed.is_axis_aligned_rectangle(1e-9));

        let hexagon = Polygon2D::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(6.0, 0.0),
                Vec2::new(6.0, 3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(3.0, 6.0),
                Vec2::new(0.0, 6.0),
            ],
            tol(),
        )
        .unwrap();
        assert!(!hexagon.is_axis_aligned_rectangle(1e-9));
    }

    #[test]
    fn orientation_predicate() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert_eq!(orient(a, b, Vec2::new(0.5, 1.0), 1e-9), 1);
        assert_eq!(orient(a, b, Vec2::new(0.5, -1.0), 1e-9), -1);
        assert_eq!(orient(a, b, Vec2::new(2.0, 0.0), 1e-9), 0);
    }

    #[test]
    fn segment_intersection_cases() {
        let eps = 1e-9;
        // Crossing.
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
            eps
        ));
        // Disjoint.
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            eps
        ));
        // Collinear overlap.
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(3.0, 0.0),
            eps
        ));
    }
}
