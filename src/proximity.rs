//! Point containment and proximity queries.
//!
//! The ray-cast [`point_in_polygon`] test is the containment oracle for the
//! whole engine; [`SpatialPolygonIndex`] is a uniform-grid accelerator that
//! must agree with it on every query. Proximity scans back the cap mesher's
//! refinement bands.

use crate::core::{Segment2D, Vec2};
use crate::polygon::Polygon2D;

/// Ray-cast containment test with a horizontal +X ray.
///
/// Points on the boundary count as inside (within `eps`).
#[must_use]
pub fn point_in_polygon(vertices: &[Vec2], p: Vec2, eps: f64) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        if crate::polygon::on_segment(vertices[i], vertices[(i + 1) % n], p, eps) {
            return true;
        }
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from `p` to segment `ab` (projection parameter clamped to [0, 1]).
#[must_use]
pub fn distance_point_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - a.lerp(b, t)).length()
}

/// Shortest distance from `p` to the boundary of a closed loop.
#[must_use]
pub fn distance_to_loop_boundary(vertices: &[Vec2], p: Vec2) -> f64 {
    let n = vertices.len();
    let mut best = f64::INFINITY;
    for i in 0..n {
        let d = distance_point_to_segment(p, vertices[i], vertices[(i + 1) % n]);
        best = best.min(d);
    }
    best
}

/// True when `p` lies within `band` of any hole boundary. Early exit on match.
#[must_use]
pub fn near_any_hole(holes: &[Polygon2D], p: Vec2, band: f64) -> bool {
    if band <= 0.0 {
        return false;
    }
    holes
        .iter()
        .any(|hole| distance_to_loop_boundary(hole.vertices(), p) <= band)
}

/// True when `p` lies within `band` of any segment. Early exit on match.
#[must_use]
pub fn near_any_segment(segments: &[Segment2D], p: Vec2, band: f64) -> bool {
    if band <= 0.0 {
        return false;
    }
    segments
        .iter()
        .any(|s| distance_point_to_segment(p, s.a, s.b) <= band)
}

// ─────────────────────────────────────────────────────────────────────────────
// SpatialPolygonIndex
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Inside,
    Outside,
    Boundary,
}

/// Uniform-grid acceleration structure for point-in-polygon queries.
///
/// Cells untouched by any edge are classified once from their center; queries
/// in those cells are O(1). Boundary cells fall back to the ray-cast oracle,
/// so results always match [`point_in_polygon`].
#[derive(Debug, Clone)]
pub struct SpatialPolygonIndex {
    vertices: Vec<Vec2>,
    eps: f64,
    min: Vec2,
    inv_cell: Vec2,
    nx: usize,
    ny: usize,
    cells: Vec<CellKind>,
}

impl SpatialPolygonIndex {
    #[must_use]
    pub fn build(polygon: &Polygon2D, eps: f64) -> Self {
        Self::build_from_loop(polygon.vertices().to_vec(), eps)
    }

    fn build_from_loop(vertices: Vec<Vec2>, eps: f64) -> Self {
        let mut min = vertices[0];
        let mut max = vertices[0];
        for v in &vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }

        let n = vertices.len();
        let res = ((n as f64).sqrt().ceil() as usize).clamp(4, 64);
        let (nx, ny) = (res, res);
        let size = Vec2::new((max.x - min.x).max(eps), (max.y - min.y).max(eps));
        let cell = Vec2::new(size.x / nx as f64, size.y / ny as f64);

        let mut cells = vec![CellKind::Outside; nx * ny];

        // Mark every cell whose rectangle overlaps an edge bounding box as a
        // boundary cell (conservative).
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let lo_x = (((a.x.min(b.x) - eps - min.x) / cell.x).floor() as isize).max(0) as usize;
            let hi_x =
                ((((a.x.max(b.x) + eps - min.x) / cell.x).floor() as isize).max(0) as usize)
                    .min(nx - 1);
            let lo_y = (((a.y.min(b.y) - eps - min.y) / cell.y).floor() as isize).max(0) as usize;
            let hi_y =
                ((((a.y.max(b.y) + eps - min.y) / cell.y).floor() as isize).max(0) as usize)
                    .min(ny - 1);
            for cy in lo_y..=hi_y {
                for cx in lo_x..=hi_x {
                    cells[cy * nx + cx] = CellKind::Boundary;
                }
            }
        }

        // Classify the remaining cells from their center; edge-free cells are
        // uniformly inside or outside.
        for cy in 0..ny {
            for cx in 0..nx {
                let idx = cy * nx + cx;
                if cells[idx] == CellKind::Boundary {
                    continue;
                }
                let center = Vec2::new(
                    min.x + (cx as f64 + 0.5) * cell.x,
                    min.y + (cy as f64 + 0.5) * cell.y,
                );
                cells[idx] = if point_in_polygon(&vertices, center, eps) {
                    CellKind::Inside
                } else {
                    CellKind::Outside
                };
            }
        }

        Self {
            vertices,
            eps,
            min,
            inv_cell: Vec2::new(1.0 / cell.x, 1.0 / cell.y),
            nx,
            ny,
            cells,
        }
    }

    /// Expected O(log n) containment query; exact agreement with the
    /// ray-cast oracle.
    #[must_use]
    pub fn is_inside(&self, x: f64, y: f64) -> bool {
        let p = Vec2::new(x, y);
        let cx = ((x - self.min.x) * self.inv_cell.x).floor() as isize;
        let cy = ((y - self.min.y) * self.inv_cell.y).floor() as isize;
        if cx < 0 || cy < 0 || cx as usize >= self.nx || cy as usize >= self.ny {
            // Outside the grid; only boundary tolerance can still claim it.
            return point_in_polygon(&self.vertices, p, self.eps);
        }
        match self.cells[cy as usize * self.nx + cx as usize] {
            CellKind::Inside => true,
            CellKind::Outside => false,
            CellKind::Boundary => point_in_polygon(&self.vertices, p, self.eps),
        }
    }
}
