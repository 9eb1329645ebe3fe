//! Cap generation.
//!
//! Caps are meshed in 2D first and lifted to their elevation afterwards, so
//! the bottom and top cap share one plan. Axis-aligned rectangular
//! footprints without holes take a direct grid path; everything else is
//! tessellated with a Delaunay triangulation over boundary samples plus
//! interior Steiner points, then adjacent triangles are paired into convex,
//! quality-scored quads. Pairing is greedy in descending score, and
//! triangles that stay unpaired are either emitted or dropped depending on
//! the options.

use delaunator::{EMPTY, Point, triangulate};

use crate::core::{Segment2D, Vec2, Vec3};
use crate::error::MeshError;
use crate::mesh::{Quad, Triangle};
use crate::options::MesherOptions;
use crate::polygon::Polygon2D;
use crate::pool::BufferPool;
use crate::proximity::{
    SpatialPolygonIndex, distance_to_loop_boundary, near_any_hole, near_any_segment,
    point_in_polygon,
};
use crate::structure::PrismStructureDefinition;

/// Convexity slack for quad candidates.
const CONVEXITY_EPS: f64 = -1e-12;

/// Steiner points closer to a boundary than this fraction of the local pitch
/// are discarded to avoid sliver triangles.
const BOUNDARY_MARGIN: f64 = 0.35;

/// Loops above this vertex count get a grid-accelerated containment index.
const INDEX_THRESHOLD: usize = 32;

/// Counts collected while building cap geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapDiagnostics {
    /// Quads produced by triangle pairing (general path only).
    pub paired_quads: usize,
    /// Triangles left unpaired by the greedy pass (emitted or dropped).
    pub rejected_triangles: usize,
    /// Triangles kept by the tessellation after region filtering.
    pub tessellated_triangles: usize,
    /// Coarse cells subdivided by a refinement band.
    pub refined_cells: usize,
    /// Whether the rectangle fast path was taken for the footprint caps.
    pub fast_path: bool,
}

impl CapDiagnostics {
    fn merge(&mut self, other: &Self) {
        self.paired_quads += other.paired_quads;
        self.rejected_triangles += other.rejected_triangles;
        self.tessellated_triangles += other.tessellated_triangles;
        self.refined_cells += other.refined_cells;
        self.fast_path |= other.fast_path;
    }
}

/// Cap quads and triangles for one structure, both caps and all internal
/// surfaces included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapGeometry {
    pub quads: Vec<Quad>,
    pub triangles: Vec<Triangle>,
    pub diagnostics: CapDiagnostics,
}

/// Capability seam for cap generation; the orchestrator accepts any
/// implementation at construction time.
pub trait CapMeshing: Send + Sync {
    fn generate_caps(
        &self,
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
        z0: f64,
        z1: f64,
    ) -> Result<CapGeometry, MeshError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementation
// ─────────────────────────────────────────────────────────────────────────────

/// 2D cap plan shared by the bottom and top cap of one surface.
#[derive(Debug, Clone)]
struct CapPlan {
    quads: Vec<([Vec2; 4], f64)>,
    triangles: Vec<[Vec2; 3]>,
    diagnostics: CapDiagnostics,
}

#[derive(Debug, Default)]
pub struct DefaultCapMesher {
    point_pool: BufferPool<Point>,
    scratch_pool: BufferPool<usize>,
}

impl DefaultCapMesher {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            point_pool: BufferPool::new(),
            scratch_pool: BufferPool::new(),
        }
    }

    fn plan_surface(
        &self,
        outer: &Polygon2D,
        holes: &[Polygon2D],
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
    ) -> Result<CapPlan, MeshError> {
        let eps = options.epsilon.value();
        if holes.is_empty()
            && outer.is_axis_aligned_rectangle(eps)
            && !segment_refinement_active(structure, options)
        {
            Ok(rectangle_plan(outer, options))
        } else {
            self.general_plan(outer, holes, structure, options)
        }
    }

    fn general_plan(
        &self,
        outer: &Polygon2D,
        holes: &[Polygon2D],
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
    ) -> Result<CapPlan, MeshError> {
        let eps = options.epsilon.value();
        let base = options.target_edge_length_xy.value();
        let hole_fine = options
            .target_edge_length_xy_near_holes
            .map_or(base, crate::core::EdgeLength::value);
        let segment_fine = options
            .target_edge_length_xy_near_segments
            .map_or(base, crate::core::EdgeLength::value);
        let hole_refine = options.target_edge_length_xy_near_holes.is_some()
            && options.hole_refine_band > 0.0
            && !holes.is_empty();
        let segment_refine = segment_refinement_active(structure, options);
        let segments_2d: Vec<Segment2D> = structure
            .constraint_segments()
            .iter()
            .map(|(s, _)| *s)
            .collect();

        let mut diagnostics = CapDiagnostics::default();
        let mut samples: Vec<Vec2> = Vec::new();

        // Boundary samples: loop vertices plus edge subdivision at the local
        // pitch. Hole loops use the fine pitch when hole refinement is on.
        sample_loop_boundary(outer.vertices(), base, &mut samples);
        let hole_pitch = if hole_refine { hole_fine } else { base };
        for hole in holes {
            sample_loop_boundary(hole.vertices(), hole_pitch, &mut samples);
        }

        // Interior Steiner points at coarse cell centers; cells inside a
        // refinement band are subdivided at the fine pitch.
        let outer_index =
            (outer.vertex_count() > INDEX_THRESHOLD).then(|| SpatialPolygonIndex::build(outer, eps));
        let region_contains = |p: Vec2| -> bool {
            let inside_outer = outer_index
                .as_ref()
                .map_or_else(|| point_in_polygon(outer.vertices(), p, eps), |ix| ix.is_inside(p.x, p.y));
            inside_outer && !holes.iter().any(|h| point_in_polygon(h.vertices(), p, eps))
        };
        let keep_steiner = |p: Vec2, pitch: f64| -> bool {
            if !region_contains(p) {
                return false;
            }
            let mut clearance = distance_to_loop_boundary(outer.vertices(), p);
            for hole in holes {
                clearance = clearance.min(distance_to_loop_boundary(hole.vertices(), p));
            }
            clearance >= BOUNDARY_MARGIN * pitch
        };

        let (min, max) = outer.bounding_box();
        let width = (max.x - min.x).max(eps);
        let height = (max.y - min.y).max(eps);
        let nx = ((width / base).ceil() as usize).max(1);
        let ny = ((height / base).ceil() as usize).max(1);
        let dx = width / nx as f64;
        let dy = height / ny as f64;

        for j in 0..ny {
            for i in 0..nx {
                let center = Vec2::new(
                    min.x + (i as f64 + 0.5) * dx,
                    min.y + (j as f64 + 0.5) * dy,
                );
                let near_hole = hole_refine && near_any_hole(holes, center, options.hole_refine_band);
                let near_segment = segment_refine
                    && near_any_segment(&segments_2d, center, options.segment_refine_band);
                if near_hole || near_segment {
                    let mut pitch = f64::INFINITY;
                    if near_hole {
                        pitch = pitch.min(hole_fine);
                    }
                    if near_segment {
                        pitch = pitch.min(segment_fine);
                    }
                    diagnostics.refined_cells += 1;

                    let fx = ((dx / pitch).ceil() as usize).max(1);
                    let fy = ((dy / pitch).ceil() as usize).max(1);
                    for fj in 0..fy {
                        for fi in 0..fx {
                            let p = Vec2::new(
                                min.x + i as f64 * dx + (fi as f64 + 0.5) * dx / fx as f64,
                                min.y + j as f64 * dy + (fj as f64 + 0.5) * dy / fy as f64,
                            );
                            if keep_steiner(p, pitch) {
                                samples.push(p);
                            }
                        }
                    }
                } else if keep_steiner(center, base) {
                    samples.push(center);
                }
            }
        }

        // Tessellate and pair.
        let mut points = self.point_pool.take();
        points.extend(samples.iter().map(|p| Point { x: p.x, y: p.y }));
        let tessellation = triangulate(&points);
        self.point_pool.give(points);

        if tessellation.triangles.is_empty() {
            return Err(MeshError::OperationError(
                "cap tessellation produced no triangles".into(),
            ));
        }

        let triangle_count = tessellation.triangles.len() / 3;
        let mut kept = vec![false; triangle_count];
        for t in 0..triangle_count {
            let a = samples[tessellation.triangles[3 * t]];
            let b = samples[tessellation.triangles[3 * t + 1]];
            let c = samples[tessellation.triangles[3 * t + 2]];
            let centroid = Vec2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
            kept[t] = region_contains(centroid);
        }
        diagnostics.tessellated_triangles = kept.iter().filter(|&&k| k).count();
        if diagnostics.tessellated_triangles == 0 {
            return Err(MeshError::OperationError(
                "no cap triangle lies inside the footprint region".into(),
            ));
        }

        let mut candidates: Vec<QuadCandidate> = Vec::new();
        for e in 0..tessellation.halfedges.len() {
            let twin = tessellation.halfedges[e];
            if twin == EMPTY || twin < e {
                continue;
            }
            let t1 = e / 3;
            let t2 = twin / 3;
            if !kept[t1] || !kept[t2] {
                continue;
            }
            let u = samples[tessellation.triangles[e]];
            let v = samples[tessellation.triangles[next_halfedge(e)]];
            let a = samples[tessellation.triangles[prev_halfedge(e)]];
            let b = samples[tessellation.triangles[prev_halfedge(twin)]];

            // Boundary cycle of the union with the shared edge removed.
            let corners = ccw_quad([a, u, b, v]);
            if !is_convex_quad(&corners) {
                continue;
            }
            let score = quad_quality(&corners);
            candidates.push(QuadCandidate {
                score,
                t_min: t1.min(t2),
                t_max: t1.max(t2),
                corners,
            });
        }

        candidates.sort_by(|x, y| {
            y.score
                .total_cmp(&x.score)
                .then(x.t_min.cmp(&y.t_min))
                .then(x.t_max.cmp(&y.t_max))
        });

        let mut consumed = self.scratch_pool.take();
        consumed.clear();
        consumed.resize(triangle_count, 0);

        let mut quads = Vec::new();
        for candidate in &candidates {
            if candidate.score < options.min_cap_quad_quality {
                break; // Sorted descending; nothing further qualifies.
            }
            if consumed[candidate.t_min] != 0 || consumed[candidate.t_max] != 0 {
                continue;
            }
            consumed[candidate.t_min] = 1;
            consumed[candidate.t_max] = 1;
            quads.push((candidate.corners, candidate.score));
        }
        diagnostics.paired_quads = quads.len();

        let mut triangles = Vec::new();
        for t in 0..triangle_count {
            if !kept[t] || consumed[t] != 0 {
                continue;
            }
            diagnostics.rejected_triangles += 1;
            if options.output_rejected_cap_triangles {
                let corners = ccw_triangle([
                    samples[tessellation.triangles[3 * t]],
                    samples[tessellation.triangles[3 * t + 1]],
                    samples[tessellation.triangles[3 * t + 2]],
                ]);
                triangles.push(corners);
            }
        }
        self.scratch_pool.give(consumed);

        Ok(CapPlan {
            quads,
            triangles,
            diagnostics,
        })
    }
}

impl CapMeshing for DefaultCapMesher {
    fn generate_caps(
        &self,
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
        z0: f64,
        z1: f64,
    ) -> Result<CapGeometry, MeshError> {
        let mut geometry = CapGeometry::default();

        if options.generate_bottom_cap || options.generate_top_cap {
            let plan = self.plan_surface(
                structure.footprint(),
                structure.holes(),
                structure,
                options,
            )?;
            if options.generate_bottom_cap {
                emit_plan(&plan, z0, false, &mut geometry);
            }
            if options.generate_top_cap {
                emit_plan(&plan, z1, true, &mut geometry);
            }
            geometry.diagnostics.merge(&plan.diagnostics);
        }

        for surface in structure.internal_surfaces() {
            let plan = self.plan_surface(&surface.outer, &surface.holes, structure, options)?;
            emit_plan(&plan, surface.elevation, true, &mut geometry);
            geometry.diagnostics.merge(&plan.diagnostics);
        }

        Ok(geometry)
    }
}

fn segment_refinement_active(
    structure: &PrismStructureDefinition,
    options: &MesherOptions,
) -> bool {
    options.target_edge_length_xy_near_segments.is_some()
        && options.segment_refine_band > 0.0
        && !structure.constraint_segments().is_empty()
}

/// Grid plan for an axis-aligned rectangle without holes.
fn rectangle_plan(outer: &Polygon2D, options: &MesherOptions) -> CapPlan {
    let target = options.target_edge_length_xy.value();
    let (min, max) = outer.bounding_box();
    let width = max.x - min.x;
    let height = max.y - min.y;
    let nx = ((width / target).ceil() as usize).max(1);
    let ny = ((height / target).ceil() as usize).max(1);
    let dx = width / nx as f64;
    let dy = height / ny as f64;

    let mut quads = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let x0 = min.x + i as f64 * dx;
            let x1 = min.x + (i + 1) as f64 * dx;
            let y0 = min.y + j as f64 * dy;
            let y1 = min.y + (j + 1) as f64 * dy;
            let corners = [
                Vec2::new(x0, y0),
                Vec2::new(x1, y0),
                Vec2::new(x1, y1),
                Vec2::new(x0, y1),
            ];
            let score = quad_quality(&corners);
            quads.push((corners, score));
        }
    }

    CapPlan {
        quads,
        triangles: Vec::new(),
        diagnostics: CapDiagnostics {
            fast_path: true,
            ..CapDiagnostics::default()
        },
    }
}

fn sample_loop_boundary(vertices: &[Vec2], pitch: f64, out: &mut Vec<Vec2>) {
    let n = vertices.len();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let div = (((b - a).length() / pitch).ceil() as usize).max(1);
        for k in 0..div {
            out.push(a.lerp(b, k as f64 / div as f64));
        }
    }
}

fn emit_plan(plan: &CapPlan, z: f64, upward: bool, geometry: &mut CapGeometry) {
    for (corners, score) in &plan.quads {
        let c = if upward {
            [corners[0], corners[1], corners[2], corners[3]]
        } else {
            [corners[0], corners[3], corners[2], corners[1]]
        };
        geometry.quads.push(Quad::with_quality(
            [
                Vec3::from_xy(c[0], z),
                Vec3::from_xy(c[1], z),
                Vec3::from_xy(c[2], z),
                Vec3::from_xy(c[3], z),
            ],
            *score,
        ));
    }
    for corners in &plan.triangles {
        let c = if upward {
            [corners[0], corners[1], corners[2]]
        } else {
            [corners[0], corners[2], corners[1]]
        };
        geometry.triangles.push(Triangle::new([
            Vec3::from_xy(c[0], z),
            Vec3::from_xy(c[1], z),
            Vec3::from_xy(c[2], z),
        ]));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pairing helpers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct QuadCandidate {
    score: f64,
    t_min: usize,
    t_max: usize,
    corners: [Vec2; 4],
}

const fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 { e - 2 } else { e + 1 }
}

const fn prev_halfedge(e: usize) -> usize {
    if e % 3 == 0 { e + 2 } else { e - 1 }
}

fn quad_signed_area(corners: &[Vec2; 4]) -> f64 {
    let mut sum = 0.0;
    for i in 0..4 {
        sum += corners[i].cross(corners[(i + 1) % 4]);
    }
    0.5 * sum
}

fn ccw_quad(mut corners: [Vec2; 4]) -> [Vec2; 4] {
    if quad_signed_area(&corners) < 0.0 {
        corners.swap(1, 3);
    }
    corners
}

fn ccw_triangle(mut corners: [Vec2; 3]) -> [Vec2; 3] {
    let area = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
    if area < 0.0 {
        corners.swap(1, 2);
    }
    corners
}

/// Convexity check: all four edge cross products must share sign within
/// [`CONVEXITY_EPS`] slack.
fn is_convex_quad(corners: &[Vec2; 4]) -> bool {
    for i in 0..4 {
        let e1 = corners[(i + 1) % 4] - corners[i];
        let e2 = corners[(i + 2) % 4] - corners[(i + 1) % 4];
        if e1.cross(e2) < CONVEXITY_EPS {
            return false;
        }
    }
    true
}

/// Quality score `0.5·aspect + 0.4·ortho + 0.1·area` in [0, 1].
///
/// `aspect` is the shortest-to-longest edge ratio, `ortho` the mean corner
/// orthogonality and `area` a non-degeneracy indicator.
#[must_use]
pub fn quad_quality(corners: &[Vec2; 4]) -> f64 {
    let edges = [
        corners[1] - corners[0],
        corners[2] - corners[1],
        corners[3] - corners[2],
        corners[0] - corners[3],
    ];
    let lengths = edges.map(Vec2::length);
    let min_edge = lengths.iter().copied().fold(f64::INFINITY, f64::min);
    let max_edge = lengths.iter().copied().fold(0.0_f64, f64::max);

    let aspect = if min_edge <= 1e-12 || max_edge <= 0.0 {
        0.0
    } else {
        min_edge / max_edge
    };

    let mut ortho_sum = 0.0;
    for i in 0..4 {
        let incoming = edges[(i + 3) % 4];
        let outgoing = edges[i];
        let denom = incoming.length() * outgoing.length();
        if denom > 0.0 {
            ortho_sum += 1.0 - (incoming.dot(outgoing).abs() / denom);
        }
    }
    let ortho = ortho_sum / 4.0;

    let area_score = if quad_signed_area(corners).abs() > 1e-12 {
        1.0
    } else {
        0.0
    };

    0.5f64.mul_add(aspect, 0.4f64.mul_add(ortho, 0.1 * area_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Tolerance;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn rect(w: f64, h: f64) -> Polygon2D {
        Polygon2D::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(w, 0.0),
                Vec2::new(w, h),
                Vec2::new(0.0, h),
            ],
            tol(),
        )
        .unwrap()
    }

    fn options() -> MesherOptions {
        MesherOptions::builder().build().unwrap()
    }

    #[test]
    fn unit_square_scores_one() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!((quad_quality(&corners) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_quad_scores_low() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(3.0, 0.0),
        ];
        assert!(quad_quality(&corners) < 0.3);
    }

    #[test]
    fn stretched_quad_scores_below_square() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let q = quad_quality(&corners);
        assert!(q < 1.0);
        assert!(q > 0.5);
    }

    #[test]
    fn convexity_rejects_bowtie() {
        let convex = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(is_convex_quad(&convex));

        let bowtie = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(!is_convex_quad(&bowtie));

        let concave = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(0.0, 2.0),
        ];
        assert!(!is_convex_quad(&concave));
    }

    #[test]
    fn fast_path_grid_counts() {
        let mesher = DefaultCapMesher::new();
        let structure = PrismStructureDefinition::new(rect(4.0, 2.0), 0.0, 1.0).unwrap();
        let caps = mesher
            .generate_caps(&structure, &options(), 0.0, 1.0)
            .unwrap();

        assert!(caps.diagnostics.fast_path);
        assert_eq!(caps.quads.len(), 16); // 2 caps × 4 × 2 cells
        assert!(caps.triangles.is_empty());
        assert!(caps.quads.iter().all(|q| q.quality.unwrap() >= 0.8));
    }

    #[test]
    fn fast_path_cap_windings_oppose() {
        let mesher = DefaultCapMesher::new();
        let structure = PrismStructureDefinition::new(rect(2.0, 2.0), 0.0, 1.0).unwrap();
        let caps = mesher
            .generate_caps(&structure, &options(), 0.0, 1.0)
            .unwrap();

        let normal = |q: &Quad| {
            (q.corners[1] - q.corners[0])
                .cross(q.corners[3] - q.corners[0])
                .normalize()
        };
        let bottom: Vec<&Quad> = caps.quads.iter().filter(|q| q.corners[0].z == 0.0).collect();
        let top: Vec<&Quad> = caps.quads.iter().filter(|q| q.corners[0].z == 1.0).collect();
        assert!(!bottom.is_empty() && !top.is_empty());
        assert!(bottom.iter().all(|q| normal(q).z < 0.0));
        assert!(top.iter().all(|q| normal(q).z > 0.0));
    }

    #[test]
    fn general_path_is_quad_dominant() {
        let mesher = DefaultCapMesher::new();
        let structure = PrismStructureDefinition::new(rect(10.0, 6.0), 0.0, 2.0)
            .unwrap()
            .with_hole(
                Polygon2D::new(
                    vec![
                        Vec2::new(4.0, 2.0),
                        Vec2::new(6.0, 2.0),
                        Vec2::new(6.0, 4.0),
                        Vec2::new(4.0, 4.0),
                    ],
                    tol(),
                )
                .unwrap(),
            );
        let opts = MesherOptions::builder()
            .min_cap_quad_quality(0.5)
            .output_rejected_cap_triangles(true)
            .build()
            .unwrap();
        let caps = mesher.generate_caps(&structure, &opts, 0.0, 2.0).unwrap();

        assert!(!caps.diagnostics.fast_path);
        assert!(caps.quads.len() > caps.triangles.len());
        assert!(caps.quads.iter().all(|q| q.quality.unwrap() >= 0.5));

        // No cap vertex falls inside the hole interior.
        for quad in &caps.quads {
            for c in quad.corners {
                let strictly_inside_hole =
                    c.x > 4.0 + 1e-9 && c.x < 6.0 - 1e-9 && c.y > 2.0 + 1e-9 && c.y < 4.0 - 1e-9;
                assert!(!strictly_inside_hole, "cap vertex inside hole: {c:?}");
            }
        }
    }

    #[test]
    fn strict_quality_threshold_leaves_triangles() {
        let mesher = DefaultCapMesher::new();
        let footprint = Polygon2D::new(
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
        let structure = PrismStructureDefinition::new(footprint, 0.0, 1.0).unwrap();
        let opts = MesherOptions::builder()
            .min_cap_quad_quality(0.8)
            .output_rejected_cap_triangles(true)
            .build()
            .unwrap();
        let caps = mesher.generate_caps(&structure, &opts, 0.0, 1.0).unwrap();

        assert!(!caps.triangles.is_empty());
        assert!(caps.quads.iter().all(|q| q.quality.unwrap() >= 0.8));
    }

    #[test]
    fn rejected_triangles_can_be_dropped() {
        let mesher = DefaultCapMesher::new();
        let footprint = Polygon2D::new(
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
        let structure = PrismStructureDefinition::new(footprint, 0.0, 1.0).unwrap();
        let opts = MesherOptions::builder()
            .min_cap_quad_quality(0.8)
            .output_rejected_cap_triangles(false)
            .build()
            .unwrap();
        let caps = mesher.generate_caps(&structure, &opts, 0.0, 1.0).unwrap();

        assert!(caps.triangles.is_empty());
        assert!(caps.diagnostics.rejected_triangles > 0);
    }

    #[test]
    fn internal_surfaces_are_meshed_at_their_elevation() {
        let mesher = DefaultCapMesher::new();
        let structure = PrismStructureDefinition::new(rect(4.0, 4.0), 0.0, 2.0)
            .unwrap()
            .with_internal_surface(rect(4.0, 4.0), 1.0, Vec::new())
            .unwrap();
        let opts = MesherOptions::builder()
            .generate_bottom_cap(false)
            .generate_top_cap(false)
            .build()
            .unwrap();
        let caps = mesher.generate_caps(&structure, &opts, 0.0, 2.0).unwrap();

        assert!(!caps.quads.is_empty());
        assert!(caps.quads.iter().all(|q| q.corners.iter().all(|c| c.z == 1.0)));
        // Internal surfaces face upward.
        let q = &caps.quads[0];
        assert!((q.corners[1] - q.corners[0]).cross(q.corners[3] - q.corners[0]).z > 0.0);
    }

    #[test]
    fn hole_refinement_subdivides_cells() {
        let mesher = DefaultCapMesher::new();
        let structure = PrismStructureDefinition::new(rect(10.0, 6.0), 0.0, 1.0)
            .unwrap()
            .with_hole(
                Polygon2D::new(
                    vec![
                        Vec2::new(4.0, 2.0),
                        Vec2::new(6.0, 2.0),
                        Vec2::new(6.0, 4.0),
                        Vec2::new(4.0, 4.0),
                    ],
                    tol(),
                )
                .unwrap(),
            );
        let opts = MesherOptions::builder()
            .target_edge_length_xy_near_holes(0.5)
            .hole_refine_band(1.0)
            .build()
            .unwrap();
        let caps = mesher.generate_caps(&structure, &opts, 0.0, 1.0).unwrap();
        assert!(caps.diagnostics.refined_cells > 0);
    }
}
