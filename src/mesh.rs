//! Immutable mesh accumulator.
//!
//! [`Mesh`] collects quads, triangles, standalone points and internal
//! segments. Every `add_*` returns a new mesh value; storage is a persistent
//! chunked sequence, so the new value shares all full blocks with its
//! predecessor and only the tail block is copied. Meshes are `Send + Sync`
//! and safe to share across batch workers without synchronization.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Segment3D, Vec3};

/// Four corners in counterclockwise order plus an optional quality score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub corners: [Vec3; 4],
    pub quality: Option<f64>,
}

impl Quad {
    #[must_use]
    pub const fn new(corners: [Vec3; 4]) -> Self {
        Self {
            corners,
            quality: None,
        }
    }

    #[must_use]
    pub const fn with_quality(corners: [Vec3; 4], quality: f64) -> Self {
        Self {
            corners,
            quality: Some(quality),
        }
    }
}

/// Three corners in counterclockwise order plus an optional quality score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub corners: [Vec3; 3],
    pub quality: Option<f64>,
}

impl Triangle {
    #[must_use]
    pub const fn new(corners: [Vec3; 3]) -> Self {
        Self {
            corners,
            quality: None,
        }
    }

    #[must_use]
    pub const fn with_quality(corners: [Vec3; 3], quality: f64) -> Self {
        Self {
            corners,
            quality: Some(quality),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistent chunked sequence
// ─────────────────────────────────────────────────────────────────────────────

const CHUNK: usize = 256;

/// Append-only persistent sequence. Full blocks are shared between versions;
/// a push copies at most one partially filled block.
#[derive(Debug, Clone)]
struct SharedSeq<T> {
    chunks: Vec<Arc<Vec<T>>>,
    len: usize,
}

impl<T: Clone> SharedSeq<T> {
    fn new() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }

    const fn len(&self) -> usize {
        self.len
    }

    fn push(&self, value: T) -> Self {
        self.extend(std::iter::once(value))
    }

    fn extend<I: IntoIterator<Item = T>>(&self, values: I) -> Self {
        let mut chunks = self.chunks.clone();
        let mut len = self.len;
        let mut tail: Vec<T> = match chunks.last() {
            Some(last) if last.len() < CHUNK => {
                let tail = (**last).clone();
                chunks.pop();
                tail
            }
            _ => Vec::new(),
        };
        for value in values {
            if tail.len() == CHUNK {
                chunks.push(Arc::new(std::mem::take(&mut tail)));
            }
            tail.push(value);
            len += 1;
        }
        if !tail.is_empty() {
            chunks.push(Arc::new(tail));
        }
        Self { chunks, len }
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.chunks.iter().flat_map(|c| c.iter())
    }

    fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Clone + PartialEq> PartialEq for SharedSeq<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mesh
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    quads: SharedSeq<Quad>,
    triangles: SharedSeq<Triangle>,
    points: SharedSeq<Vec3>,
    internal_segments: SharedSeq<Segment3D>,
}

impl Mesh {
    #[must_use]
    pub fn new() -> Self {
        Self {
            quads: SharedSeq::new(),
            triangles: SharedSeq::new(),
            points: SharedSeq::new(),
            internal_segments: SharedSeq::new(),
        }
    }

    #[must_use]
    pub fn add_quad(&self, quad: Quad) -> Self {
        Self {
            quads: self.quads.push(quad),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_quads<I: IntoIterator<Item = Quad>>(&self, quads: I) -> Self {
        Self {
            quads: self.quads.extend(quads),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_quads_slice(&self, quads: &[Quad]) -> Self {
        self.add_quads(quads.iter().copied())
    }

    #[must_use]
    pub fn add_triangle(&self, triangle: Triangle) -> Self {
        Self {
            triangles: self.triangles.push(triangle),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_triangles<I: IntoIterator<Item = Triangle>>(&self, triangles: I) -> Self {
        Self {
            triangles: self.triangles.extend(triangles),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_triangles_slice(&self, triangles: &[Triangle]) -> Self {
        self.add_triangles(triangles.iter().copied())
    }

    #[must_use]
    pub fn add_point(&self, point: Vec3) -> Self {
        Self {
            points: self.points.push(point),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_points<I: IntoIterator<Item = Vec3>>(&self, points: I) -> Self {
        Self {
            points: self.points.extend(points),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn add_internal_segment(&self, segment: Segment3D) -> Self {
        Self {
            internal_segments: self.internal_segments.push(segment),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn quad_count(&self) -> usize {
        self.quads.len()
    }

    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub const fn internal_segment_count(&self) -> usize {
        self.internal_segments.len()
    }

    pub fn quads(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter()
    }

    pub fn points(&self) -> impl Iterator<Item = &Vec3> {
        self.points.iter()
    }

    pub fn internal_segments(&self) -> impl Iterator<Item = &Segment3D> {
        self.internal_segments.iter()
    }

    #[must_use]
    pub fn quads_vec(&self) -> Vec<Quad> {
        self.quads.to_vec()
    }

    #[must_use]
    pub fn triangles_vec(&self) -> Vec<Triangle> {
        self.triangles.to_vec()
    }

    /// Axis-aligned bounds over all quad, triangle, point and segment
    /// coordinates; `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut bounds: Option<(Vec3, Vec3)> = None;
        let mut grow = |v: Vec3| {
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(v), max.max(v)),
                None => (v, v),
            });
        };
        for q in self.quads.iter() {
            for c in q.corners {
                grow(c);
            }
        }
        for t in self.triangles.iter() {
            for c in t.corners {
                grow(c);
            }
        }
        for p in self.points.iter() {
            grow(*p);
        }
        for s in self.internal_segments.iter() {
            grow(s.a);
            grow(s.b);
        }
        bounds
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
