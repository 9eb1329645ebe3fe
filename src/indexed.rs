//! Indexed mesh construction.
//!
//! [`IndexedMesh`] deduplicates vertices with a rounded-coordinate key at
//! the given tolerance, translates quads and triangles to index tuples in
//! emission order, and derives the unique undirected edge set (endpoints
//! sorted ascending, first-seen order preserved).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::Vec3;
use crate::error::MeshError;
use crate::mesh::{Mesh, Quad, Triangle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedMesh {
    vertices: Vec<Vec3>,
    edges: Vec<(u32, u32)>,
    quads: Vec<[u32; 4]>,
    triangles: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Builds an indexed mesh from an accumulator, welding vertices that
    /// round to the same coordinate at tolerance `epsilon`.
    pub fn from_mesh(mesh: &Mesh, epsilon: f64) -> Result<Self, MeshError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(MeshError::ArgumentError(format!(
                "epsilon must be positive and finite, got {epsilon}"
            )));
        }

        let mut vertices: Vec<Vec3> = Vec::new();
        let mut lookup: HashMap<(i64, i64, i64), u32> = HashMap::new();
        let mut index_of = |v: Vec3| -> u32 {
            let key = quantize(v, epsilon);
            *lookup.entry(key).or_insert_with(|| {
                vertices.push(v);
                (vertices.len() - 1) as u32
            })
        };

        let mut quads = Vec::with_capacity(mesh.quad_count());
        for quad in mesh.quads() {
            quads.push(quad.corners.map(&mut index_of));
        }
        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        for triangle in mesh.triangles() {
            triangles.push(triangle.corners.map(&mut index_of));
        }

        let edges = derive_edges(&quads, &triangles);

        Ok(Self {
            vertices,
            edges,
            quads,
            triangles,
        })
    }

    /// Assembles an indexed mesh from already-indexed parts, validating
    /// every index. Used by the text-format readers.
    pub fn from_parts(
        vertices: Vec<Vec3>,
        edges: Vec<(u32, u32)>,
        quads: Vec<[u32; 4]>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, MeshError> {
        let n = vertices.len() as u32;
        let check = |i: u32| -> Result<(), MeshError> {
            if i >= n {
                Err(MeshError::IndexError(format!(
                    "vertex index {i} out of range (vertex count {n})"
                )))
            } else {
                Ok(())
            }
        };
        for (a, b) in &edges {
            check(*a)?;
            check(*b)?;
        }
        for quad in &quads {
            for &i in quad {
                check(i)?;
            }
        }
        for triangle in &triangles {
            for &i in triangle {
                check(i)?;
            }
        }
        Ok(Self {
            vertices,
            edges,
            quads,
            triangles,
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[must_use]
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    #[must_use]
    pub fn quads(&self) -> &[[u32; 4]] {
        &self.quads
    }

    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Reconstructs an accumulator mesh with the same quad and triangle set.
    #[must_use]
    pub fn to_mesh(&self) -> Mesh {
        let quads = self.quads.iter().map(|q| {
            Quad::new([
                self.vertices[q[0] as usize],
                self.vertices[q[1] as usize],
                self.vertices[q[2] as usize],
                self.vertices[q[3] as usize],
            ])
        });
        let triangles = self.triangles.iter().map(|t| {
            Triangle::new([
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ])
        });
        Mesh::new().add_quads(quads).add_triangles(triangles)
    }
}

fn quantize(v: Vec3, epsilon: f64) -> (i64, i64, i64) {
    (
        (v.x / epsilon).round() as i64,
        (v.y / epsilon).round() as i64,
        (v.z / epsilon).round() as i64,
    )
}

/// Unique undirected edges over all faces; endpoints ascending, first-seen
/// order preserved.
fn derive_edges(quads: &[[u32; 4]], triangles: &[[u32; 3]]) -> Vec<(u32, u32)> {
    let mut edges: Vec<(u32, u32)> = Vec::new();
    let mut seen: HashMap<(u32, u32), ()> = HashMap::new();
    let mut insert = |a: u32, b: u32| {
        let key = if a <= b { (a, b) } else { (b, a) };
        if seen.insert(key, ()).is_none() {
            edges.push(key);
        }
    };
    for quad in quads {
        for i in 0..4 {
            insert(quad[i], quad[(i + 1) % 4]);
        }
    }
    for triangle in triangles {
        for i in 0..3 {
            insert(triangle[i], triangle[(i + 1) % 3]);
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Quad {
        Quad::new([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn single_quad_indexes_four_vertices() {
        let mesh = Mesh::new().add_quad(unit_quad());
        let indexed = IndexedMesh::from_mesh(&mesh, 1e-9).unwrap();

        assert_eq!(indexed.vertex_count(), 4);
        assert_eq!(indexed.quad_count(), 1);
        assert_eq!(indexed.edge_count(), 4);
        assert_eq!(indexed.quads()[0], [0, 1, 2, 3]);
    }

    #[test]
    fn shared_vertices_are_welded() {
        let second = Quad::new([
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]);
        let mesh = Mesh::new().add_quad(unit_quad()).add_quad(second);
        let indexed = IndexedMesh::from_mesh(&mesh, 1e-9).unwrap();

        // Two quads sharing one edge: 6 distinct vertices, 7 edges.
        assert_eq!(indexed.vertex_count(), 6);
        assert_eq!(indexed.edge_count(), 7);
    }

    #[test]
    fn near_coincident_vertices_weld_at_tolerance() {
        let jittered = Quad::new([
            Vec3::new(0.0, 0.0, 1e-12),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        let mesh = Mesh::new().add_quad(unit_quad()).add_quad(jittered);
        let indexed = IndexedMesh::from_mesh(&mesh, 1e-9).unwrap();
        assert_eq!(indexed.vertex_count(), 4);
    }

    #[test]
    fn edges_are_sorted_and_unique() {
        let mesh = Mesh::new().add_quad(unit_quad());
        let indexed = IndexedMesh::from_mesh(&mesh, 1e-9).unwrap();
        for &(a, b) in indexed.edges() {
            assert!(a < b);
        }
        let mut dedup = indexed.edges().to_vec();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), indexed.edge_count());
    }

    #[test]
    fn indices_are_in_range() {
        let mesh = Mesh::new().add_quad(unit_quad()).add_triangle(Triangle::new([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, -1.0, 0.0),
        ]));
        let indexed = IndexedMesh::from_mesh(&mesh, 1e-9).unwrap();
        let n = indexed.vertex_count() as u32;
        assert!(indexed.quads().iter().flatten().all(|&i| i < n));
        assert!(indexed.triangles().iter().flatten().all(|&i| i < n));
    }

    #[test]
    fn round_trip_preserves_faces() {
        let mesh = Mesh::new().add_quad(unit_quad()).add_triangle(Triangle::new([
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(3.5, 1.0, 0.0),
        ]));
        let indexed = IndexedMesh::from_mesh(&mesh, 1e-9).unwrap();
        let rebuilt = indexed.to_mesh();

        assert_eq!(rebuilt.quad_count(), mesh.quad_count());
        assert_eq!(rebuilt.triangle_count(), mesh.triangle_count());
        let original: Vec<[Vec3; 4]> = mesh.quads().map(|q| q.corners).collect();
        let recovered: Vec<[Vec3; 4]> = rebuilt.quads().map(|q| q.corners).collect();
        assert_eq!(original, recovered);
    }

    #[test]
    fn invalid_epsilon_is_rejected() {
        let mesh = Mesh::new();
        assert!(IndexedMesh::from_mesh(&mesh, 0.0).is_err());
        assert!(IndexedMesh::from_mesh(&mesh, f64::NAN).is_err());
    }

    #[test]
    fn from_parts_validates_indices() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(IndexedMesh::from_parts(vertices.clone(), vec![(0, 3)], vec![], vec![]).is_err());
        assert!(
            IndexedMesh::from_parts(vertices, vec![(0, 1)], vec![], vec![[0, 1, 2]]).is_ok()
        );
    }
}
