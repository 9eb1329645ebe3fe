//! Quad adjacency over an indexed mesh.
//!
//! Two quads are neighbors iff they share an undirected edge. The table
//! stores, per quad, the neighbor index at each of the four edge slots
//! (−1 when absent). Edges incident to exactly one quad are boundary edges;
//! edges incident to more than two quads are recorded as non-manifold and
//! leave the affected slots unset.

use std::collections::HashMap;

use crate::indexed::IndexedMesh;

/// No neighbor at this edge slot.
pub const NO_NEIGHBOR: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshAdjacency {
    neighbors: Vec<[i32; 4]>,
    boundary_edges: Vec<(u32, u32)>,
    non_manifold_edges: Vec<(u32, u32)>,
}

impl MeshAdjacency {
    /// Builds the adjacency tables from the quads of an indexed mesh.
    #[must_use]
    pub fn build(mesh: &IndexedMesh) -> Self {
        let quads = mesh.quads();

        // Undirected edge → incident (quad, slot) pairs, first-seen order.
        let mut edge_order: Vec<(u32, u32)> = Vec::new();
        let mut incidence: HashMap<(u32, u32), Vec<(usize, usize)>> = HashMap::new();
        for (quad_index, quad) in quads.iter().enumerate() {
            for slot in 0..4 {
                let a = quad[slot];
                let b = quad[(slot + 1) % 4];
                let key = if a <= b { (a, b) } else { (b, a) };
                let entry = incidence.entry(key).or_default();
                if entry.is_empty() {
                    edge_order.push(key);
                }
                entry.push((quad_index, slot));
            }
        }

        let mut neighbors = vec![[NO_NEIGHBOR; 4]; quads.len()];
        let mut boundary_edges = Vec::new();
        let mut non_manifold_edges = Vec::new();

        for key in edge_order {
            let incident = &incidence[&key];
            match incident.as_slice() {
                [_] => boundary_edges.push(key),
                [(q1, s1), (q2, s2)] => {
                    neighbors[*q1][*s1] = *q2 as i32;
                    neighbors[*q2][*s2] = *q1 as i32;
                }
                _ => non_manifold_edges.push(key),
            }
        }

        Self {
            neighbors,
            boundary_edges,
            non_manifold_edges,
        }
    }

    /// Per-quad neighbor indices, one entry per edge slot.
    #[must_use]
    pub fn neighbors(&self) -> &[[i32; 4]] {
        &self.neighbors
    }

    /// Edges incident to exactly one quad.
    #[must_use]
    pub fn boundary_edges(&self) -> &[(u32, u32)] {
        &self.boundary_edges
    }

    /// Edges incident to more than two quads.
    #[must_use]
    pub fn non_manifold_edges(&self) -> &[(u32, u32)] {
        &self.non_manifold_edges
    }
}
