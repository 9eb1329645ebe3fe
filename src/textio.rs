//! Text mesh formats.
//!
//! Two bit-compatible formats are supported:
//!
//! * the legacy count-prefixed format (`<vertexCount>` block, then edges,
//!   then quads, all records 1-based and numbered), floats written with six
//!   fractional digits;
//! * the tagged format with `v`/`q`/`t`/`e` records, `#` comments and blank
//!   lines ignored.
//!
//! Readers accept any valid `f64` representation; writers are deterministic
//! so write → read round-trips element-wise.

use std::fmt::Write as _;

use crate::core::Vec3;
use crate::error::MeshError;
use crate::indexed::IndexedMesh;

// ─────────────────────────────────────────────────────────────────────────────
// Legacy format
// ─────────────────────────────────────────────────────────────────────────────

/// Serializes to the legacy count-prefixed format. Triangles have no record
/// type in this format and are not written.
#[must_use]
pub fn write_legacy(mesh: &IndexedMesh) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", mesh.vertex_count());
    for (i, v) in mesh.vertices().iter().enumerate() {
        let _ = writeln!(out, "{} {:.6} {:.6} {:.6}", i + 1, v.x, v.y, v.z);
    }
    let _ = writeln!(out, "{}", mesh.edge_count());
    for (i, (a, b)) in mesh.edges().iter().enumerate() {
        let _ = writeln!(out, "{} {} {}", i + 1, a + 1, b + 1);
    }
    let _ = writeln!(out, "{}", mesh.quad_count());
    for (i, q) in mesh.quads().iter().enumerate() {
        let _ = writeln!(
            out,
            "{} {} {} {} {}",
            i + 1,
            q[0] + 1,
            q[1] + 1,
            q[2] + 1,
            q[3] + 1
        );
    }
    out
}

/// Parses the legacy count-prefixed format.
pub fn read_legacy(text: &str) -> Result<IndexedMesh, MeshError> {
    let mut tokens = text.split_whitespace();

    let vertex_count = parse_count(next_token(&mut tokens, "vertex count")?, "vertex count")?;
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let _index = next_token(&mut tokens, "vertex index")?;
        let x = parse_float(next_token(&mut tokens, "vertex x")?, "vertex x")?;
        let y = parse_float(next_token(&mut tokens, "vertex y")?, "vertex y")?;
        let z = parse_float(next_token(&mut tokens, "vertex z")?, "vertex z")?;
        vertices.push(Vec3::new(x, y, z));
    }

    let edge_count = parse_count(next_token(&mut tokens, "edge count")?, "edge count")?;
    let mut edges = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        let _index = next_token(&mut tokens, "edge index")?;
        let a = parse_index_1_based(next_token(&mut tokens, "edge v0")?, vertex_count, "edge v0")?;
        let b = parse_index_1_based(next_token(&mut tokens, "edge v1")?, vertex_count, "edge v1")?;
        edges.push((a, b));
    }

    let quad_count = parse_count(next_token(&mut tokens, "quad count")?, "quad count")?;
    let mut quads = Vec::with_capacity(quad_count);
    for _ in 0..quad_count {
        let _index = next_token(&mut tokens, "quad index")?;
        let mut q = [0u32; 4];
        for (slot, name) in ["quad v0", "quad v1", "quad v2", "quad v3"].iter().enumerate() {
            q[slot] = parse_index_1_based(next_token(&mut tokens, name)?, vertex_count, name)?;
        }
        quads.push(q);
    }

    IndexedMesh::from_parts(vertices, edges, quads, Vec::new())
}

fn next_token<'a>(
    tokens: &mut std::str::SplitWhitespace<'a>,
    what: &str,
) -> Result<&'a str, MeshError> {
    tokens
        .next()
        .ok_or_else(|| MeshError::InvalidInput(format!("unexpected end of input, expected {what}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tagged format
// ─────────────────────────────────────────────────────────────────────────────

/// Serializes to the tagged `v`/`q`/`t`/`e` format.
#[must_use]
pub fn write_tagged(mesh: &IndexedMesh) -> String {
    let mut out = String::new();
    for v in mesh.vertices() {
        let _ = writeln!(out, "v {:.6} {:.6} {:.6}", v.x, v.y, v.z);
    }
    for q in mesh.quads() {
        let _ = writeln!(out, "q {} {} {} {}", q[0] + 1, q[1] + 1, q[2] + 1, q[3] + 1);
    }
    for t in mesh.triangles() {
        let _ = writeln!(out, "t {} {} {}", t[0] + 1, t[1] + 1, t[2] + 1);
    }
    for (a, b) in mesh.edges() {
        let _ = writeln!(out, "e {} {}", a + 1, b + 1);
    }
    out
}

/// Parses the tagged format. `#` starts a comment; blank lines are ignored.
pub fn read_tagged(text: &str) -> Result<IndexedMesh, MeshError> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut edges: Vec<(u32, u32)> = Vec::new();
    let mut quads: Vec<[u32; 4]> = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let tag = fields.next().unwrap_or_default();
        let rest: Vec<&str> = fields.collect();
        let here = |what: &str| format!("{what} (line {})", line_no + 1);

        match tag {
            "v" => {
                if rest.len() != 3 {
                    return Err(MeshError::InvalidInput(here("vertex record needs 3 values")));
                }
                vertices.push(Vec3::new(
                    parse_float(rest[0], &here("vertex x"))?,
                    parse_float(rest[1], &here("vertex y"))?,
                    parse_float(rest[2], &here("vertex z"))?,
                ));
            }
            "q" => {
                if rest.len() != 4 {
                    return Err(MeshError::InvalidInput(here("quad record needs 4 indices")));
                }
                let mut q = [0u32; 4];
                for (slot, field) in rest.iter().enumerate() {
                    q[slot] = parse_index_1_based(field, usize::MAX, &here("quad index"))?;
                }
                quads.push(q);
            }
            "t" => {
                if rest.len() != 3 {
                    return Err(MeshError::InvalidInput(here(
                        "triangle record needs 3 indices",
                    )));
                }
                let mut t = [0u32; 3];
                for (slot, field) in rest.iter().enumerate() {
                    t[slot] = parse_index_1_based(field, usize::MAX, &here("triangle index"))?;
                }
                triangles.push(t);
            }
            "e" => {
                if rest.len() != 2 {
                    return Err(MeshError::InvalidInput(here("edge record needs 2 indices")));
                }
                edges.push((
                    parse_index_1_based(rest[0], usize::MAX, &here("edge v0"))?,
                    parse_index_1_based(rest[1], usize::MAX, &here("edge v1"))?,
                ));
            }
            other => {
                return Err(MeshError::InvalidInput(here(&format!(
                    "unknown record tag '{other}'"
                ))));
            }
        }
    }

    IndexedMesh::from_parts(vertices, edges, quads, triangles)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_count(field: &str, what: &str) -> Result<usize, MeshError> {
    field
        .parse::<usize>()
        .map_err(|_| MeshError::InvalidInput(format!("{what} is not a valid count: '{field}'")))
}

fn parse_float(field: &str, what: &str) -> Result<f64, MeshError> {
    field
        .parse::<f64>()
        .map_err(|_| MeshError::InvalidInput(format!("{what} is not a valid number: '{field}'")))
}

/// Parses a 1-based vertex reference and converts it to 0-based.
fn parse_index_1_based(field: &str, vertex_count: usize, what: &str) -> Result<u32, MeshError> {
    let value = field
        .parse::<u64>()
        .map_err(|_| MeshError::InvalidInput(format!("{what} is not a valid index: '{field}'")))?;
    if value == 0 {
        return Err(MeshError::IndexError(format!("{what} must be 1-based, got 0")));
    }
    let zero_based = value - 1;
    if vertex_count != usize::MAX && zero_based >= vertex_count as u64 {
        return Err(MeshError::IndexError(format!(
            "{what} {value} exceeds vertex count {vertex_count}"
        )));
    }
    u32::try_from(zero_based)
        .map_err(|_| MeshError::IndexError(format!("{what} {value} does not fit in 32 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mesh() -> IndexedMesh {
        IndexedMesh::from_parts(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![(0, 1), (1, 2), (2, 3), (0, 3)],
            vec![[0, 1, 2, 3]],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn legacy_write_is_bit_stable() {
        let text = write_legacy(&square_mesh());
        let expected = "\
4
1 0.000000 0.000000 0.000000
2 1.000000 0.000000 0.000000
3 1.000000 1.000000 0.000000
4 0.000000 1.000000 0.000000
4
1 1 2
2 2 3
3 3 4
4 1 4
1
1 1 2 3 4
";
        assert_eq!(text, expected);
    }

    #[test]
    fn legacy_round_trip() {
        let original = square_mesh();
        let recovered = read_legacy(&write_legacy(&original)).unwrap();

        assert_eq!(recovered.vertices(), original.vertices());
        assert_eq!(recovered.edges(), original.edges());
        assert_eq!(recovered.quads(), original.quads());
    }

    #[test]
    fn legacy_read_accepts_any_float_syntax() {
        let text = "1\n1 1e-3 2.5E2 -0.0\n0\n0\n";
        let mesh = read_legacy(text).unwrap();
        assert_eq!(mesh.vertices()[0], Vec3::new(1e-3, 250.0, -0.0));
    }

    #[test]
    fn legacy_rejects_out_of_range_indices() {
        let text = "2\n1 0 0 0\n2 1 1 1\n1\n1 1 3\n0\n";
        assert!(read_legacy(text).is_err());
    }

    #[test]
    fn legacy_rejects_truncated_input() {
        assert!(read_legacy("3\n1 0 0 0\n").is_err());
    }

    #[test]
    fn tagged_round_trip() {
        let original = IndexedMesh::from_parts(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
            vec![(0, 1), (1, 4)],
            vec![[0, 1, 2, 3]],
            vec![[1, 4, 2]],
        )
        .unwrap();
        let recovered = read_tagged(&write_tagged(&original)).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn tagged_ignores_comments_and_blank_lines() {
        let text = "\
# a cap mesh
v 0 0 0
v 1 0 0   # inline comment

v 0.5 1 0
t 1 2 3
";
        let mesh = read_tagged(text).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangles()[0], [0, 1, 2]);
    }

    #[test]
    fn tagged_rejects_unknown_tags() {
        assert!(read_tagged("x 1 2 3\n").is_err());
    }

    #[test]
    fn tagged_rejects_forward_references() {
        // Face references a vertex that is never declared.
        assert!(read_tagged("v 0 0 0\nt 1 2 3\n").is_err());
    }
}
