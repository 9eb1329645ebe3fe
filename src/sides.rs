//! Side-face quad generation.
//!
//! Each loop edge is split into `h_div` horizontal sub-edges at the target
//! XY edge length; every (horizontal sub-edge × vertical span) cell yields
//! exactly one quad. Emission order is strictly deterministic: edge index,
//! then horizontal index, then vertical index.

use crate::core::{Vec2, Vec3};
use crate::error::MeshError;
use crate::mesh::Quad;

/// Number of horizontal sub-edges for an edge of the given length.
#[must_use]
pub fn horizontal_divisions(edge_length: f64, target_xy: f64) -> usize {
    ((edge_length / target_xy).ceil() as usize).max(1)
}

/// Total number of side quads a loop will produce for the given Z-level set.
#[must_use]
pub fn expected_side_quad_count(loop_points: &[Vec2], z_levels: &[f64], target_xy: f64) -> usize {
    let spans = z_levels.len().saturating_sub(1);
    let n = loop_points.len();
    let mut total = 0;
    for i in 0..n {
        let a = loop_points[i];
        let b = loop_points[(i + 1) % n];
        total += horizontal_divisions((b - a).length(), target_xy);
    }
    total * spans
}

/// Emits the side quads of one loop through `sink`, in deterministic order.
///
/// `outward` selects the winding: `true` keeps the (00, 01, 11, 10) corner
/// order, `false` inverts it so the face normal flips. The sink may abort
/// emission early (e.g. on cancellation) by returning an error.
pub fn emit_side_quads(
    loop_points: &[Vec2],
    z_levels: &[f64],
    target_xy: f64,
    outward: bool,
    sink: &mut dyn FnMut(Quad) -> Result<(), MeshError>,
) -> Result<(), MeshError> {
    let n = loop_points.len();
    if n < 3 || z_levels.len() < 2 {
        return Ok(());
    }

    for i in 0..n {
        let a = loop_points[i];
        let b = loop_points[(i + 1) % n];
        let h_div = horizontal_divisions((b - a).length(), target_xy);

        for h in 0..h_div {
            let t0 = h as f64 / h_div as f64;
            let t1 = (h + 1) as f64 / h_div as f64;
            let p0 = a.lerp(b, t0);
            let p1 = a.lerp(b, t1);

            for span in z_levels.windows(2) {
                let (z_lo, z_hi) = (span[0], span[1]);
                let c00 = Vec3::from_xy(p0, z_lo);
                let c01 = Vec3::from_xy(p1, z_lo);
                let c11 = Vec3::from_xy(p1, z_hi);
                let c10 = Vec3::from_xy(p0, z_hi);
                let quad = if outward {
                    Quad::new([c00, c01, c11, c10])
                } else {
                    Quad::new([c00, c10, c11, c01])
                };
                sink(quad)?;
            }
        }
    }
    Ok(())
}

/// Convenience wrapper collecting the quads of one loop into a vector.
#[must_use]
pub fn side_quads_for_loop(
    loop_points: &[Vec2],
    z_levels: &[f64],
    target_xy: f64,
    outward: bool,
) -> Vec<Quad> {
    let mut quads = Vec::with_capacity(expected_side_quad_count(loop_points, z_levels, target_xy));
    let mut sink = |quad: Quad| {
        quads.push(quad);
        Ok(())
    };
    // The sink never fails.
    let _ = emit_side_quads(loop_points, z_levels, target_xy, outward, &mut sink);
    quads
}
