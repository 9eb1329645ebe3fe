//! Elevation (Z-level) set construction.
//!
//! The Z-level set slices the prism into the horizontal bands that bound
//! side quads. It always contains both endpoints, is sorted ascending and
//! epsilon-separated, and folds in every feature elevation that falls
//! strictly inside the extent.

use crate::options::MesherOptions;
use crate::structure::PrismStructureDefinition;

/// Builds the distinct sorted elevation set for `[z0, z1]`.
#[must_use]
pub fn build_z_levels(
    z0: f64,
    z1: f64,
    options: &MesherOptions,
    structure: &PrismStructureDefinition,
) -> Vec<f64> {
    let eps = options.epsilon.value();
    let mut levels = vec![z0, z1];

    let extent = z1 - z0;
    let target_z = options.target_edge_length_z.value();
    if target_z > 0.0 && extent > 0.0 {
        let v_div = ((extent / target_z).ceil() as usize).max(1);
        for k in 1..v_div {
            levels.push(z0 + extent * (k as f64) / (v_div as f64));
        }
    }

    let mut push_interior = |z: f64| {
        if z > z0 + eps && z < z1 - eps {
            levels.push(z);
        }
    };
    for (_, z) in structure.constraint_segments() {
        push_interior(*z);
    }
    for p in &structure.geometry().points {
        push_interior(p.z);
    }
    for s in &structure.geometry().segments {
        push_interior(s.a.z);
        push_interior(s.b.z);
    }
    for surface in structure.internal_surfaces() {
        push_interior(surface.elevation);
    }

    levels.sort_by(f64::total_cmp);

    // Keep the first of any run of values within eps of the previous survivor.
    let mut deduped: Vec<f64> = Vec::with_capacity(levels.len());
    for z in levels {
        match deduped.last() {
            Some(&prev) if (z - prev).abs() <= eps => {}
            _ => deduped.push(z),
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Segment2D, Tolerance, Vec2, Vec3};
    use crate::polygon::Polygon2D;

    fn structure(z0: f64, z1: f64) -> PrismStructureDefinition {
        let footprint = Polygon2D::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(10.0, 0.0),
                Vec2::new(10.0, 6.0),
                Vec2::new(0.0, 6.0),
            ],
            Tolerance::default(),
        )
        .unwrap();
        PrismStructureDefinition::new(footprint, z0, z1).unwrap()
    }

    fn options(target_z: f64) -> MesherOptions {
        MesherOptions::builder()
            .target_edge_length_z(target_z)
            .build()
            .unwrap()
    }

    #[test]
    fn uniform_subdivision() {
        let levels = build_z_levels(0.0, 4.0, &options(1.0), &structure(0.0, 4.0));
        assert_eq!(levels, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn target_larger_than_extent_yields_endpoints_only() {
        let levels = build_z_levels(0.0, 1.0, &options(10.0), &structure(0.0, 1.0));
        assert_eq!(levels, vec![0.0, 1.0]);
    }

    #[test]
    fn feature_levels_are_inserted_when_strictly_interior() {
        let seg = Segment2D::new(Vec2::new(1.0, 1.0), Vec2::new(5.0, 1.0));
        let s = structure(0.0, 4.0)
            .with_constraint_segment(seg, 2.5)
            .unwrap()
            .with_constraint_segment(seg, 0.0) // endpoint, not re-added
            .unwrap()
            .with_point(Vec3::new(1.0, 1.0, 3.25));
        let levels = build_z_levels(0.0, 4.0, &options(2.0), &s);
        assert_eq!(levels, vec![0.0, 2.0, 2.5, 3.25, 4.0]);
    }

    #[test]
    fn internal_surface_elevation_becomes_a_level() {
        let surface = Polygon2D::new(
            vec![
                Vec2::new(1.0, 1.0),
                Vec2::new(3.0, 1.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(1.0, 3.0),
            ],
            Tolerance::default(),
        )
        .unwrap();
        let s = structure(0.0, 4.0)
            .with_internal_surface(surface, 1.7, Vec::new())
            .unwrap();
        let levels = build_z_levels(0.0, 4.0, &options(2.0), &s);
        assert_eq!(levels, vec![0.0, 1.7, 2.0, 4.0]);
    }

    #[test]
    fn near_duplicates_collapse_to_first() {
        let seg = Segment2D::new(Vec2::new(1.0, 1.0), Vec2::new(5.0, 1.0));
        let s = structure(0.0, 4.0)
            .with_constraint_segment(seg, 2.0)
            .unwrap()
            .with_constraint_segment(seg, 2.0 + 1e-12)
            .unwrap();
        let levels = build_z_levels(0.0, 4.0, &options(2.0), &s);
        assert_eq!(levels.len(), 3);
        assert!(levels.windows(2).all(|w| w[1] - w[0] > 1e-10));
    }

    #[test]
    fn levels_are_strictly_increasing_and_bounded() {
        let s = structure(-1.5, 3.5).with_point(Vec3::new(0.0, 0.0, 1.1));
        let levels = build_z_levels(-1.5, 3.5, &options(0.7), &s);
        assert_eq!(*levels.first().unwrap(), -1.5);
        assert_eq!(*levels.last().unwrap(), 3.5);
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }
}
