//! Meshing options, validation, and complexity estimation.
//!
//! [`MesherOptions`] is built through [`MesherOptionsBuilder`], which
//! aggregates every violation into a single descriptive failure instead of
//! stopping at the first. The value objects ([`EdgeLength`], [`Tolerance`])
//! enforce their own bounds at construction, so a successfully built option
//! set is valid by construction and [`MesherOptions::validate`] is a pure,
//! idempotent re-check of the cross-field rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{EdgeLength, Tolerance};
use crate::error::MeshError;
use crate::structure::PrismStructureDefinition;

/// Largest accepted refinement band width.
pub const MAX_REFINE_BAND: f64 = 1e4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MesherOptions {
    pub target_edge_length_xy: EdgeLength,
    pub target_edge_length_z: EdgeLength,
    pub generate_bottom_cap: bool,
    pub generate_top_cap: bool,
    pub epsilon: Tolerance,
    pub target_edge_length_xy_near_holes: Option<EdgeLength>,
    pub hole_refine_band: f64,
    pub target_edge_length_xy_near_segments: Option<EdgeLength>,
    pub segment_refine_band: f64,
    pub min_cap_quad_quality: f64,
    pub output_rejected_cap_triangles: bool,
}

impl Default for MesherOptions {
    fn default() -> Self {
        Self {
            target_edge_length_xy: EdgeLength::new_unchecked(1.0),
            target_edge_length_z: EdgeLength::new_unchecked(1.0),
            generate_bottom_cap: true,
            generate_top_cap: true,
            epsilon: Tolerance::DEFAULT,
            target_edge_length_xy_near_holes: None,
            hole_refine_band: 0.0,
            target_edge_length_xy_near_segments: None,
            segment_refine_band: 0.0,
            min_cap_quad_quality: 0.3,
            output_rejected_cap_triangles: false,
        }
    }
}

impl MesherOptions {
    #[must_use]
    pub fn builder() -> MesherOptionsBuilder {
        MesherOptionsBuilder::default()
    }

    /// Pure cross-field validation. Repeated calls yield identical results;
    /// an option set built through the builder always passes.
    pub fn validate(&self) -> Result<(), MeshError> {
        let mut violations = Vec::new();
        collect_cross_field_violations(
            self.target_edge_length_xy.value(),
            self.target_edge_length_xy_near_holes.map(EdgeLength::value),
            self.hole_refine_band,
            self.target_edge_length_xy_near_segments
                .map(EdgeLength::value),
            self.segment_refine_band,
            self.min_cap_quad_quality,
            &mut violations,
        );
        fail_on_violations(violations)
    }
}

fn collect_cross_field_violations(
    base_xy: f64,
    near_holes: Option<f64>,
    hole_band: f64,
    near_segments: Option<f64>,
    segment_band: f64,
    min_quality: f64,
    violations: &mut Vec<String>,
) {
    if let Some(v) = near_holes {
        if v > base_xy {
            violations.push(format!(
                "target_edge_length_xy_near_holes ({v}) must not exceed target_edge_length_xy ({base_xy})"
            ));
        }
    }
    if let Some(v) = near_segments {
        if v > base_xy {
            violations.push(format!(
                "target_edge_length_xy_near_segments ({v}) must not exceed target_edge_length_xy ({base_xy})"
            ));
        }
    }
    for (name, band) in [
        ("hole_refine_band", hole_band),
        ("segment_refine_band", segment_band),
    ] {
        if !band.is_finite() || band < 0.0 || band > MAX_REFINE_BAND {
            violations.push(format!(
                "{name} must be finite, non-negative and at most {MAX_REFINE_BAND:e}, got {band}"
            ));
        }
    }
    if min_quality.is_nan() || !(0.0..=1.0).contains(&min_quality) {
        violations.push(format!(
            "min_cap_quad_quality must be within [0, 1], got {min_quality}"
        ));
    }
}

fn fail_on_violations(violations: Vec<String>) -> Result<(), MeshError> {
    match violations.len() {
        0 => Ok(()),
        1 => Err(MeshError::InvalidInput(violations.into_iter().next().unwrap())),
        _ => Err(MeshError::MultipleErrors(violations.join("; "))),
    }
}

/// Builder collecting raw values; `build` validates everything at once.
#[derive(Debug, Clone)]
pub struct MesherOptionsBuilder {
    target_edge_length_xy: f64,
    target_edge_length_z: f64,
    generate_bottom_cap: bool,
    generate_top_cap: bool,
    epsilon: f64,
    target_edge_length_xy_near_holes: Option<f64>,
    hole_refine_band: f64,
    target_edge_length_xy_near_segments: Option<f64>,
    segment_refine_band: f64,
    min_cap_quad_quality: f64,
    output_rejected_cap_triangles: bool,
}

impl Default for MesherOptionsBuilder {
    fn default() -> Self {
        Self {
            target_edge_length_xy: 1.0,
            target_edge_length_z: 1.0,
            generate_bottom_cap: true,
            generate_top_cap: true,
            epsilon: 1e-9,
            target_edge_length_xy_near_holes: None,
            hole_refine_band: 0.0,
            target_edge_length_xy_near_segments: None,
            segment_refine_band: 0.0,
            min_cap_quad_quality: 0.3,
            output_rejected_cap_triangles: false,
        }
    }
}

impl MesherOptionsBuilder {
    #[must_use]
    pub fn target_edge_length_xy(mut self, value: f64) -> Self {
        self.target_edge_length_xy = value;
        self
    }

    #[must_use]
    pub fn target_edge_length_z(mut self, value: f64) -> Self {
        self.target_edge_length_z = value;
        self
    }

    #[must_use]
    pub fn generate_bottom_cap(mut self, value: bool) -> Self {
        self.generate_bottom_cap = value;
        self
    }

    #[must_use]
    pub fn generate_top_cap(mut self, value: bool) -> Self {
        self.generate_top_cap = value;
        self
    }

    #[must_use]
    pub fn epsilon(mut self, value: f64) -> Self {
        self.epsilon = value;
        self
    }

    #[must_use]
    pub fn target_edge_length_xy_near_holes(mut self, value: f64) -> Self {
        self.target_edge_length_xy_near_holes = Some(value);
        self
    }

    #[must_use]
    pub fn hole_refine_band(mut self, value: f64) -> Self {
        self.hole_refine_band = value;
        self
    }

    #[must_use]
    pub fn target_edge_length_xy_near_segments(mut self, value: f64) -> Self {
        self.target_edge_length_xy_near_segments = Some(value);
        self
    }

    #[must_use]
    pub fn segment_refine_band(mut self, value: f64) -> Self {
        self.segment_refine_band = value;
        self
    }

    #[must_use]
    pub fn min_cap_quad_quality(mut self, value: f64) -> Self {
        self.min_cap_quad_quality = value;
        self
    }

    #[must_use]
    pub fn output_rejected_cap_triangles(mut self, value: bool) -> Self {
        self.output_rejected_cap_triangles = value;
        self
    }

    /// Validates every field and cross-field rule, aggregating all
    /// violations into one failure.
    pub fn build(self) -> Result<MesherOptions, MeshError> {
        let mut violations = Vec::new();

        check_edge_length("target_edge_length_xy", self.target_edge_length_xy, &mut violations);
        check_edge_length("target_edge_length_z", self.target_edge_length_z, &mut violations);
        if let Some(v) = self.target_edge_length_xy_near_holes {
            check_edge_length("target_edge_length_xy_near_holes", v, &mut violations);
        }
        if let Some(v) = self.target_edge_length_xy_near_segments {
            check_edge_length("target_edge_length_xy_near_segments", v, &mut violations);
        }
        if let Err(e) = Tolerance::new(self.epsilon) {
            violations.push(format!("epsilon: {e}"));
        }

        collect_cross_field_violations(
            self.target_edge_length_xy,
            self.target_edge_length_xy_near_holes,
            self.hole_refine_band,
            self.target_edge_length_xy_near_segments,
            self.segment_refine_band,
            self.min_cap_quad_quality,
            &mut violations,
        );

        fail_on_violations(violations)?;

        // Everything was just validated; these conversions cannot fail now.
        Ok(MesherOptions {
            target_edge_length_xy: EdgeLength::new(self.target_edge_length_xy)?,
            target_edge_length_z: EdgeLength::new(self.target_edge_length_z)?,
            generate_bottom_cap: self.generate_bottom_cap,
            generate_top_cap: self.generate_top_cap,
            epsilon: Tolerance::new(self.epsilon)?,
            target_edge_length_xy_near_holes: self
                .target_edge_length_xy_near_holes
                .map(EdgeLength::new)
                .transpose()?,
            hole_refine_band: self.hole_refine_band,
            target_edge_length_xy_near_segments: self
                .target_edge_length_xy_near_segments
                .map(EdgeLength::new)
                .transpose()?,
            segment_refine_band: self.segment_refine_band,
            min_cap_quad_quality: self.min_cap_quad_quality,
            output_rejected_cap_triangles: self.output_rejected_cap_triangles,
        })
    }
}

fn check_edge_length(name: &str, value: f64, violations: &mut Vec<String>) {
    if let Err(e) = EdgeLength::new(value) {
        violations.push(format!("{name}: {e}"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Complexity classification & estimation
// ─────────────────────────────────────────────────────────────────────────────

/// Size class of a structure, from the total footprint + hole vertex count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeshingComplexity {
    Trivial,
    Simple,
    Moderate,
    Complex,
    Extreme,
}

impl MeshingComplexity {
    #[must_use]
    pub const fn classify(total_vertex_count: usize) -> Self {
        match total_vertex_count {
            0..=9 => Self::Trivial,
            10..=49 => Self::Simple,
            50..=199 => Self::Moderate,
            200..=999 => Self::Complex,
            _ => Self::Extreme,
        }
    }

    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Trivial => 0,
            Self::Simple => 1,
            Self::Moderate => 2,
            Self::Complex => 3,
            Self::Extreme => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshingComplexityEstimate {
    pub estimated_quad_count: usize,
    pub estimated_triangle_count: usize,
    pub estimated_peak_memory_bytes: usize,
    pub estimated_compute_time: Duration,
    pub recommended_parallelism: usize,
    pub complexity: MeshingComplexity,
    pub hints: Vec<String>,
}

/// Total footprint + hole vertex count used for classification.
#[must_use]
pub(crate) fn structure_vertex_count(structure: &PrismStructureDefinition) -> usize {
    structure.footprint().vertex_count()
        + structure
            .holes()
            .iter()
            .map(crate::polygon::Polygon2D::vertex_count)
            .sum::<usize>()
}

/// Detailed up-front cost estimate for a single structure.
#[must_use]
pub fn estimate_complexity(
    structure: &PrismStructureDefinition,
    options: &MesherOptions,
) -> MeshingComplexityEstimate {
    let total = structure_vertex_count(structure);
    let complexity = MeshingComplexity::classify(total);

    let internal = structure.internal_surfaces().len();
    let estimated_quad_count = (total as f64).mul_add(1.5, internal as f64 * 10.0).floor() as usize;
    let estimated_triangle_count = ((total as f64 * 0.3).floor() as usize).max(1);
    let estimated_peak_memory_bytes = (estimated_quad_count + estimated_triangle_count) * 160;

    let estimated_compute_time = match complexity {
        MeshingComplexity::Trivial => Duration::from_micros(80),
        MeshingComplexity::Simple => Duration::from_micros(240),
        MeshingComplexity::Moderate => Duration::from_micros(800),
        MeshingComplexity::Complex => Duration::from_millis(4),
        MeshingComplexity::Extreme => Duration::from_millis(16),
    };

    let recommended_parallelism = if complexity >= MeshingComplexity::Complex {
        rayon::current_num_threads().min(4).max(1)
    } else {
        1
    };

    let mut hints = Vec::new();
    if total >= 1000 {
        hints.push(format!(
            "footprint and holes total {total} vertices; consider simplifying the outline"
        ));
    }
    if structure.holes().len() >= 8 {
        hints.push(format!(
            "{} holes present; cap generation will be dominated by hole handling",
            structure.holes().len()
        ));
    }
    if internal > 0 {
        hints.push(format!("{internal} internal surface(s) add extra cap passes"));
    }
    if options.target_edge_length_xy_near_holes.is_some() && structure.holes().is_empty() {
        hints.push("hole refinement is configured but the structure has no holes".into());
    }
    if complexity >= MeshingComplexity::Complex {
        hints.push(format!(
            "complexity {complexity:?}; batch meshing with parallelism {recommended_parallelism} recommended"
        ));
    }

    MeshingComplexityEstimate {
        estimated_quad_count,
        estimated_triangle_count,
        estimated_peak_memory_bytes,
        estimated_compute_time,
        recommended_parallelism,
        complexity,
        hints,
    }
}
