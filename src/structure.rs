//! Prismatic structure definitions.
//!
//! A [`PrismStructureDefinition`] bundles everything a single meshing call
//! needs: the footprint, the elevation extent, holes, constraint segments,
//! interior horizontal surfaces and free-floating auxiliary geometry. Values
//! are immutable; every mutator consumes the definition and returns a new
//! one, so definitions can be shared across threads and batch workers.

use serde::{Deserialize, Serialize};

use crate::core::{Segment2D, Segment3D, Vec3};
use crate::error::MeshError;
use crate::polygon::Polygon2D;

/// A horizontal polygonal surface strictly inside the prism's elevation
/// extent, with optional holes of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalSurface {
    pub outer: Polygon2D,
    pub elevation: f64,
    pub holes: Vec<Polygon2D>,
}

/// Free-floating points and segments carried through to the output mesh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxiliaryGeometry {
    pub points: Vec<Vec3>,
    pub segments: Vec<Segment3D>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismStructureDefinition {
    footprint: Polygon2D,
    base_elevation: f64,
    top_elevation: f64,
    holes: Vec<Polygon2D>,
    constraint_segments: Vec<(Segment2D, f64)>,
    internal_surfaces: Vec<InternalSurface>,
    geometry: AuxiliaryGeometry,
}

impl PrismStructureDefinition {
    /// Creates a structure with the given footprint and elevation extent.
    /// The top elevation must be strictly above the base.
    pub fn new(
        footprint: Polygon2D,
        base_elevation: f64,
        top_elevation: f64,
    ) -> Result<Self, MeshError> {
        if !base_elevation.is_finite() || !top_elevation.is_finite() {
            return Err(MeshError::InvalidInput(
                "base_elevation and top_elevation must be finite".into(),
            ));
        }
        if top_elevation <= base_elevation {
            return Err(MeshError::InvalidInput(format!(
                "top_elevation ({top_elevation}) must be greater than base_elevation ({base_elevation})"
            )));
        }
        Ok(Self {
            footprint,
            base_elevation,
            top_elevation,
            holes: Vec::new(),
            constraint_segments: Vec::new(),
            internal_surfaces: Vec::new(),
            geometry: AuxiliaryGeometry::default(),
        })
    }

    #[must_use]
    pub fn footprint(&self) -> &Polygon2D {
        &self.footprint
    }

    #[must_use]
    pub const fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    #[must_use]
    pub const fn top_elevation(&self) -> f64 {
        self.top_elevation
    }

    #[must_use]
    pub fn holes(&self) -> &[Polygon2D] {
        &self.holes
    }

    #[must_use]
    pub fn constraint_segments(&self) -> &[(Segment2D, f64)] {
        &self.constraint_segments
    }

    #[must_use]
    pub fn internal_surfaces(&self) -> &[InternalSurface] {
        &self.internal_surfaces
    }

    #[must_use]
    pub fn geometry(&self) -> &AuxiliaryGeometry {
        &self.geometry
    }

    /// Returns a new definition with the hole appended.
    #[must_use]
    pub fn with_hole(mut self, hole: Polygon2D) -> Self {
        self.holes.push(hole);
        self
    }

    /// Returns a new definition with a horizontal constraint segment at the
    /// given elevation. The elevation must lie within `[base, top]`.
    pub fn with_constraint_segment(
        mut self,
        segment: Segment2D,
        elevation: f64,
    ) -> Result<Self, MeshError> {
        if !elevation.is_finite()
            || elevation < self.base_elevation
            || elevation > self.top_elevation
        {
            return Err(MeshError::InvalidInput(format!(
                "constraint segment elevation ({elevation}) must lie within [{}, {}]",
                self.base_elevation, self.top_elevation
            )));
        }
        self.constraint_segments.push((segment, elevation));
        Ok(self)
    }

    /// Returns a new definition with an internal surface. Its elevation must
    /// be strictly between the base and top elevations.
    pub fn with_internal_surface(
        mut self,
        outer: Polygon2D,
        elevation: f64,
        holes: Vec<Polygon2D>,
    ) -> Result<Self, MeshError> {
        if !elevation.is_finite()
            || elevation <= self.base_elevation
            || elevation >= self.top_elevation
        {
            return Err(MeshError::InvalidInput(format!(
                "internal surface elevation ({elevation}) must lie strictly within ({}, {})",
                self.base_elevation, self.top_elevation
            )));
        }
        self.internal_surfaces.push(InternalSurface {
            outer,
            elevation,
            holes,
        });
        Ok(self)
    }

    /// Returns a new definition with an auxiliary point.
    #[must_use]
    pub fn with_point(mut self, point: Vec3) -> Self {
        self.geometry.points.push(point);
        self
    }

    /// Returns a new definition with an auxiliary 3D segment.
    #[must_use]
    pub fn with_segment(mut self, segment: Segment3D) -> Self {
        self.geometry.segments.push(segment);
        self
    }
}
