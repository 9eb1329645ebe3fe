//! FastGeoMesh: quad-dominant meshes of straight prismatic solids.
//!
//! A 2D polygonal footprint (optionally with holes) is extruded between two
//! elevations and discretized into side-face quads, top/bottom caps,
//! optional interior horizontal surfaces and auxiliary geometry. The crate
//! is a library for CAD/simulation pipelines; exporters and CLIs live
//! outside of it and consume [`IndexedMesh`].
//!
//! ```ignore
//! use fastgeomesh::{Mesher, MesherOptions, Polygon2D, PrismStructureDefinition, Tolerance, Vec2};
//!
//! let footprint = Polygon2D::new(
//!     vec![
//!         Vec2::new(0.0, 0.0),
//!         Vec2::new(4.0, 0.0),
//!         Vec2::new(4.0, 2.0),
//!         Vec2::new(0.0, 2.0),
//!     ],
//!     Tolerance::default(),
//! )?;
//! let structure = PrismStructureDefinition::new(footprint, 0.0, 1.0)?;
//! let options = MesherOptions::builder().build()?;
//! let mesh = Mesher::new().mesh(&structure, &options)?;
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod adjacency;
mod caps;
mod core;
pub mod counters;
mod error;
mod indexed;
mod mesh;
mod mesher;
mod metrics;
mod options;
mod polygon;
mod pool;
mod proximity;
mod sides;
mod structure;
pub mod textio;
mod zlevels;

pub use adjacency::{MeshAdjacency, NO_NEIGHBOR};
pub use caps::{CapDiagnostics, CapGeometry, CapMeshing, DefaultCapMesher, quad_quality};
pub use self::core::{EdgeLength, Segment2D, Segment3D, Tolerance, Vec2, Vec3};
pub use counters::PerformanceStatistics;
pub use error::MeshError;
pub use indexed::IndexedMesh;
pub use mesh::{Mesh, Quad, Triangle};
pub use mesher::{CancellationToken, Mesher, ProgressEvent, ProgressSink};
pub use metrics::{MeshMetrics, MeshTimingReport, TimingBucket};
pub use options::{
    MesherOptions, MesherOptionsBuilder, MeshingComplexity, MeshingComplexityEstimate,
    estimate_complexity,
};
pub use polygon::{Polygon2D, on_segment, orient, segments_intersect, signed_area, validate_loop};
pub use proximity::{
    SpatialPolygonIndex, distance_point_to_segment, distance_to_loop_boundary, near_any_hole,
    near_any_segment, point_in_polygon,
};
pub use sides::{emit_side_quads, expected_side_quad_count, horizontal_divisions, side_quads_for_loop};
pub use structure::{AuxiliaryGeometry, InternalSurface, PrismStructureDefinition};
pub use zlevels::build_z_levels;
