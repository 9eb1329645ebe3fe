//! Prism meshing orchestrator.
//!
//! [`Mesher`] drives the full pipeline for one structure: option validation,
//! Z-level construction, side-face emission for the footprint and every
//! hole, cap generation, and auxiliary geometry transfer. Batch meshing
//! fans independent structures out across a bounded rayon pool and returns
//! results in input order. Cancellation is observed at every phase boundary
//! and at bounded intervals inside the side-quad loop; it always surfaces
//! as `Meshing.Cancelled`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::caps::{CapMeshing, DefaultCapMesher};
use crate::counters::{self, PerformanceStatistics};
use crate::error::MeshError;
use crate::mesh::{Mesh, Quad};
use crate::metrics::{MeshMetrics, TimingBucket};
use crate::options::{
    MesherOptions, MeshingComplexity, MeshingComplexityEstimate, estimate_complexity,
    structure_vertex_count,
};
use crate::sides::{emit_side_quads, expected_side_quad_count};
use crate::structure::PrismStructureDefinition;
use crate::zlevels::build_z_levels;

/// Cancellation is polled every this many emitted side quads.
const CANCEL_CHECK_INTERVAL: usize = 10;

/// Periodic progress is reported every this many emitted side quads.
const PROGRESS_INTERVAL: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation & progress
// ─────────────────────────────────────────────────────────────────────────────

/// Shared cancellation flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A progress report emitted at phase boundaries and periodically while
/// side quads are generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub operation: String,
    /// Overall completion in [0, 1].
    pub percentage: f64,
    pub processed: usize,
    pub total: usize,
    pub eta: Option<Duration>,
    pub status: Option<String>,
}

/// Receiver for progress events. Implementations must tolerate concurrent
/// calls from batch workers.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

// ─────────────────────────────────────────────────────────────────────────────
// Mesher
// ─────────────────────────────────────────────────────────────────────────────

pub struct Mesher {
    cap_mesher: Arc<dyn CapMeshing>,
}

impl Mesher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cap_mesher: Arc::new(DefaultCapMesher::new()),
        }
    }

    /// Injects a cap meshing strategy; everything else stays default.
    #[must_use]
    pub fn with_cap_mesher(cap_mesher: Arc<dyn CapMeshing>) -> Self {
        Self { cap_mesher }
    }

    /// Meshes one structure synchronously.
    pub fn mesh(
        &self,
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
    ) -> Result<Mesh, MeshError> {
        mesh_structure(self.cap_mesher.as_ref(), structure, options, None, None)
    }

    /// Cancel-aware variant. Trivial structures run inline; larger ones are
    /// offloaded to the shared worker pool.
    pub fn mesh_cancellable(
        &self,
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
        cancel: &CancellationToken,
    ) -> Result<Mesh, MeshError> {
        if cancel.is_cancelled() {
            return Err(MeshError::Cancelled);
        }
        let complexity = MeshingComplexity::classify(structure_vertex_count(structure));
        if complexity == MeshingComplexity::Trivial {
            return mesh_structure(
                self.cap_mesher.as_ref(),
                structure,
                options,
                None,
                Some(cancel),
            );
        }

        let cap_mesher = Arc::clone(&self.cap_mesher);
        let structure = structure.clone();
        let options = options.clone();
        let cancel = cancel.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        rayon::spawn(move || {
            let result = mesh_structure(
                cap_mesher.as_ref(),
                &structure,
                &options,
                None,
                Some(&cancel),
            );
            let _ = tx.send(result);
        });
        match rx.recv() {
            Ok(result) => result,
            Err(_) => Err(MeshError::UnexpectedError(
                "meshing worker terminated without a result".into(),
            )),
        }
    }

    /// Meshes one structure while reporting progress to `sink`.
    pub fn mesh_with_progress(
        &self,
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Mesh, MeshError> {
        mesh_structure(
            self.cap_mesher.as_ref(),
            structure,
            options,
            Some(sink),
            Some(cancel),
        )
    }

    /// Meshes a batch of independent structures in parallel.
    ///
    /// `max_parallelism` caps the worker count; pass −1 (or any
    /// non-positive value) for automatic sizing. Results come back in input
    /// order. The batch fails fast: a failing worker stops further
    /// structures from starting and the failures are aggregated.
    pub fn mesh_batch(
        &self,
        structures: &[PrismStructureDefinition],
        options: &MesherOptions,
        max_parallelism: i32,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Mesh>, MeshError> {
        if structures.is_empty() {
            return Err(MeshError::EmptyBatch);
        }
        if cancel.is_cancelled() {
            return Err(MeshError::Cancelled);
        }
        options.validate()?;

        let ordinal_sum: usize = structures
            .iter()
            .map(|s| MeshingComplexity::classify(structure_vertex_count(s)).ordinal())
            .sum();
        let requested = if max_parallelism <= 0 {
            rayon::current_num_threads()
        } else {
            max_parallelism as usize
        };
        let effective = requested.max(1).min((ordinal_sum / 4).max(1));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(effective)
            .build()
            .map_err(|e| {
                MeshError::UnexpectedError(format!("failed to build worker pool: {e}"))
            })?;
        log::debug!(
            "batch of {} structures on {effective} worker(s)",
            structures.len()
        );

        let abort = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);
        let total = structures.len();
        let cap_mesher = self.cap_mesher.as_ref();

        // Ok(None) marks a structure skipped after an earlier failure.
        let results: Vec<Result<Option<Mesh>, MeshError>> = pool.install(|| {
            structures
                .par_iter()
                .map(|structure| {
                    if cancel.is_cancelled() {
                        abort.store(true, Ordering::Relaxed);
                        return Err(MeshError::Cancelled);
                    }
                    if abort.load(Ordering::Relaxed) {
                        return Ok(None);
                    }
                    match mesh_structure(cap_mesher, structure, options, None, Some(cancel)) {
                        Ok(mesh) => {
                            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            if let Some(sink) = progress {
                                sink.report(&ProgressEvent {
                                    operation: "Batch".into(),
                                    percentage: done as f64 / total as f64,
                                    processed: done,
                                    total,
                                    eta: None,
                                    status: None,
                                });
                            }
                            Ok(Some(mesh))
                        }
                        Err(e) => {
                            abort.store(true, Ordering::Relaxed);
                            Err(e)
                        }
                    }
                })
                .collect()
        });

        if cancel.is_cancelled() {
            return Err(MeshError::Cancelled);
        }

        let mut meshes = Vec::with_capacity(total);
        let mut failures: Vec<(usize, MeshError)> = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(Some(mesh)) => meshes.push(mesh),
                Ok(None) => {}
                Err(e) => failures.push((index, e)),
            }
        }

        if failures.is_empty() {
            if meshes.len() != total {
                return Err(MeshError::UnexpectedError(
                    "batch workers were skipped without a recorded failure".into(),
                ));
            }
            return Ok(meshes);
        }
        if failures.iter().any(|(_, e)| *e == MeshError::Cancelled) {
            return Err(MeshError::Cancelled);
        }
        if failures.len() == 1 {
            return Err(failures.into_iter().next().unwrap().1);
        }
        let joined = failures
            .iter()
            .map(|(index, e)| format!("structure {index}: {e}"))
            .collect::<Vec<_>>()
            .join("; ");
        Err(MeshError::AggregateError(joined))
    }

    /// Up-front cost estimate for one structure.
    #[must_use]
    pub fn estimate_complexity(
        &self,
        structure: &PrismStructureDefinition,
        options: &MesherOptions,
    ) -> MeshingComplexityEstimate {
        estimate_complexity(structure, options)
    }

    /// Snapshot of the process-wide performance counters.
    #[must_use]
    pub fn live_performance_stats(&self) -> PerformanceStatistics {
        counters::snapshot()
    }
}

impl Default for Mesher {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

fn check_cancel(cancel: Option<&CancellationToken>) -> Result<(), MeshError> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        Err(MeshError::Cancelled)
    } else {
        Ok(())
    }
}

fn report_phase(
    progress: Option<&dyn ProgressSink>,
    operation: &str,
    percentage: f64,
    processed: usize,
    total: usize,
) {
    if let Some(sink) = progress {
        sink.report(&ProgressEvent {
            operation: operation.to_string(),
            percentage,
            processed,
            total,
            eta: None,
            status: None,
        });
    }
}

fn mesh_structure(
    cap_mesher: &dyn CapMeshing,
    structure: &PrismStructureDefinition,
    options: &MesherOptions,
    progress: Option<&dyn ProgressSink>,
    cancel: Option<&CancellationToken>,
) -> Result<Mesh, MeshError> {
    check_cancel(cancel)?;
    options.validate()?;

    let started = Instant::now();
    let mut metrics = MeshMetrics::default();
    metrics.begin();

    report_phase(progress, "Initializing", 0.0, 0, 0);

    let z0 = structure.base_elevation();
    let z1 = structure.top_elevation();
    let z_levels = metrics.time(TimingBucket::ZLevels, || {
        build_z_levels(z0, z1, options, structure)
    });

    check_cancel(cancel)?;

    let target_xy = options.target_edge_length_xy.value();
    let mut total_side = expected_side_quad_count(
        structure.footprint().vertices(),
        &z_levels,
        target_xy,
    );
    for hole in structure.holes() {
        total_side += expected_side_quad_count(hole.vertices(), &z_levels, target_xy);
    }
    report_phase(progress, "Side Faces", 0.1, 0, total_side);

    let mut side_quads: Vec<Quad> = Vec::with_capacity(total_side);
    let mut emitted = 0usize;
    {
        let mut sink = |quad: Quad| -> Result<(), MeshError> {
            side_quads.push(quad);
            emitted += 1;
            if emitted % CANCEL_CHECK_INTERVAL == 0 {
                check_cancel(cancel)?;
            }
            if emitted % PROGRESS_INTERVAL == 0 {
                if let Some(reporter) = progress {
                    let fraction = (emitted as f64 / total_side.max(1) as f64).min(1.0);
                    let eta = if emitted > 0 && total_side > emitted {
                        let per_quad = started.elapsed().as_secs_f64() / emitted as f64;
                        Some(Duration::from_secs_f64(
                            per_quad * (total_side - emitted) as f64,
                        ))
                    } else {
                        None
                    };
                    reporter.report(&ProgressEvent {
                        operation: "Side Faces".into(),
                        percentage: 0.5f64.mul_add(fraction, 0.1),
                        processed: emitted,
                        total: total_side,
                        eta,
                        status: None,
                    });
                }
            }
            Ok(())
        };

        metrics.time(TimingBucket::SideFaces, || -> Result<(), MeshError> {
            emit_side_quads(
                structure.footprint().vertices(),
                &z_levels,
                target_xy,
                true,
                &mut sink,
            )?;
            for hole in structure.holes() {
                check_cancel(cancel)?;
                emit_side_quads(hole.vertices(), &z_levels, target_xy, false, &mut sink)?;
            }
            Ok(())
        })?;
    }
    let mut mesh = Mesh::new().add_quads(side_quads);

    check_cancel(cancel)?;
    report_phase(progress, "Caps", 0.6, emitted, total_side);

    let wants_caps = options.generate_bottom_cap
        || options.generate_top_cap
        || !structure.internal_surfaces().is_empty();
    if wants_caps {
        let caps = metrics.time(TimingBucket::Caps, || {
            cap_mesher.generate_caps(structure, options, z0, z1)
        })?;
        mesh = mesh
            .add_quads(caps.quads.iter().copied())
            .add_triangles(caps.triangles.iter().copied());
    }

    check_cancel(cancel)?;
    report_phase(progress, "Auxiliary", 0.9, emitted, total_side);

    mesh = metrics.time(TimingBucket::Auxiliary, || {
        let mut m = mesh.add_points(structure.geometry().points.iter().copied());
        for segment in &structure.geometry().segments {
            m = m.add_internal_segment(*segment);
        }
        m
    });

    counters::record_meshing_operation();
    counters::record_quads(mesh.quad_count() as u64);
    counters::record_triangles(mesh.triangle_count() as u64);

    report_phase(progress, "Completed", 1.0, emitted, total_side);
    if let Some(report) = metrics.end() {
        log::debug!(
            "meshing timing: {} ns total across {} z-levels",
            report.total_ns(),
            z_levels.len()
        );
    }
    log::debug!(
        "meshed structure: {} quads, {} triangles, {} z-levels",
        mesh.quad_count(),
        mesh.triangle_count(),
        z_levels.len()
    );

    Ok(mesh)
}
