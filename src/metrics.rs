//! Opt-in timing hooks for the meshing engine.
//!
//! Timing is only collected when the `engine_metrics` feature is enabled;
//! otherwise every call compiles to a no-op. The orchestrator wraps each
//! phase with [`MeshMetrics::time`] and logs the report at debug level when
//! one is available.

/// Categories for timing the phases of one meshing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Z-level set construction.
    ZLevels,
    /// Side-face quad emission for all loops.
    SideFaces,
    /// Cap tessellation and pairing, internal surfaces included.
    Caps,
    /// Auxiliary point and segment transfer.
    Auxiliary,
    /// Indexed-mesh construction.
    Indexing,
    /// Adjacency table construction.
    Adjacency,
}

/// Cumulative nanoseconds per phase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MeshTimingReport {
    pub z_levels_ns: u64,
    pub side_faces_ns: u64,
    pub caps_ns: u64,
    pub auxiliary_ns: u64,
    pub indexing_ns: u64,
    pub adjacency_ns: u64,
}

impl MeshTimingReport {
    /// Total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.z_levels_ns
            .saturating_add(self.side_faces_ns)
            .saturating_add(self.caps_ns)
            .saturating_add(self.auxiliary_ns)
            .saturating_add(self.indexing_ns)
            .saturating_add(self.adjacency_ns)
    }
}

/// Per-operation timing accumulator; a no-op unless `engine_metrics` is on.
#[derive(Debug, Default)]
pub struct MeshMetrics {
    #[cfg(feature = "engine_metrics")]
    report: MeshTimingReport,
}

impl MeshMetrics {
    /// Resets all counters to zero.
    pub fn begin(&mut self) {
        #[cfg(feature = "engine_metrics")]
        {
            self.report = MeshTimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` when metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<MeshTimingReport> {
        #[cfg(feature = "engine_metrics")]
        {
            Some(self.report.clone())
        }
        #[cfg(not(feature = "engine_metrics"))]
        {
            None
        }
    }

    /// Times `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(feature = "engine_metrics")]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = match bucket {
                TimingBucket::ZLevels => &mut self.report.z_levels_ns,
                TimingBucket::SideFaces => &mut self.report.side_faces_ns,
                TimingBucket::Caps => &mut self.report.caps_ns,
                TimingBucket::Auxiliary => &mut self.report.auxiliary_ns,
                TimingBucket::Indexing => &mut self.report.indexing_ns,
                TimingBucket::Adjacency => &mut self.report.adjacency_ns,
            };
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(feature = "engine_metrics"))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_returns_closure_result() {
        let mut metrics = MeshMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Caps, || 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn report_total() {
        let mut report = MeshTimingReport::default();
        report.caps_ns = 1000;
        report.side_faces_ns = 500;
        assert_eq!(report.total_ns(), 1500);
    }

    #[test]
    fn begin_and_end_do_not_panic() {
        let mut metrics = MeshMetrics::default();
        metrics.begin();
        let _ = metrics.end();
    }
}
