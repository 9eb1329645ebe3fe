//! Process-wide performance counters.
//!
//! The engine holds no cross-call mutable state except these counters; all
//! updates are single atomic adds, never locks. [`snapshot`] is the backing
//! store for `Mesher::live_performance_stats`, and [`reset`] exists so test
//! harnesses and long-running hosts can rebase the numbers explicitly.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

struct PerformanceCounters {
    meshing_operations: AtomicU64,
    quads_generated: AtomicU64,
    triangles_generated: AtomicU64,
    pool_hits: AtomicU64,
    pool_misses: AtomicU64,
}

static COUNTERS: PerformanceCounters = PerformanceCounters {
    meshing_operations: AtomicU64::new(0),
    quads_generated: AtomicU64::new(0),
    triangles_generated: AtomicU64::new(0),
    pool_hits: AtomicU64::new(0),
    pool_misses: AtomicU64::new(0),
};

/// Read-only snapshot of the live counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStatistics {
    pub meshing_operations: u64,
    pub quads_generated: u64,
    pub triangles_generated: u64,
    /// Fraction of scratch-buffer rentals served from the pool, in [0, 1].
    pub pool_hit_rate: f64,
}

pub(crate) fn record_meshing_operation() {
    COUNTERS.meshing_operations.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_quads(count: u64) {
    COUNTERS.quads_generated.fetch_add(count, Ordering::Relaxed);
}

pub(crate) fn record_triangles(count: u64) {
    COUNTERS
        .triangles_generated
        .fetch_add(count, Ordering::Relaxed);
}

pub(crate) fn record_pool_hit() {
    COUNTERS.pool_hits.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_pool_miss() {
    COUNTERS.pool_misses.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn snapshot() -> PerformanceStatistics {
    let hits = COUNTERS.pool_hits.load(Ordering::Relaxed);
    let misses = COUNTERS.pool_misses.load(Ordering::Relaxed);
    let total = hits + misses;
    PerformanceStatistics {
        meshing_operations: COUNTERS.meshing_operations.load(Ordering::Relaxed),
        quads_generated: COUNTERS.quads_generated.load(Ordering::Relaxed),
        triangles_generated: COUNTERS.triangles_generated.load(Ordering::Relaxed),
        pool_hit_rate: if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        },
    }
}

/// Resets every counter to zero.
pub fn reset() {
    COUNTERS.meshing_operations.store(0, Ordering::Relaxed);
    COUNTERS.quads_generated.store(0, Ordering::Relaxed);
    COUNTERS.triangles_generated.store(0, Ordering::Relaxed);
    COUNTERS.pool_hits.store(0, Ordering::Relaxed);
    COUNTERS.pool_misses.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_updates() {
        // Counters are process-wide; work with deltas so parallel tests
        // cannot interfere.
        let before = snapshot();
        record_meshing_operation();
        record_quads(12);
        record_triangles(3);
        let after = snapshot();

        assert!(after.meshing_operations >= before.meshing_operations + 1);
        assert!(after.quads_generated >= before.quads_generated + 12);
        assert!(after.triangles_generated >= before.triangles_generated + 3);
    }

    #[test]
    fn hit_rate_is_a_fraction() {
        record_pool_hit();
        record_pool_miss();
        let stats = snapshot();
        assert!((0.0..=1.0).contains(&stats.pool_hit_rate));
    }
}
