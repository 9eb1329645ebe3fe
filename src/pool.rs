//! Bounded scratch-buffer pools.
//!
//! Cap tessellation rents point and index buffers around each computation
//! instead of reallocating them. Returned buffers are cleared before reuse
//! and only retained while their capacity stays under a fixed cap, so the
//! pool cannot grow without bound. Rentals are recorded in the process-wide
//! counters to expose a pool hit rate.

use std::sync::Mutex;

use crate::counters;

/// Retain at most this many buffers per pool.
const MAX_POOLED: usize = 16;

/// Drop returned buffers whose capacity exceeds this element count.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// A bounded stack of reusable `Vec<T>` scratch buffers.
#[derive(Debug)]
pub(crate) struct BufferPool<T> {
    items: Mutex<Vec<Vec<T>>>,
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BufferPool<T> {
    pub(crate) const fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Rents a cleared buffer, reusing a pooled one when available.
    pub(crate) fn take(&self) -> Vec<T> {
        let pooled = self.items.lock().ok().and_then(|mut items| items.pop());
        match pooled {
            Some(buffer) => {
                counters::record_pool_hit();
                buffer
            }
            None => {
                counters::record_pool_miss();
                Vec::new()
            }
        }
    }

    /// Returns a buffer to the pool. Oversized buffers are dropped and the
    /// pool never holds more than `MAX_POOLED` entries.
    pub(crate) fn give(&self, mut buffer: Vec<T>) {
        buffer.clear();
        if buffer.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        if let Ok(mut items) = self.items.lock() {
            if items.len() < MAX_POOLED {
                items.push(buffer);
            }
        }
    }
}
