// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Buffer pooling for chunk ingestion.

use std::sync::Mutex;
use std::time::Instant;

/// Default capacity a fresh buffer is allocated with, and the floor a
/// returned buffer is shrunk back to once it exceeds
/// [`SHRINK_THRESHOLD_MULTIPLE`] times this size.
pub const DEFAULT_CAPACITY: usize = 4 * 1024;

/// A buffer returned to the pool with capacity above this multiple of
/// [`DEFAULT_CAPACITY`] is reallocated at the default size instead of
/// being kept at its oversized capacity, so one large chunk doesn't
/// permanently inflate the pool's working set.
pub const SHRINK_THRESHOLD_MULTIPLE: usize = 2;

/// A pool of reusable `Vec<u8>` buffers.
///
/// `Get` returns a buffer with at least `DEFAULT_CAPACITY` bytes of
/// capacity and zero length, reusing a pooled buffer when one is
/// available. `Put` returns a buffer to the pool, shrinking it first if
/// it grew well past the default size.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    metrics: Mutex<PoolMetrics>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PoolMetrics {
    checkouts: u64,
    checkout_total_nanos: u128,
    grows: u64,
    shrinks: u64,
}

/// Point-in-time counters for pool activity, useful for logging and
/// tests; not wired to any metrics backend directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolSnapshot {
    /// Total number of `get` calls.
    pub checkouts: u64,
    /// Average checkout-to-return duration, in nanoseconds, across all
    /// completed checkouts. Zero if no checkout has completed yet.
    pub avg_checkout_nanos: u128,
    /// Number of times a buffer needed to grow beyond its existing
    /// capacity to satisfy a requested size.
    pub grows: u64,
    /// Number of times a returned buffer was shrunk back to
    /// [`DEFAULT_CAPACITY`] because it exceeded the shrink threshold.
    pub shrinks: u64,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    /// Construct an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            metrics: Mutex::new(PoolMetrics::default()),
        }
    }

    /// Check out a buffer, reusing a pooled one if available. The
    /// returned [`PooledBuffer`] tracks checkout duration and returns
    /// itself to the pool on drop.
    #[must_use]
    pub fn get(&self) -> PooledBuffer<'_> {
        let mut buf = {
            let mut free = self.free.lock().expect("buffer pool mutex poisoned");
            free.pop().unwrap_or_default()
        };
        if buf.capacity() < DEFAULT_CAPACITY {
            buf.reserve(DEFAULT_CAPACITY - buf.capacity());
        }
        buf.clear();
        let mut metrics = self.metrics.lock().expect("buffer pool mutex poisoned");
        metrics.checkouts += 1;
        PooledBuffer {
            pool: self,
            buf: Some(buf),
            checked_out_at: Instant::now(),
        }
    }

    /// Snapshot of current counters.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let metrics = self.metrics.lock().expect("buffer pool mutex poisoned");
        let avg = if metrics.checkouts == 0 {
            0
        } else {
            metrics.checkout_total_nanos / u128::from(metrics.checkouts)
        };
        PoolSnapshot {
            checkouts: metrics.checkouts,
            avg_checkout_nanos: avg,
            grows: metrics.grows,
            shrinks: metrics.shrinks,
        }
    }

    fn put(&self, mut buf: Vec<u8>, checkout_duration_nanos: u128) {
        let grew = buf.capacity() > DEFAULT_CAPACITY;
        let shrink = buf.capacity() > DEFAULT_CAPACITY * SHRINK_THRESHOLD_MULTIPLE;
        if shrink {
            buf = Vec::with_capacity(DEFAULT_CAPACITY);
        } else {
            buf.clear();
        }

        let mut metrics = self.metrics.lock().expect("buffer pool mutex poisoned");
        metrics.checkout_total_nanos += checkout_duration_nanos;
        if grew {
            metrics.grows += 1;
        }
        if shrink {
            metrics.shrinks += 1;
        }
        drop(metrics);

        let mut free = self.free.lock().expect("buffer pool mutex poisoned");
        free.push(buf);
    }
}

/// A buffer checked out from a [`BufferPool`]. Returns itself to the
/// pool when dropped; dropping twice (via an explicit [`PooledBuffer::release`]
/// followed by the destructor) is not possible since `release` consumes
/// `self`.
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buf: Option<Vec<u8>>,
    checked_out_at: Instant,
}

impl PooledBuffer<'_> {
    /// Ensure the buffer has at least `additional` bytes of spare
    /// capacity beyond its current length, growing by exactly that
    /// amount rather than a doubling strategy.
    pub fn reserve_exact(&mut self, additional: usize) {
        if let Some(buf) = &mut self.buf {
            let spare = buf.capacity() - buf.len();
            if spare < additional {
                buf.reserve_exact(additional - spare);
            }
        }
    }

    /// Explicitly release the buffer back to the pool. Equivalent to
    /// dropping, but lets a caller observe the point of return.
    pub fn release(mut self) {
        self.return_to_pool();
    }

    fn return_to_pool(&mut self) {
        if let Some(buf) = self.buf.take() {
            let elapsed = self.checked_out_at.elapsed().as_nanos();
            self.pool.put(buf, elapsed);
        }
    }
}

impl std::ops::Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        self.buf.as_ref().expect("buffer taken before drop")
    }
}

impl std::ops::DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buf.as_mut().expect("buffer taken before drop")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.return_to_pool();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_buffer_with_default_capacity() {
        let pool = BufferPool::new();
        let buf = pool.get();
        assert!(buf.capacity() >= DEFAULT_CAPACITY);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn checked_out_buffer_is_reused_after_drop() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get();
            buf.extend_from_slice(b"hello");
        }
        let buf = pool.get();
        assert_eq!(buf.len(), 0, "reused buffer must be cleared");
        assert_eq!(pool.snapshot().checkouts, 2);
    }

    #[test]
    fn oversized_buffer_shrinks_on_return() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get();
            buf.reserve_exact(DEFAULT_CAPACITY * 3);
        }
        assert_eq!(pool.snapshot().shrinks, 1);
        let buf = pool.get();
        assert!(buf.capacity() < DEFAULT_CAPACITY * SHRINK_THRESHOLD_MULTIPLE);
    }

    #[test]
    fn grow_below_threshold_does_not_shrink() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.get();
            buf.reserve_exact(DEFAULT_CAPACITY / 2);
        }
        let snap = pool.snapshot();
        assert_eq!(snap.shrinks, 0);
    }

    #[test]
    fn explicit_release_returns_to_pool() {
        let pool = BufferPool::new();
        let buf = pool.get();
        buf.release();
        assert_eq!(pool.snapshot().checkouts, 1);
        let _buf2 = pool.get();
        assert_eq!(pool.snapshot().checkouts, 2);
    }
}
