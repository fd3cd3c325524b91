//! Three-tier lock-free buffer pool shared process-wide by the Writer Gate.
//!
//! The source's buffer pool was a single global singleton; this is reproduced
//! deliberately (design notes, "pervasive global singletons") rather than
//! threaded through every call site as a constructor parameter.

use crossbeam::queue::ArrayQueue;
use once_cell::sync::Lazy;

/// Small-tier buffer capacity.
pub const SMALL_TIER: usize = 1024;
/// Medium-tier buffer capacity.
pub const MEDIUM_TIER: usize = 4096;
/// Large-tier buffer capacity; the Writer Gate's threshold for pooling vs.
/// sending the caller's buffer directly.
pub const LARGE_TIER: usize = 16 * 1024;

const SLOTS_PER_TIER: usize = 64;

/// A pooled, tier-sized byte buffer. Returned to its originating tier on
/// drop; callers must not retain aliases after returning it explicitly via
/// [`BufferPool::release`] (the `Drop` impl is the safety net for panics).
pub struct PooledBuffer {
    buf: Vec<u8>,
    tier: usize,
}

impl PooledBuffer {
    /// Mutable access to the underlying buffer, truncated to zero length by
    /// default; callers extend as they fill it.
    pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    /// Immutable access to the currently-filled contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// The tier capacity this buffer was drawn from.
    #[must_use]
    pub const fn tier_capacity(&self) -> usize {
        self.tier
    }
}

/// Three-tier pool of reusable buffers. `get` selects the smallest tier that
/// fits the requested size; pool exhaustion falls back to a fresh heap
/// allocation rather than blocking (the pool is an optimization, not a limit).
pub struct BufferPool {
    small: ArrayQueue<Vec<u8>>,
    medium: ArrayQueue<Vec<u8>>,
    large: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    /// Construct a new, empty pool (slots fill lazily as buffers are returned).
    #[must_use]
    pub fn new() -> Self {
        Self {
            small: ArrayQueue::new(SLOTS_PER_TIER),
            medium: ArrayQueue::new(SLOTS_PER_TIER),
            large: ArrayQueue::new(SLOTS_PER_TIER),
        }
    }

    /// Borrow a buffer capable of holding at least `size_hint` bytes. Payloads
    /// larger than [`LARGE_TIER`] should not go through the pool at all (the
    /// Writer Gate sends those directly).
    #[must_use]
    pub fn get(&self, size_hint: usize) -> PooledBuffer {
        let (tier, queue) = if size_hint <= SMALL_TIER {
            (SMALL_TIER, &self.small)
        } else if size_hint <= MEDIUM_TIER {
            (MEDIUM_TIER, &self.medium)
        } else {
            (LARGE_TIER, &self.large)
        };

        let mut buf = queue.pop().unwrap_or_else(|| Vec::with_capacity(tier));
        buf.clear();
        PooledBuffer { buf, tier }
    }

    /// Return a buffer to its tier, restoring capacity expectations. Drops
    /// the buffer instead of blocking if the tier's slots are full.
    pub fn release(&self, mut buffer: PooledBuffer) {
        buffer.buf.clear();
        let queue = match buffer.tier {
            SMALL_TIER => &self.small,
            MEDIUM_TIER => &self.medium,
            _ => &self.large,
        };
        let _ = queue.push(buffer.buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide singleton pool used by the Writer Gate.
pub static GLOBAL_BUFFER_POOL: Lazy<BufferPool> = Lazy::new(BufferPool::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_smallest_fitting_tier() {
        let pool = BufferPool::new();
        assert_eq!(pool.get(100).tier_capacity(), SMALL_TIER);
        assert_eq!(pool.get(2000).tier_capacity(), MEDIUM_TIER);
        assert_eq!(pool.get(10_000).tier_capacity(), LARGE_TIER);
    }

    #[test]
    fn release_then_get_reuses_allocation() {
        let pool = BufferPool::new();
        let mut buf = pool.get(100);
        buf.as_mut_vec().extend_from_slice(b"hello");
        pool.release(buf);

        let reused = pool.get(100);
        assert!(reused.as_slice().is_empty());
    }

    #[test]
    fn global_pool_is_reachable() {
        let buf = GLOBAL_BUFFER_POOL.get(50);
        assert_eq!(buf.tier_capacity(), SMALL_TIER);
    }
}
