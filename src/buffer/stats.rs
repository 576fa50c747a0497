//! Buffer pool statistics tracking.

use std::fmt;

/// Counters kept by the buffer manager.
///
/// The manager is single-threaded, so these are plain integers updated in
/// place; `BufferStats` is `Copy` and a copy is a consistent snapshot.
///
/// # Example
/// ```
/// use clockpool::BufferStats;
///
/// let mut stats = BufferStats::default();
/// stats.cache_hits += 3;
/// stats.cache_misses += 1;
/// assert_eq!(stats.hit_rate(), 0.75);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// `read_page` calls served from the pool.
    pub cache_hits: u64,
    /// `read_page` and `alloc_page` calls that loaded from a file.
    pub cache_misses: u64,
    /// Valid frames reclaimed by the clock.
    pub evictions: u64,
    /// Pages read from files.
    pub pages_read: u64,
    /// Pages written back to files, by eviction or flush.
    pub pages_written: u64,
}

impl BufferStats {
    /// Cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for BufferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, reads: {}, writes: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.hit_rate() * 100.0
        )
    }
}
