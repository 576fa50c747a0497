//! Configuration for clockpool.

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every frame in the pool holds exactly one page of this size, and
/// [`DiskFile`](crate::storage::DiskFile) lays pages out at multiples of it.
///
/// # Alignment
/// Pages are aligned to 4096 bytes for efficient Direct I/O (O_DIRECT).
pub const PAGE_SIZE: usize = 4096;

/// Number of frames used when no pool size is given.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Construction parameters for a [`BufferManager`](crate::BufferManager).
///
/// # Example
/// ```
/// use clockpool::BufferConfig;
///
/// let config = BufferConfig::default().with_pool_size(16);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.pool_size, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of frames in the pool. Fixed for the manager's lifetime.
    pub pool_size: usize,
}

impl BufferConfig {
    /// Set the number of frames.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Reject configurations the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfig(
                "pool_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}
