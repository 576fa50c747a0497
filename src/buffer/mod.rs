//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between storage engines
//! and paged files. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferManager`] - The page cache
//! - [`frame`] - Frame table: per-frame metadata
//! - [`page_pool`] - Frame contents
//! - [`page_index`] - `(file, page) → frame` lookup
//! - [`replacer`] - CLOCK victim selection
//! - [`SharedBufferManager`] / [`PinnedPage`] - Mutex-wrapped manager and RAII pins
//! - [`BufferStats`] / [`PoolSnapshot`] - Counters and diagnostics

mod buffer_manager;
pub mod frame;
pub mod page_index;
pub mod page_pool;
pub mod replacer;
mod shared;
mod snapshot;
mod stats;

pub use buffer_manager::BufferManager;
pub use shared::{PinnedPage, SharedBufferManager};
pub use snapshot::{FrameState, PoolSnapshot};
pub use stats::BufferStats;
