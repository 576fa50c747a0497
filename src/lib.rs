//! clockpool - A page buffer manager with CLOCK (second-chance) replacement.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            clockpool                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │       SharedBufferManager + PinnedPage (buffer/)         │   │
//! │  │           one mutex, pins released on drop               │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                BufferManager (buffer/)                   │   │
//! │  │   Frame table + Page pool + Page index + ClockReplacer   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │      PagedFile: DiskFile | MemFile, Page + PageHeader    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, FileId, Error, config)
//! - [`buffer`] - The buffer manager and CLOCK replacement
//! - [`storage`] - Paged files and page formats
//!
//! # Quick Start
//! ```no_run
//! use clockpool::{BufferManager, DiskFile, FileHandle};
//!
//! let file = FileHandle::new(DiskFile::open_or_create("my_table.db")?);
//! let mut bpm = BufferManager::new(64)?;
//!
//! let (page_id, page) = bpm.alloc_page(&file)?;
//! page.as_mut_slice()[..5].copy_from_slice(b"hello");
//! bpm.unpin_page(&file, page_id, true)?;
//!
//! bpm.flush_file(&file)?;
//! # Ok::<(), clockpool::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BufferConfig, DEFAULT_POOL_SIZE, PAGE_SIZE};
pub use common::{Error, ErrorKind, FileId, FrameId, PageId, Result};

pub use buffer::{
    BufferManager, BufferStats, FrameState, PinnedPage, PoolSnapshot, SharedBufferManager,
};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{DiskFile, FileHandle, MemFile, PagedFile};
