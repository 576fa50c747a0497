//! Storage layer - paged files and page formats.
//!
//! - [`PagedFile`] - The contract the buffer manager reads and writes through
//! - [`FileHandle`] - Shared handle with a stable [`FileId`](crate::FileId)
//! - [`DiskFile`] - Pages in an OS file, checksummed
//! - [`MemFile`] - Pages in memory
//! - [`page`] - Page types and layouts

mod disk_file;
mod mem_file;
pub mod page;
mod paged_file;

pub use disk_file::DiskFile;
pub use mem_file::MemFile;
pub use paged_file::{FileHandle, PagedFile};
