//! Common types shared across clockpool.
//!
//! - Configuration constants and [`BufferConfig`](config::BufferConfig)
//! - Error types
//! - Identifiers (PageId, FrameId, FileId)

pub mod config;
pub mod error;
mod file_id;
mod frame_id;
mod page_id;

pub use error::{Error, ErrorKind, Result};
pub use file_id::FileId;
pub use frame_id::FrameId;
pub use page_id::PageId;
