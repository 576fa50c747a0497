//! Error types for clockpool.

use thiserror::Error;

use crate::common::{FileId, FrameId, PageId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by the buffer manager and its file collaborators.
///
/// Every operation returns these synchronously to its direct caller. Nothing
/// is retried internally, and state mutated before the failing step is not
/// rolled back.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a file collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every frame is pinned, so no victim could be found.
    ///
    /// The caller must release a pin and retry.
    #[error("buffer pool exhausted: all {pool_size} frames are pinned")]
    BufferPoolExhausted { pool_size: usize },

    /// Unpin of a page whose pin count is already 0.
    #[error("{page_id} of file {file} is not pinned ({frame_id})")]
    PageNotPinned {
        file: String,
        page_id: PageId,
        frame_id: FrameId,
    },

    /// The operation requires the page to be unpinned.
    #[error("{page_id} of file {file} is still pinned ({frame_id})")]
    PagePinned {
        file: String,
        page_id: PageId,
        frame_id: FrameId,
    },

    /// The page index and the frame table disagree about a frame.
    ///
    /// This indicates a bug in the manager, never caller misuse.
    #[error("bad buffer: {frame_id} (valid: {valid}, dirty: {dirty}, ref_bit: {ref_bit})")]
    BadBuffer {
        frame_id: FrameId,
        valid: bool,
        dirty: bool,
        ref_bit: bool,
    },

    /// No page index entry exists for the key.
    #[error("{page_id} of {file_id} is not in the page index")]
    PageNotFoundInIndex { file_id: FileId, page_id: PageId },

    /// The key is already mapped to a frame.
    #[error("{page_id} of {file_id} is already indexed at {frame_id}")]
    DuplicateIndexEntry {
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
    },

    /// The file has no such page (never allocated, or deleted).
    #[error("invalid page {page_id} in file {file}")]
    InvalidPage { file: String, page_id: PageId },

    /// A page read from disk failed its header or checksum check.
    #[error("corrupted {page_id} in file {file}")]
    Corrupted { file: String, page_id: PageId },

    /// Rejected construction parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Broad classes of failure, for callers that only need to decide what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Every frame pinned. Release a pin and retry.
    ResourceExhaustion,
    /// The caller broke the pin protocol.
    ProtocolViolation,
    /// Internal inconsistency between the index and the frame table.
    ConsistencyViolation,
    /// Failure inside a file collaborator.
    Storage,
    /// Invalid construction parameters.
    Configuration,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BufferPoolExhausted { .. } => ErrorKind::ResourceExhaustion,
            Error::PageNotPinned { .. }
            | Error::PagePinned { .. }
            | Error::PageNotFoundInIndex { .. } => ErrorKind::ProtocolViolation,
            Error::BadBuffer { .. } | Error::DuplicateIndexEntry { .. } => {
                ErrorKind::ConsistencyViolation
            }
            Error::Io(_) | Error::InvalidPage { .. } | Error::Corrupted { .. } => {
                ErrorKind::Storage
            }
            Error::InvalidConfig(_) => ErrorKind::Configuration,
        }
    }
}
