//! File identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(0);

/// Identifies an open paged file for the lifetime of the process.
///
/// The buffer manager keys its page index on `(FileId, PageId)` instead of
/// on the file object itself, so a frame never needs to compare or hash the
/// file. Every [`FileHandle`](crate::storage::FileHandle) draws a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a FileId from a raw value.
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }

    /// Draw the next process-unique id.
    pub fn next() -> Self {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}
