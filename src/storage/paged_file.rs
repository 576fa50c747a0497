//! The file collaborator contract and its shared handle.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::common::{FileId, PageId, Result};
use crate::storage::page::Page;

/// A file of fixed-size pages, as seen by the buffer manager.
///
/// Implementations own the on-disk (or in-memory) format. Requests for a
/// page that was never allocated, or was deleted, fail with
/// [`Error::InvalidPage`](crate::Error::InvalidPage).
pub trait PagedFile {
    /// Human-readable name used in error messages and snapshots.
    fn name(&self) -> &str;

    /// Read page `page_id` into `buf`, overwriting all of it.
    fn read_page(&mut self, page_id: PageId, buf: &mut Page) -> Result<()>;

    /// Write `page` as the new content of `page_id`.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()>;

    /// Allocate a new zeroed page and return its id.
    ///
    /// Ids of deleted pages may be handed out again.
    fn allocate_page(&mut self) -> Result<PageId>;

    /// Release `page_id` from backing storage.
    fn delete_page(&mut self, page_id: PageId) -> Result<()>;

    /// Ids of every live page, in ascending order.
    fn page_ids(&self) -> Vec<PageId>;
}

/// A cloneable, reference-counted handle to an open [`PagedFile`].
///
/// The handle's [`FileId`] is its identity: clones share it, two handles
/// opened separately never do. Frames hold a clone of the handle so that a
/// dirty page can be written back when it is evicted long after the call
/// that loaded it returned.
///
/// # Example
/// ```
/// use clockpool::storage::{FileHandle, MemFile, PagedFile};
///
/// let file = FileHandle::new(MemFile::new("orders"));
/// let page_id = file.lock().allocate_page().unwrap();
/// assert_eq!(file.lock().page_ids(), vec![page_id]);
/// assert_eq!(file.name(), "orders");
/// ```
#[derive(Clone)]
pub struct FileHandle {
    id: FileId,
    name: Arc<str>,
    inner: Arc<Mutex<dyn PagedFile + Send>>,
}

impl FileHandle {
    /// Wrap an open file, assigning it a fresh [`FileId`].
    ///
    /// Create one handle per underlying file and clone it. Two handles opened
    /// on the same path get different ids, so the pool would cache the same
    /// page twice and each copy could miss the other's writes.
    pub fn new<F>(file: F) -> Self
    where
        F: PagedFile + Send + 'static,
    {
        let name: Arc<str> = Arc::from(file.name());
        Self {
            id: FileId::next(),
            name,
            inner: Arc::new(Mutex::new(file)),
        }
    }

    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the underlying file for direct access.
    pub fn lock(&self) -> MutexGuard<'_, dyn PagedFile + Send> {
        self.inner.lock()
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FileHandle {}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
