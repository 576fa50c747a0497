//! Shared access to one buffer manager, with RAII pins.
//!
//! [`BufferManager`] is single-threaded. [`SharedBufferManager`] puts the
//! whole manager behind one mutex, so the clock sweep, the page index and the
//! frame table are always updated together. [`PinnedPage`] holds one pin and
//! releases it when dropped.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::warn;

use crate::buffer::{BufferManager, BufferStats, PoolSnapshot};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::FileHandle;

/// A [`BufferManager`] that can be cloned across threads.
///
/// # Example
/// ```
/// use clockpool::{BufferManager, FileHandle, MemFile, SharedBufferManager};
///
/// let file = FileHandle::new(MemFile::new("shared.db"));
/// let bpm = SharedBufferManager::new(BufferManager::new(4)?);
///
/// let mut page = bpm.allocate(&file)?;
/// page.write(|p| p.as_mut_slice()[0] = 7)?;
/// let page_id = page.page_id();
/// drop(page); // unpinned, marked dirty
///
/// bpm.flush_file(&file)?;
/// assert_eq!(bpm.fetch(&file, page_id)?.read(|p| p.as_slice()[0])?, 7);
/// # Ok::<(), clockpool::Error>(())
/// ```
#[derive(Clone)]
pub struct SharedBufferManager {
    inner: Arc<Mutex<BufferManager>>,
}

impl SharedBufferManager {
    pub fn new(manager: BufferManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Pin a page, loading it if needed.
    pub fn fetch(&self, file: &FileHandle, page_id: PageId) -> Result<PinnedPage> {
        self.inner.lock().read_page(file, page_id)?;
        Ok(PinnedPage::new(Arc::clone(&self.inner), file.clone(), page_id))
    }

    /// Allocate a new page in `file` and pin it.
    pub fn allocate(&self, file: &FileHandle) -> Result<PinnedPage> {
        let (page_id, _) = self.inner.lock().alloc_page(file)?;
        Ok(PinnedPage::new(Arc::clone(&self.inner), file.clone(), page_id))
    }

    pub fn flush_file(&self, file: &FileHandle) -> Result<()> {
        self.inner.lock().flush_file(file)
    }

    pub fn flush_all(&self) -> Result<()> {
        self.inner.lock().flush_all()
    }

    /// Dispose a page, refusing while any [`PinnedPage`] still holds it.
    ///
    /// # Errors
    /// `Error::PagePinned` if the page is resident and pinned; nothing is
    /// deleted in that case. Otherwise as [`BufferManager::dispose_page`].
    pub fn dispose_page(&self, file: &FileHandle, page_id: PageId) -> Result<()> {
        let mut bpm = self.inner.lock();
        if let Some(frame_id) = bpm.frame_of(file, page_id) {
            if bpm.pin_count(file, page_id).unwrap_or(0) > 0 {
                return Err(Error::PagePinned {
                    file: file.name().to_string(),
                    page_id,
                    frame_id,
                });
            }
        }
        bpm.dispose_page(file, page_id)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn stats(&self) -> BufferStats {
        self.inner.lock().stats()
    }

    /// Lock the manager for a sequence of calls.
    ///
    /// Do not touch a [`PinnedPage`] of the same manager while holding this
    /// guard; the mutex is not reentrant.
    pub fn lock(&self) -> MutexGuard<'_, BufferManager> {
        self.inner.lock()
    }
}

/// One pin on a resident page.
///
/// The pin is released when the guard is dropped, with `dirty = true` if
/// [`write`](PinnedPage::write) was ever called. Use
/// [`release`](PinnedPage::release) to observe unpin errors instead of
/// having them logged.
pub struct PinnedPage {
    manager: Arc<Mutex<BufferManager>>,
    file: FileHandle,
    page_id: PageId,
    dirty: bool,
    released: bool,
}

impl PinnedPage {
    fn new(manager: Arc<Mutex<BufferManager>>, file: FileHandle, page_id: PageId) -> Self {
        Self {
            manager,
            file,
            page_id,
            dirty: false,
            released: false,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    /// Run `f` on the page content.
    pub fn read<R>(&self, f: impl FnOnce(&Page) -> R) -> Result<R> {
        let bpm = self.manager.lock();
        let page = bpm.page(&self.file, self.page_id)?;
        Ok(f(page))
    }

    /// Run `f` on the mutable page content and mark the page dirty.
    pub fn write<R>(&mut self, f: impl FnOnce(&mut Page) -> R) -> Result<R> {
        let mut bpm = self.manager.lock();
        let page = bpm.page_mut(&self.file, self.page_id)?;
        self.dirty = true;
        Ok(f(page))
    }

    /// Release the pin now.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.manager
            .lock()
            .unpin_page(&self.file, self.page_id, self.dirty)
    }
}

impl Drop for PinnedPage {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self
            .manager
            .lock()
            .unpin_page(&self.file, self.page_id, self.dirty)
        {
            warn!(file = self.file.name(), page_id = %self.page_id, %err, "failed to unpin on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemFile;
    use std::thread;

    fn setup(pool_size: usize) -> (SharedBufferManager, FileHandle) {
        let bpm = SharedBufferManager::new(BufferManager::new(pool_size).unwrap());
        (bpm, FileHandle::new(MemFile::new("shared.db")))
    }

    #[test]
    fn test_drop_unpins() {
        let (bpm, file) = setup(2);

        let page = bpm.allocate(&file).unwrap();
        let pid = page.page_id();
        assert_eq!(bpm.lock().pin_count(&file, pid), Some(1));

        drop(page);
        assert_eq!(bpm.lock().pin_count(&file, pid), Some(0));
        assert_eq!(bpm.lock().is_dirty(&file, pid), Some(false));
    }

    #[test]
    fn test_write_marks_dirty() {
        let (bpm, file) = setup(2);

        let mut page = bpm.allocate(&file).unwrap();
        let pid = page.page_id();
        page.write(|p| p.as_mut_slice()[0] = 9).unwrap();
        page.release().unwrap();

        assert_eq!(bpm.lock().is_dirty(&file, pid), Some(true));
        assert_eq!(bpm.lock().pin_count(&file, pid), Some(0));
    }

    #[test]
    fn test_guards_stack_pins() {
        let (bpm, file) = setup(2);
        let pid = bpm.allocate(&file).unwrap().page_id();

        let a = bpm.fetch(&file, pid).unwrap();
        let b = bpm.fetch(&file, pid).unwrap();
        assert_eq!(bpm.lock().pin_count(&file, pid), Some(2));

        assert!(matches!(
            bpm.flush_file(&file),
            Err(Error::PagePinned { .. })
        ));

        drop(a);
        drop(b);
        bpm.flush_file(&file).unwrap();
    }

    #[test]
    fn test_dispose_refused_while_guard_held() {
        let (bpm, file) = setup(2);
        let page = bpm.allocate(&file).unwrap();
        let pid = page.page_id();

        assert!(matches!(
            bpm.dispose_page(&file, pid),
            Err(Error::PagePinned { .. })
        ));
        assert_eq!(file.lock().page_ids(), vec![pid]);

        drop(page);
        bpm.dispose_page(&file, pid).unwrap();
        assert!(file.lock().page_ids().is_empty());
    }

    #[test]
    fn test_concurrent_writers() {
        let (bpm, file) = setup(8);

        let pids: Vec<PageId> = (0..4)
            .map(|_| bpm.allocate(&file).unwrap().page_id())
            .collect();

        let handles: Vec<_> = pids
            .iter()
            .enumerate()
            .map(|(i, &pid)| {
                let bpm = bpm.clone();
                let file = file.clone();
                thread::spawn(move || {
                    for j in 0..50u8 {
                        let mut page = bpm.fetch(&file, pid).unwrap();
                        page.write(|p| p.as_mut_slice()[0] = (i as u8) * 50 + j)
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for (i, &pid) in pids.iter().enumerate() {
            let value = bpm.fetch(&file, pid).unwrap().read(|p| p.as_slice()[0]).unwrap();
            assert_eq!(value, (i as u8) * 50 + 49);
        }
        bpm.flush_all().unwrap();
        bpm.lock().verify_consistency().unwrap();
    }
}
