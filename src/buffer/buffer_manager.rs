//! Buffer Manager - the page caching layer.
//!
//! The [`BufferManager`] provides:
//! - Page caching between paged files and memory
//! - Pin-based reference counting
//! - Write-back of dirty pages on eviction and flush
//! - CLOCK (second-chance) victim selection

use tracing::{debug, trace, warn};

use crate::buffer::frame::{FrameTable, Resident};
use crate::buffer::page_index::PageIndex;
use crate::buffer::page_pool::PagePool;
use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{BufferStats, FrameState, PoolSnapshot};
use crate::common::config::BufferConfig;
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::FileHandle;

/// Manages a fixed pool of frames caching pages of any number of files.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                        BufferManager                         │
/// │  ┌────────────────────┐   ┌──────────────────────────────┐   │
/// │  │     page index     │   │     frames: FrameTable       │   │
/// │  │(FileId,PageId)→Fid │──▶│  [Desc0] [Desc1] [Desc2] ... │   │
/// │  └────────────────────┘   ├──────────────────────────────┤   │
/// │  ┌────────────────────┐   │     pool: PagePool           │   │
/// │  │   ClockReplacer    │   │  [Page0] [Page1] [Page2] ... │   │
/// │  │   hand ─▶ FrameId  │   └──────────────────────────────┘   │
/// │  └────────────────────┘                                      │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Pins
/// [`read_page`](Self::read_page) and [`alloc_page`](Self::alloc_page) pin
/// the page; every pin must be released with
/// [`unpin_page`](Self::unpin_page). A pinned page is never evicted. Pins are
/// counted, not owned: the manager does not track which caller holds which
/// pin.
///
/// # Durability
/// Dropping the manager does not flush. Call
/// [`flush_file`](Self::flush_file) before relying on data surviving.
///
/// # Usage
/// ```
/// use clockpool::{BufferManager, FileHandle, MemFile};
///
/// let file = FileHandle::new(MemFile::new("users.db"));
/// let mut bpm = BufferManager::new(8)?;
///
/// let (page_id, page) = bpm.alloc_page(&file)?;
/// page.as_mut_slice()[0] = 0xAB;
/// bpm.unpin_page(&file, page_id, true)?;
///
/// bpm.flush_file(&file)?;
/// assert_eq!(bpm.is_dirty(&file, page_id), Some(false));
/// # Ok::<(), clockpool::Error>(())
/// ```
pub struct BufferManager {
    frames: FrameTable,
    pool: PagePool,
    index: PageIndex,
    clock: ClockReplacer,
    stats: BufferStats,
}

impl BufferManager {
    /// Create a manager with `pool_size` frames.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Result<Self> {
        Self::with_config(&BufferConfig::default().with_pool_size(pool_size))
    }

    pub fn with_config(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        let pool_size = config.pool_size;

        Ok(Self {
            frames: FrameTable::new(pool_size),
            pool: PagePool::new(pool_size),
            index: PageIndex::with_capacity(pool_size),
            clock: ClockReplacer::new(pool_size),
            stats: BufferStats::default(),
        })
    }

    // ========================================================================
    // Public API: pin and unpin
    // ========================================================================

    /// Pin a page, loading it from `file` if it is not resident.
    ///
    /// On a hit the pin count is incremented and the reference bit set. On a
    /// miss the clock picks a frame (writing back and unindexing its previous
    /// page if needed) and the page is read into it with a pin count of 1.
    ///
    /// # Errors
    /// - `Error::BufferPoolExhausted` if every frame is pinned
    /// - `Error::InvalidPage` or I/O errors from the file
    pub fn read_page(&mut self, file: &FileHandle, page_id: PageId) -> Result<&mut Page> {
        let frame_id = match self.index.lookup(file.id(), page_id) {
            Some(frame_id) => {
                let pins = self.frames[frame_id].pin();
                self.stats.cache_hits += 1;
                trace!(file = file.name(), %page_id, %frame_id, pins, "pool hit");
                frame_id
            }
            None => self.load_page(file, page_id)?,
        };

        Ok(self.pool.page_mut(frame_id))
    }

    /// Release one pin on a resident page.
    ///
    /// `dirty = true` marks the page modified. The flag is sticky: unpinning
    /// with `dirty = false` never clears it, only a write-back does.
    ///
    /// # Errors
    /// - `Error::PageNotFoundInIndex` if the page is not resident (it cannot
    ///   hold a pin, since pinned pages are never evicted)
    /// - `Error::PageNotPinned` if the pin count is already 0
    pub fn unpin_page(&mut self, file: &FileHandle, page_id: PageId, dirty: bool) -> Result<()> {
        let frame_id = self.lookup(file.id(), page_id)?;
        let frame = &mut self.frames[frame_id];

        let pins = frame.unpin().ok_or_else(|| Error::PageNotPinned {
            file: file.name().to_string(),
            page_id,
            frame_id,
        })?;
        if dirty {
            frame.mark_dirty();
        }

        trace!(file = file.name(), %page_id, pins, dirty, "unpinned");
        Ok(())
    }

    /// Allocate a new empty page in `file` and pin it.
    ///
    /// # Errors
    /// - `Error::BufferPoolExhausted` if every frame is pinned. The page has
    ///   already been allocated in the file by then and stays allocated.
    /// - Errors from the file's allocation or read
    pub fn alloc_page(&mut self, file: &FileHandle) -> Result<(PageId, &mut Page)> {
        let page_id = file.lock().allocate_page()?;
        debug!(file = file.name(), %page_id, "allocated page");

        let frame_id = self.load_page(file, page_id)?;
        Ok((page_id, self.pool.page_mut(frame_id)))
    }

    // ========================================================================
    // Public API: access to pinned pages
    // ========================================================================

    /// Content of a page the caller has pinned.
    ///
    /// # Errors
    /// `Error::PageNotFoundInIndex` or `Error::PageNotPinned`.
    pub fn page(&self, file: &FileHandle, page_id: PageId) -> Result<&Page> {
        let frame_id = self.pinned_frame(file, page_id)?;
        Ok(self.pool.page(frame_id))
    }

    /// Mutable content of a page the caller has pinned.
    ///
    /// Remember to unpin with `dirty = true` after modifying it.
    pub fn page_mut(&mut self, file: &FileHandle, page_id: PageId) -> Result<&mut Page> {
        let frame_id = self.pinned_frame(file, page_id)?;
        Ok(self.pool.page_mut(frame_id))
    }

    // ========================================================================
    // Public API: flush and dispose
    // ========================================================================

    /// Write back every dirty resident page of `file`.
    ///
    /// All resident pages of the file are validated before anything is
    /// written, so a pinned page fails the flush without partial writes.
    /// Pages stay resident; flush never evicts.
    ///
    /// # Errors
    /// - `Error::PagePinned` if any resident page of the file is pinned
    /// - `Error::BadBuffer` if an index entry points at a frame that does not
    ///   hold that page
    /// - Errors from the file's writes
    pub fn flush_file(&mut self, file: &FileHandle) -> Result<()> {
        let resident = self.index.resident_pages(file.id());

        for &(page_id, frame_id) in &resident {
            if self.frames[frame_id].is_pinned() {
                return Err(Error::PagePinned {
                    file: file.name().to_string(),
                    page_id,
                    frame_id,
                });
            }
            self.check_entry(file.id(), page_id, frame_id)?;
        }

        let mut written = 0u64;
        {
            let mut disk = file.lock();
            for &(page_id, frame_id) in &resident {
                if !self.frames[frame_id].is_dirty() {
                    continue;
                }
                disk.write_page(page_id, self.pool.page(frame_id))?;
                self.frames[frame_id].clear_dirty();
                self.stats.pages_written += 1;
                written += 1;
            }
        }

        debug!(file = file.name(), resident = resident.len(), written, "flushed file");
        Ok(())
    }

    /// [`flush_file`](Self::flush_file) for every file with resident pages.
    ///
    /// Stops at the first file that fails.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut files: Vec<FileHandle> = Vec::new();
        for resident in self.frames.iter().filter_map(|d| d.resident()) {
            if !files.contains(&resident.file) {
                files.push(resident.file.clone());
            }
        }

        for file in &files {
            self.flush_file(file)?;
        }
        Ok(())
    }

    /// Drop a page from the pool (without write-back) and delete it from
    /// `file`.
    ///
    /// A resident page is unindexed and its frame cleared whatever its pin
    /// count; outstanding pins on it are void afterwards. The file is then
    /// asked to delete the page whether or not it was resident.
    ///
    /// # Errors
    /// Errors from the file's delete, e.g. `Error::InvalidPage`.
    pub fn dispose_page(&mut self, file: &FileHandle, page_id: PageId) -> Result<()> {
        if let Some(frame_id) = self.index.lookup(file.id(), page_id) {
            let pins = self.frames[frame_id].pin_count();
            self.index.remove(file.id(), page_id)?;
            self.frames[frame_id].clear();
            self.pool.page_mut(frame_id).reset();
            debug!(file = file.name(), %page_id, %frame_id, pins, "dropped disposed page from pool");
        }

        file.lock().delete_page(page_id)?;
        debug!(file = file.name(), %page_id, "disposed page");
        Ok(())
    }

    // ========================================================================
    // Public API: diagnostics
    // ========================================================================

    /// State of every frame, plus the number of valid frames.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            frames: self.frames.iter().map(FrameState::from).collect(),
            valid_frames: self.frames.valid_count(),
        }
    }

    /// Check that the index and the frame table describe the same pages.
    ///
    /// Every index entry must point at a valid frame holding its key, every
    /// valid frame must be indexed under its page, and every invalid frame
    /// must be unpinned and clean.
    ///
    /// # Errors
    /// `Error::BadBuffer` naming the first inconsistent frame.
    pub fn verify_consistency(&self) -> Result<()> {
        for (key, &frame_id) in self.index.iter() {
            self.check_entry(key.file, key.page, frame_id)?;
        }

        for desc in self.frames.iter() {
            let consistent = match desc.resident() {
                Some(r) => self.index.lookup(r.file.id(), r.page_id) == Some(desc.frame_id()),
                None => !desc.is_pinned() && !desc.is_dirty(),
            };
            if !consistent {
                return Err(self.bad_buffer(desc.frame_id()));
            }
        }

        Ok(())
    }

    pub fn stats(&self) -> BufferStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Number of resident pages.
    pub fn resident_count(&self) -> usize {
        self.index.len()
    }

    /// Frame the clock hand points at.
    pub fn clock_hand(&self) -> FrameId {
        self.clock.hand()
    }

    pub fn contains_page(&self, file: &FileHandle, page_id: PageId) -> bool {
        self.index.lookup(file.id(), page_id).is_some()
    }

    /// Frame holding a resident page.
    pub fn frame_of(&self, file: &FileHandle, page_id: PageId) -> Option<FrameId> {
        self.index.lookup(file.id(), page_id)
    }

    /// Pin count of a resident page, or `None` if it is not resident.
    pub fn pin_count(&self, file: &FileHandle, page_id: PageId) -> Option<u32> {
        self.index
            .lookup(file.id(), page_id)
            .map(|frame_id| self.frames[frame_id].pin_count())
    }

    /// Dirty flag of a resident page, or `None` if it is not resident.
    pub fn is_dirty(&self, file: &FileHandle, page_id: PageId) -> Option<bool> {
        self.index
            .lookup(file.id(), page_id)
            .map(|frame_id| self.frames[frame_id].is_dirty())
    }

    // ========================================================================
    // Internal: load and evict
    // ========================================================================

    /// Bring a non-resident page into a frame, pinned once.
    fn load_page(&mut self, file: &FileHandle, page_id: PageId) -> Result<FrameId> {
        self.stats.cache_misses += 1;

        let frame_id = self.allocate_frame()?;

        file.lock().read_page(page_id, self.pool.page_mut(frame_id))?;
        self.stats.pages_read += 1;

        self.index.insert(file.id(), page_id, frame_id)?;
        self.frames[frame_id].set(file.clone(), page_id);

        debug!(file = file.name(), %page_id, %frame_id, "loaded page");
        Ok(frame_id)
    }

    /// Obtain a frame from the clock, evicting its occupant if it has one.
    fn allocate_frame(&mut self) -> Result<FrameId> {
        let frame_id = self
            .clock
            .pick_victim(&mut self.frames)
            .ok_or_else(|| Error::BufferPoolExhausted {
                pool_size: self.frames.len(),
            })?;

        if self.frames[frame_id].is_valid() {
            self.evict(frame_id)?;
        }
        Ok(frame_id)
    }

    /// Write back (if dirty), unindex, then clear. In that order: the index
    /// entry must not outlive the frame's identity.
    fn evict(&mut self, frame_id: FrameId) -> Result<()> {
        let Some(Resident { file, page_id }) = self.frames[frame_id].resident().cloned() else {
            return Ok(());
        };

        if self.frames[frame_id].is_dirty() {
            file.lock().write_page(page_id, self.pool.page(frame_id))?;
            self.stats.pages_written += 1;
        }

        self.index.remove(file.id(), page_id)?;
        self.frames[frame_id].clear();
        self.stats.evictions += 1;

        debug!(file = file.name(), %page_id, %frame_id, "evicted page");
        Ok(())
    }

    // ========================================================================
    // Internal: lookups and checks
    // ========================================================================

    fn lookup(&self, file_id: FileId, page_id: PageId) -> Result<FrameId> {
        self.index
            .lookup(file_id, page_id)
            .ok_or(Error::PageNotFoundInIndex { file_id, page_id })
    }

    fn pinned_frame(&self, file: &FileHandle, page_id: PageId) -> Result<FrameId> {
        let frame_id = self.lookup(file.id(), page_id)?;
        if !self.frames[frame_id].is_pinned() {
            return Err(Error::PageNotPinned {
                file: file.name().to_string(),
                page_id,
                frame_id,
            });
        }
        Ok(frame_id)
    }

    /// An index entry is sound if its frame is valid and holds exactly its key.
    fn check_entry(&self, file_id: FileId, page_id: PageId, frame_id: FrameId) -> Result<()> {
        let holds_key = self.frames[frame_id]
            .resident()
            .is_some_and(|r| r.file.id() == file_id && r.page_id == page_id);
        if holds_key {
            Ok(())
        } else {
            Err(self.bad_buffer(frame_id))
        }
    }

    fn bad_buffer(&self, frame_id: FrameId) -> Error {
        let frame = &self.frames[frame_id];
        Error::BadBuffer {
            frame_id,
            valid: frame.is_valid(),
            dirty: frame.is_dirty(),
            ref_bit: frame.ref_bit(),
        }
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        let dirty = self.frames.iter().filter(|d| d.is_dirty()).count();
        if dirty > 0 {
            warn!(dirty, "buffer manager dropped with unflushed dirty pages");
        }
    }
}
