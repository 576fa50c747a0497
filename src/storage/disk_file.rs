//! Disk-backed paged file.
//!
//! [`DiskFile`] lays pages out sequentially in one OS file. Each slot is a
//! [`PageHeader`] followed by the page, so the page bytes round-trip
//! unchanged:
//! - reads verify the checksum and the stored page id
//! - deleted pages are marked [`PageType::Free`] and reused on allocation

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::PagedFile;

/// A paged file on disk.
///
/// # File Layout
/// ```text
/// ┌────────┬─────────┬────────┬─────────┬─────┬────────┬─────────┐
/// │ Hdr 0  │ Page 0  │ Hdr 1  │ Page 1  │ ... │ Hdr N  │ Page N  │
/// │ (9B)   │ (4KB)   │ (9B)   │ (4KB)   │     │ (9B)   │ (4KB)   │
/// └────────┴─────────┴────────┴─────────┴─────┴────────┴─────────┘
/// Offset:  0                 SLOT_SIZE          ...  N×SLOT_SIZE
/// ```
///
/// The free set is not stored separately; [`open`](DiskFile::open) rebuilds
/// it from the slot headers.
///
/// # Durability
/// Every write is followed by `fsync()`.
pub struct DiskFile {
    file: File,
    name: String,
    /// Number of page slots in the file, live or free.
    page_count: u32,
    free: BTreeSet<PageId>,
}

impl DiskFile {
    /// Bytes per slot: header plus page.
    pub const SLOT_SIZE: usize = PageHeader::SIZE + PAGE_SIZE;

    /// Create a new, empty file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(Self {
            file,
            name: path.as_ref().display().to_string(),
            page_count: 0,
            free: BTreeSet::new(),
        })
    }

    /// Open an existing file and rebuild its free set.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let page_count = (file.metadata()?.len() / Self::SLOT_SIZE as u64) as u32;

        let mut disk = Self {
            file,
            name: path.as_ref().display().to_string(),
            page_count,
            free: BTreeSet::new(),
        };

        for id in 0..page_count {
            let page_id = PageId::new(id);
            if disk.read_header(page_id)?.page_type == PageType::Free {
                disk.free.insert(page_id);
            }
        }

        Ok(disk)
    }

    /// Open an existing file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Number of page slots in the file, including free ones.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Number of deleted pages awaiting reuse.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn file_size(&self) -> u64 {
        PageId::new(self.page_count).offset(Self::SLOT_SIZE)
    }

    fn is_live(&self, page_id: PageId) -> bool {
        page_id.0 < self.page_count && !self.free.contains(&page_id)
    }

    fn invalid(&self, page_id: PageId) -> Error {
        Error::InvalidPage {
            file: self.name.clone(),
            page_id,
        }
    }

    fn read_header(&mut self, page_id: PageId) -> Result<PageHeader> {
        let mut bytes = [0u8; PageHeader::SIZE];
        self.file
            .seek(SeekFrom::Start(page_id.offset(Self::SLOT_SIZE)))?;
        self.file.read_exact(&mut bytes)?;
        Ok(PageHeader::from_bytes(&bytes))
    }

    fn write_slot(&mut self, page_id: PageId, page_type: PageType, page: &Page) -> Result<()> {
        let mut header = [0u8; PageHeader::SIZE];
        PageHeader::seal(page_type, page_id, page).write_to(&mut header);

        self.file
            .seek(SeekFrom::Start(page_id.offset(Self::SLOT_SIZE)))?;
        self.file.write_all(&header)?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl PagedFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&mut self, page_id: PageId, buf: &mut Page) -> Result<()> {
        if !self.is_live(page_id) {
            return Err(self.invalid(page_id));
        }
        let header = self.read_header(page_id)?;
        self.file.read_exact(buf.as_mut_slice())?;

        if header.page_type != PageType::Data
            || header.page_id != page_id
            || !header.verify_checksum(buf)
        {
            return Err(Error::Corrupted {
                file: self.name.clone(),
                page_id,
            });
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if !self.is_live(page_id) {
            return Err(self.invalid(page_id));
        }
        self.write_slot(page_id, PageType::Data, page)
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = match self.free.first() {
            Some(&page_id) => page_id,
            None => PageId::new(self.page_count),
        };

        self.write_slot(page_id, PageType::Data, &Page::new())?;

        if !self.free.remove(&page_id) {
            self.page_count += 1;
        }
        Ok(page_id)
    }

    fn delete_page(&mut self, page_id: PageId) -> Result<()> {
        if !self.is_live(page_id) {
            return Err(self.invalid(page_id));
        }
        self.write_slot(page_id, PageType::Free, &Page::new())?;
        self.free.insert(page_id);
        Ok(())
    }

    fn page_ids(&self) -> Vec<PageId> {
        (0..self.page_count)
            .map(PageId::new)
            .filter(|page_id| !self.free.contains(page_id))
            .collect()
    }
}
