//! In-memory paged file.

use std::collections::{BTreeMap, BTreeSet};

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// A [`PagedFile`] kept entirely in memory.
///
/// Allocation reuses the lowest deleted id before growing, matching
/// [`DiskFile`](crate::storage::DiskFile). Reads and writes are counted so
/// tests can tell a pool hit from a reload.
#[derive(Debug, Default)]
pub struct MemFile {
    name: String,
    pages: BTreeMap<PageId, Box<Page>>,
    free: BTreeSet<PageId>,
    next_page_id: u32,
    reads: u64,
    writes: u64,
}

impl MemFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Stored content of `page_id`, bypassing the read counter.
    pub fn page(&self, page_id: PageId) -> Option<&Page> {
        self.pages.get(&page_id).map(|page| page.as_ref())
    }

    /// Number of `read_page` calls served.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of `write_page` calls served.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn invalid(&self, page_id: PageId) -> Error {
        Error::InvalidPage {
            file: self.name.clone(),
            page_id,
        }
    }
}

impl PagedFile for MemFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&mut self, page_id: PageId, buf: &mut Page) -> Result<()> {
        let page = self.pages.get(&page_id).ok_or_else(|| self.invalid(page_id))?;
        buf.copy_from(page);
        self.reads += 1;
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        match self.pages.get_mut(&page_id) {
            Some(stored) => stored.copy_from(page),
            None => return Err(self.invalid(page_id)),
        }
        self.writes += 1;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = match self.free.pop_first() {
            Some(page_id) => page_id,
            None => {
                let page_id = PageId::new(self.next_page_id);
                self.next_page_id += 1;
                page_id
            }
        };
        self.pages.insert(page_id, Box::new(Page::new()));
        Ok(page_id)
    }

    fn delete_page(&mut self, page_id: PageId) -> Result<()> {
        if self.pages.remove(&page_id).is_none() {
            return Err(self.invalid(page_id));
        }
        self.free.insert(page_id);
        Ok(())
    }

    fn page_ids(&self) -> Vec<PageId> {
        self.pages.keys().copied().collect()
    }
}
