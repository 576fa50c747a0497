//! Page index - which frame holds which page.

use std::collections::HashMap;

use crate::common::{Error, FileId, FrameId, PageId, Result};

/// Composite key of the page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub file: FileId,
    pub page: PageId,
}

impl PageKey {
    #[inline]
    pub fn new(file: FileId, page: PageId) -> Self {
        Self { file, page }
    }
}

/// Maps `(FileId, PageId)` to the frame holding that page.
///
/// An entry exists exactly while its frame is valid and holds the page. The
/// manager removes an entry before the frame is reused, so a lookup can never
/// resolve to a frame that has since been given to another page.
#[derive(Debug, Default)]
pub struct PageIndex {
    map: HashMap<PageKey, FrameId>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for a pool of `capacity` frames.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Add a mapping.
    ///
    /// # Errors
    /// `Error::DuplicateIndexEntry` if the key is already mapped.
    pub fn insert(&mut self, file: FileId, page_id: PageId, frame_id: FrameId) -> Result<()> {
        let key = PageKey::new(file, page_id);
        if let Some(&existing) = self.map.get(&key) {
            return Err(Error::DuplicateIndexEntry {
                file_id: file,
                page_id,
                frame_id: existing,
            });
        }
        self.map.insert(key, frame_id);
        Ok(())
    }

    #[inline]
    pub fn lookup(&self, file: FileId, page_id: PageId) -> Option<FrameId> {
        self.map.get(&PageKey::new(file, page_id)).copied()
    }

    /// Remove a mapping, returning the frame it pointed to.
    ///
    /// # Errors
    /// `Error::PageNotFoundInIndex` if the key is absent.
    pub fn remove(&mut self, file: FileId, page_id: PageId) -> Result<FrameId> {
        self.map
            .remove(&PageKey::new(file, page_id))
            .ok_or(Error::PageNotFoundInIndex {
                file_id: file,
                page_id,
            })
    }

    /// Every indexed page of `file`, ordered by page id.
    pub fn resident_pages(&self, file: FileId) -> Vec<(PageId, FrameId)> {
        let mut pages: Vec<_> = self
            .map
            .iter()
            .filter(|(key, _)| key.file == file)
            .map(|(key, &frame_id)| (key.page, frame_id))
            .collect();
        pages.sort_unstable();
        pages
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PageKey, &FrameId)> {
        self.map.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup_remove() {
        let mut index = PageIndex::new();
        let file = FileId::new(1);

        index.insert(file, PageId::new(5), FrameId::new(2)).unwrap();
        assert_eq!(index.lookup(file, PageId::new(5)), Some(FrameId::new(2)));
        assert_eq!(index.lookup(file, PageId::new(6)), None);
        assert_eq!(index.lookup(FileId::new(2), PageId::new(5)), None);

        assert_eq!(index.remove(file, PageId::new(5)).unwrap(), FrameId::new(2));
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut index = PageIndex::new();
        let file = FileId::new(1);

        index.insert(file, PageId::new(5), FrameId::new(2)).unwrap();
        match index.insert(file, PageId::new(5), FrameId::new(3)) {
            Err(Error::DuplicateIndexEntry { frame_id, .. }) => {
                assert_eq!(frame_id, FrameId::new(2))
            }
            other => panic!("Expected DuplicateIndexEntry, got {:?}", other),
        }
        assert_eq!(index.lookup(file, PageId::new(5)), Some(FrameId::new(2)));
    }

    #[test]
    fn test_remove_missing_fails() {
        let mut index = PageIndex::new();
        assert!(matches!(
            index.remove(FileId::new(1), PageId::new(0)),
            Err(Error::PageNotFoundInIndex { .. })
        ));
    }

    #[test]
    fn test_resident_pages_filters_and_sorts() {
        let mut index = PageIndex::with_capacity(4);
        let a = FileId::new(1);
        let b = FileId::new(2);

        index.insert(a, PageId::new(9), FrameId::new(0)).unwrap();
        index.insert(b, PageId::new(1), FrameId::new(1)).unwrap();
        index.insert(a, PageId::new(3), FrameId::new(2)).unwrap();

        assert_eq!(
            index.resident_pages(a),
            vec![(PageId::new(3), FrameId::new(2)), (PageId::new(9), FrameId::new(0))]
        );
        assert_eq!(index.resident_pages(b), vec![(PageId::new(1), FrameId::new(1))]);
        assert!(index.resident_pages(FileId::new(3)).is_empty());
    }
}
