//! Page pool - the frame contents.

use crate::common::FrameId;
use crate::storage::page::Page;

/// One [`Page`] per frame, indexed by [`FrameId`]. Allocated once, never resized.
pub struct PagePool {
    pages: Box<[Page]>,
}

impl PagePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            pages: (0..capacity).map(|_| Page::new()).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[inline]
    pub fn page(&self, frame_id: FrameId) -> &Page {
        &self.pages[frame_id.index()]
    }

    #[inline]
    pub fn page_mut(&mut self, frame_id: FrameId) -> &mut Page {
        &mut self.pages[frame_id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_independent() {
        let mut pool = PagePool::new(3);
        assert_eq!(pool.len(), 3);

        pool.page_mut(FrameId::new(1)).as_mut_slice()[0] = 0xAA;

        assert_eq!(pool.page(FrameId::new(0)).as_slice()[0], 0);
        assert_eq!(pool.page(FrameId::new(1)).as_slice()[0], 0xAA);
        assert_eq!(pool.page(FrameId::new(2)).as_slice()[0], 0);
    }
}
