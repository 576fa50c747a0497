//! Page - the fixed-size unit of content held by one frame.

use crate::common::config::PAGE_SIZE;

/// A page of data (4KB, 4KB-aligned).
///
/// The buffer pool owns one `Page` per frame and overwrites it in place on
/// every load, so callers always receive a reference into the pool rather
/// than a copy.
///
/// All [`PAGE_SIZE`] bytes belong to the caller. File formats keep their own
/// metadata outside the page.
///
/// # Clone
/// `Page` does not implement `Clone`; copying 4KB is explicit through
/// [`copy_from`](Page::copy_from).
///
/// # Example
/// ```
/// use clockpool::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
///
/// let mut copy = Page::new();
/// copy.copy_from(&page);
/// assert_eq!(copy.as_slice()[0], 0xFF);
/// ```
#[derive(Debug)]
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite this page with the full contents of `other`.
    #[inline]
    pub fn copy_from(&mut self, other: &Page) {
        self.data.copy_from_slice(&other.data);
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
