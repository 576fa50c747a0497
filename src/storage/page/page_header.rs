//! Page header and type definitions.
//!
//! [`DiskFile`](crate::storage::DiskFile) stores a [`PageHeader`] in front of
//! every page slot, outside the page itself:
//! - [`PageType`] discriminator (data or free)
//! - the page's own id, so a misdirected read is detected
//! - CRC32 checksum for integrity

use crate::common::PageId;
use crate::storage::page::Page;

/// Type of page stored on disk.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Never stamped, or unrecognised.
    #[default]
    Invalid = 0,
    /// Allocated page holding caller data.
    Data = 1,
    /// Deleted page, available for reallocation.
    Free = 2,
}

impl PageType {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PageType::Data,
            2 => PageType::Free,
            _ => PageType::Invalid,
        }
    }
}

/// Metadata stored in front of every on-disk page.
///
/// # Layout (9 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       4     page_id (little-endian)
/// ```
///
/// The checksum covers the type byte, the page id and the page contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
    pub page_id: PageId,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 9;

    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_PAGE_ID: usize = 5;

    /// Create a header for `page_id` with a zero checksum.
    pub fn new(page_type: PageType, page_id: PageId) -> Self {
        Self {
            page_type,
            checksum: 0,
            page_id,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]);
        let mut page_id = [0u8; 4];
        page_id.copy_from_slice(&data[Self::OFFSET_PAGE_ID..Self::OFFSET_PAGE_ID + 4]);

        Self {
            page_type: PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]),
            checksum: u32::from_le_bytes(checksum),
            page_id: PageId::new(u32::from_le_bytes(page_id)),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_PAGE_ID..Self::OFFSET_PAGE_ID + 4]
            .copy_from_slice(&self.page_id.0.to_le_bytes());
    }

    /// Header for `page`, with its checksum computed.
    pub fn seal(page_type: PageType, page_id: PageId, page: &Page) -> Self {
        let mut header = Self::new(page_type, page_id);
        header.checksum = header.compute_checksum(page);
        header
    }

    pub fn compute_checksum(&self, page: &Page) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&[self.page_type as u8]);
        hasher.update(&self.page_id.0.to_le_bytes());
        hasher.update(page.as_slice());
        hasher.finalize()
    }

    /// Check the stored checksum against `page`.
    pub fn verify_checksum(&self, page: &Page) -> bool {
        self.checksum == self.compute_checksum(page)
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new(PageType::Invalid, PageId::new(0))
    }
}
