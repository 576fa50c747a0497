//! Frame table - per-frame metadata for the buffer pool.
//!
//! A [`FrameDescriptor`] records which page a frame holds and how it may be
//! used:
//! - Which file and page is loaded (if any)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//! - Reference bit for the clock policy

use std::ops::{Index, IndexMut};

use crate::common::{FrameId, PageId};
use crate::storage::FileHandle;

/// The page a valid frame holds.
#[derive(Debug, Clone)]
pub struct Resident {
    pub file: FileHandle,
    pub page_id: PageId,
}

/// Metadata for one frame.
///
/// # Invariant
/// An invalid frame (no resident page) has `pin_count == 0` and is clean.
/// [`clear`](FrameDescriptor::clear) is the only way back to invalid and
/// restores all of it.
#[derive(Debug)]
pub struct FrameDescriptor {
    frame_id: FrameId,
    resident: Option<Resident>,
    dirty: bool,
    pin_count: u32,
    ref_bit: bool,
}

impl FrameDescriptor {
    /// Create an empty (invalid) descriptor.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            resident: None,
            dirty: false,
            pin_count: 0,
            ref_bit: false,
        }
    }

    /// Record a freshly loaded page: valid, clean, pinned once, referenced.
    pub fn set(&mut self, file: FileHandle, page_id: PageId) {
        self.resident = Some(Resident { file, page_id });
        self.dirty = false;
        self.pin_count = 1;
        self.ref_bit = true;
    }

    /// Return to the invalid state.
    pub fn clear(&mut self) {
        self.resident = None;
        self.dirty = false;
        self.pin_count = 0;
        self.ref_bit = false;
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub fn resident(&self) -> Option<&Resident> {
        self.resident.as_ref()
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.resident.is_some()
    }

    /// Pin for another borrower and mark as recently used.
    #[inline]
    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.ref_bit = true;
        self.pin_count
    }

    /// Drop one pin. Returns the new count, or `None` if it was already 0.
    #[inline]
    pub fn unpin(&mut self) -> Option<u32> {
        self.pin_count = self.pin_count.checked_sub(1)?;
        Some(self.pin_count)
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    /// Mark the frame as modified. Only a write-back clears it.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn ref_bit(&self) -> bool {
        self.ref_bit
    }

    /// Take away the frame's second chance.
    #[inline]
    pub fn clear_ref_bit(&mut self) {
        self.ref_bit = false;
    }
}

/// Fixed-size table of descriptors, one per frame, indexed by [`FrameId`].
///
/// Allocated once and never resized.
#[derive(Debug)]
pub struct FrameTable {
    descriptors: Box<[FrameDescriptor]>,
}

impl FrameTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            descriptors: (0..capacity)
                .map(|i| FrameDescriptor::new(FrameId::new(i)))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameDescriptor> {
        self.descriptors.iter()
    }

    /// Number of frames holding a page.
    pub fn valid_count(&self) -> usize {
        self.iter().filter(|d| d.is_valid()).count()
    }
}

impl Index<FrameId> for FrameTable {
    type Output = FrameDescriptor;

    #[inline]
    fn index(&self, frame_id: FrameId) -> &FrameDescriptor {
        &self.descriptors[frame_id.index()]
    }
}

impl IndexMut<FrameId> for FrameTable {
    #[inline]
    fn index_mut(&mut self, frame_id: FrameId) -> &mut FrameDescriptor {
        &mut self.descriptors[frame_id.index()]
    }
}
