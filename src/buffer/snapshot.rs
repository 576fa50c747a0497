//! Point-in-time view of every frame, for diagnostics.

use std::fmt;

use crate::buffer::frame::FrameDescriptor;
use crate::common::{FileId, FrameId, PageId};

/// State of one frame at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState {
    pub frame_id: FrameId,
    pub file_id: Option<FileId>,
    pub file_name: Option<String>,
    pub page_id: Option<PageId>,
    pub valid: bool,
    pub dirty: bool,
    pub pin_count: u32,
    pub ref_bit: bool,
}

impl From<&FrameDescriptor> for FrameState {
    fn from(desc: &FrameDescriptor) -> Self {
        let resident = desc.resident();
        Self {
            frame_id: desc.frame_id(),
            file_id: resident.map(|r| r.file.id()),
            file_name: resident.map(|r| r.file.name().to_string()),
            page_id: resident.map(|r| r.page_id),
            valid: desc.is_valid(),
            dirty: desc.is_dirty(),
            pin_count: desc.pin_count(),
            ref_bit: desc.ref_bit(),
        }
    }
}

/// Every frame's state plus the number of valid frames.
///
/// Returned by [`BufferManager::snapshot`](crate::BufferManager::snapshot).
/// Its `Display` output is one line per frame followed by the valid count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub frames: Vec<FrameState>,
    pub valid_frames: usize,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.frame_id)?;
        match (&self.file_name, self.page_id) {
            (Some(name), Some(page_id)) => write!(f, "file:{} {} ", name, page_id)?,
            _ => write!(f, "file:- page:- ")?,
        }
        write!(
            f,
            "valid:{} dirty:{} pin:{} ref:{}",
            self.valid, self.dirty, self.pin_count, self.ref_bit
        )
    }
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            writeln!(f, "{}", frame)?;
        }
        write!(f, "Total valid frames: {}", self.valid_frames)
    }
}
