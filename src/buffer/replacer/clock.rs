//! CLOCK (second-chance) replacement policy.

use tracing::trace;

use crate::buffer::frame::FrameTable;
use crate::common::FrameId;

/// Picks eviction victims with a circular second-chance sweep.
///
/// Starting one past the hand, each examined frame is:
/// - skipped if pinned
/// - given a second chance if its reference bit is set (the bit is cleared)
/// - selected otherwise
///
/// Invalid frames are never pinned or referenced, so they are selected as
/// soon as the hand reaches them. The hand stays on the selected frame.
///
/// A sweep examines at most `2 * capacity` frames: the first lap clears every
/// reference bit, the second can then select any unpinned frame. Only when
/// every frame is pinned does the sweep come back empty.
///
/// The hand is the only source of scan order, so for a fixed sequence of
/// calls the victims are always the same.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: usize,
    capacity: usize,
}

impl ClockReplacer {
    /// Create a replacer over `capacity` frames. The first sweep starts at
    /// frame 0.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "clock capacity must be > 0");
        Self {
            hand: capacity - 1,
            capacity,
        }
    }

    /// Frame the hand currently points at.
    #[inline]
    pub fn hand(&self) -> FrameId {
        FrameId::new(self.hand)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.capacity;
    }

    /// Sweep for the next victim, clearing reference bits on the way.
    ///
    /// Returns `None` if every frame is pinned. The victim is not modified;
    /// evicting it is the caller's job.
    pub fn pick_victim(&mut self, frames: &mut FrameTable) -> Option<FrameId> {
        debug_assert_eq!(frames.len(), self.capacity);

        for _ in 0..2 * self.capacity {
            self.advance();
            let frame = &mut frames[FrameId::new(self.hand)];

            if frame.is_pinned() {
                continue;
            }
            if frame.ref_bit() {
                trace!(frame = self.hand, "second chance");
                frame.clear_ref_bit();
                continue;
            }
            return Some(FrameId::new(self.hand));
        }

        None
    }
}
