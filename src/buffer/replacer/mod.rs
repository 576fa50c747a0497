//! Eviction policy implementations (replacers).
//!
//! - [`ClockReplacer`] - CLOCK (second chance)

mod clock;

pub use clock::ClockReplacer;
