//! Periodic jobs wired into the scheduler.

pub mod refresh;
pub mod round;

pub use refresh::RefreshJob;
pub use round::{RoundJob, RoundSettings};
