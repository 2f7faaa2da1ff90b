//! Dispatch domain: state machine, gas policy, errors. No I/O.

pub mod error;
pub mod gas;
pub mod job;
pub mod policy;

pub use error::DispatchError;
pub use gas::{scale_ceil, GasMetrics, PayableOverrides, UpdateArgs};
pub use job::{DispatchJob, DispatchState};
pub use policy::{ChainPolicy, GasPolicy};
