//! Application layer: the per-cycle hive control loop.

pub mod hive;

pub use hive::{CycleResult, Hive, HiveStatus};
