//! Port trait definitions (Hexagonal Architecture)
//!
//! The core depends only on these traits; concrete executors and observers
//! live outside the crate (LLM backends, learning subsystems, dashboards).

pub mod drone_executor;
pub mod task_observer;

pub use drone_executor::{DroneExecutor, ExecutionRequest};
pub use task_observer::TaskObserver;
