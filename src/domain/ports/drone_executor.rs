//! Drone execution port.
//!
//! The core never invokes a model or tool directly; it hands an
//! [`ExecutionRequest`] to whatever backend implements [`DroneExecutor`]
//! and awaits a [`TaskResult`]. Timeouts are the executor's responsibility
//! and arrive as ordinary failed results.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{DroneType, TaskResult};

/// Request to execute one task on one drone.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Task being executed
    pub task_id: Uuid,
    /// Drone performing the execution
    pub drone_id: Uuid,
    /// Type of the executing drone
    pub drone_type: DroneType,
    /// Raw task description
    pub description: String,
    /// Prompt rendered from the drone descriptor's template
    pub prompt: String,
    /// Task context passed through to the execution layer
    pub context: HashMap<String, serde_json::Value>,
    /// Timeout hint, seconds
    pub timeout_secs: u64,
}

/// Contract the external execution layer implements.
///
/// Must be safely invocable concurrently across distinct drones; the
/// orchestrator guarantees a single drone is invoked at most once
/// concurrently. An `Err` means the execution layer itself faulted
/// (distinct from a task that ran and failed, which is `Ok` with
/// `success == false`).
#[async_trait]
pub trait DroneExecutor: Send + Sync {
    /// Execute a task and report its result.
    async fn execute(&self, request: ExecutionRequest) -> anyhow::Result<TaskResult>;
}
