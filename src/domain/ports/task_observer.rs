//! Task settlement observer port.
//!
//! Observers are an explicit subscriber list invoked in registration order
//! after a task settles, replacing ad-hoc callback chaining. The orchestrator
//! fires them without awaiting; inputs are immutable snapshots since the task
//! may already be archived when an observer runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::TaskResult;

/// Fire-and-forget hook notified after each task settles.
#[async_trait]
pub trait TaskObserver: Send + Sync {
    /// Called once per settled task. The core neither awaits this on the
    /// cycle path nor depends on its outcome.
    async fn on_task_settled(&self, drone_id: Uuid, task_description: String, result: TaskResult);
}
