//! Domain errors for the Hive system.

use thiserror::Error;
use uuid::Uuid;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[Uuid]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Domain-level errors that can occur in the Hive system.
///
/// Missing ids on mutating planner/pool calls are deliberately *not* errors;
/// those operations signal via `bool`/`Option` so duplicate callbacks stay
/// benign. Only configuration mistakes surface here.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<Uuid>),

    #[error("Task cannot depend on itself: {0}")]
    SelfDependency(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Convenience alias for domain results.
pub type DomainResult<T> = Result<T, DomainError>;
