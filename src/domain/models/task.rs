//! Task domain model.
//!
//! Tasks are discrete units of work that drones execute. They carry a
//! required drone type, a priority, and dependencies on other tasks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::drone::DroneType;
use crate::domain::errors::{DomainError, DomainResult};

/// Status of a task in its lifecycle.
///
/// The only reachable path is Pending -> Assigned -> {Completed, Failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting in the backlog
    Pending,
    /// Task has been handed to a drone
    Assigned,
    /// Task finished successfully
    Completed,
    /// Task finished unsuccessfully
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "assigned" => Some(Self::Assigned),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Pending => vec![Self::Assigned],
            Self::Assigned => vec![Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Priority level for tasks. Lower numeric value means higher urgency,
/// so the derived ordering sorts `Critical` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" | "normal" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A discrete unit of work to be executed by a drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Detailed description/prompt
    pub description: String,
    /// Type of drone required to execute this task
    pub required_drone_type: DroneType,
    /// Priority
    pub priority: TaskPriority,
    /// Estimated duration in minutes
    pub estimated_minutes: u32,
    /// Owning strategic goal, if any
    pub goal_id: Option<Uuid>,
    /// Task IDs this depends on
    pub dependencies: Vec<Uuid>,
    /// Arbitrary execution context
    pub context: HashMap<String, serde_json::Value>,
    /// Current status
    pub status: TaskStatus,
    /// Drone currently holding this task
    pub assigned_drone: Option<Uuid>,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task for the given drone type.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        required_drone_type: DroneType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            required_drone_type,
            priority: TaskPriority::default(),
            estimated_minutes: 30,
            goal_id: None,
            dependencies: Vec::new(),
            context: HashMap::new(),
            status: TaskStatus::default(),
            assigned_drone: None,
            created_at: Utc::now(),
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set estimated duration.
    pub fn with_estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    /// Set the owning goal.
    pub fn with_goal(mut self, goal_id: Uuid) -> Self {
        self.goal_id = Some(goal_id);
        self
    }

    /// Add a dependency. Self-references and duplicates are ignored.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        if !self.dependencies.contains(&task_id) && task_id != self.id {
            self.dependencies.push(task_id);
        }
        self
    }

    /// Attach a context value.
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Check if task can transition to the given status.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to a new status.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> DomainResult<()> {
        if !self.can_transition_to(new_status) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// Check if task is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate task.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Task description cannot be empty".to_string());
        }
        if self.dependencies.contains(&self.id) {
            return Err("Task cannot depend on itself".to_string());
        }
        Ok(())
    }
}
