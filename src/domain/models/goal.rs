//! Strategic goal domain model.
//!
//! Goals are measurable strategic targets the planner expands into tasks.
//! Progress is tracked against a named metric; completion is one-way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::TaskPriority;

/// Category of strategic action a goal represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Grow into new markets/products
    Expand,
    /// Improve existing operations
    Optimize,
    /// Focus on core strengths
    Consolidate,
    /// Change direction based on learnings
    Pivot,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Optimize => "optimize",
            Self::Consolidate => "consolidate",
            Self::Pivot => "pivot",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expand" => Some(Self::Expand),
            "optimize" => Some(Self::Optimize),
            "consolidate" => Some(Self::Consolidate),
            "pivot" => Some(Self::Pivot),
            _ => None,
        }
    }
}

/// Status of a goal.
///
/// The Active -> Completed transition is one-way: once a goal has reached
/// its target it never reopens, even if the tracked value later drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Goal is actively guiding task generation
    Active,
    /// Goal has reached its target metric
    Completed,
}

impl Default for GoalStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// A strategic goal for the hive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicGoal {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Detailed description
    pub description: String,
    /// Strategy category
    pub strategy: StrategyType,
    /// Priority
    pub priority: TaskPriority,
    /// Name of the metric tracked (e.g. "revenue", "skill_count")
    pub target_metric: String,
    /// Target value for the metric
    pub target_value: f64,
    /// Current value of the metric
    pub current_value: f64,
    /// Current status
    pub status: GoalStatus,
    /// Optional deadline
    pub deadline: Option<DateTime<Utc>>,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl StrategicGoal {
    /// Create a new active goal.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        strategy: StrategyType,
        target_metric: impl Into<String>,
        target_value: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            strategy,
            priority: TaskPriority::default(),
            target_metric: target_metric.into(),
            target_value,
            current_value: 0.0,
            status: GoalStatus::default(),
            deadline: None,
            created_at: Utc::now(),
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Progress toward the target, clamped to [0, 1].
    ///
    /// A zero target yields 0.0 rather than dividing by zero.
    pub fn progress(&self) -> f64 {
        if self.target_value == 0.0 {
            return 0.0;
        }
        (self.current_value / self.target_value).clamp(0.0, 1.0)
    }

    /// Set the absolute metric value and flip status to Completed when the
    /// target is reached. The transition never reverses: a later, lower
    /// value updates `current_value` but leaves a completed goal completed.
    pub fn update_progress(&mut self, value: f64) {
        self.current_value = value;
        if self.status == GoalStatus::Active && self.progress() >= 1.0 {
            self.status = GoalStatus::Completed;
        }
    }

    /// Check whether the goal is still guiding work.
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    /// Validate this goal.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("Goal title cannot be empty".to_string());
        }
        if self.target_metric.is_empty() {
            return Err("Goal target metric cannot be empty".to_string());
        }
        if self.target_value < 0.0 {
            return Err("Goal target value cannot be negative".to_string());
        }
        Ok(())
    }
}
