//! Drone domain model.
//!
//! A drone is a named, typed execution unit with a status state machine and
//! cumulative performance metrics. Task execution itself happens behind the
//! [`crate::domain::ports::DroneExecutor`] port; the core only tracks state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Types of drone agents in the hive.
///
/// Declaration order doubles as the fixed tie-break order used by the
/// replication type-selection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneType {
    /// Generalist for routine operations
    Worker,
    /// Creates products and deliverables
    Builder,
    /// Gathers and synthesizes information
    Researcher,
    /// Markets and sells deliverables
    Seller,
    /// Evaluates performance and opportunities
    Analyst,
}

impl DroneType {
    /// All drone types in fixed enumeration order.
    pub const ALL: [DroneType; 5] = [
        Self::Worker,
        Self::Builder,
        Self::Researcher,
        Self::Seller,
        Self::Analyst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Builder => "builder",
            Self::Researcher => "researcher",
            Self::Seller => "seller",
            Self::Analyst => "analyst",
        }
    }
}

impl fmt::Display for DroneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "worker" | "generalist" => Ok(Self::Worker),
            "builder" => Ok(Self::Builder),
            "researcher" => Ok(Self::Researcher),
            "seller" => Ok(Self::Seller),
            "analyst" => Ok(Self::Analyst),
            _ => Err(anyhow::anyhow!("Invalid drone type: {s}")),
        }
    }
}

/// Drone status state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneStatus {
    Idle,
    Working,
    Learning,
    Error,
    Terminated,
}

impl fmt::Display for DroneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Working => write!(f, "working"),
            Self::Learning => write!(f, "learning"),
            Self::Error => write!(f, "error"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

impl FromStr for DroneStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "working" => Ok(Self::Working),
            "learning" => Ok(Self::Learning),
            "error" => Ok(Self::Error),
            "terminated" => Ok(Self::Terminated),
            _ => Err(anyhow::anyhow!("Invalid drone status: {s}")),
        }
    }
}

/// Result from executing a task.
///
/// This is the immutable snapshot handed to observers after Settle; the task
/// itself may already be archived by the time an observer runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task this result belongs to
    pub task_id: Uuid,
    /// Whether execution succeeded
    pub success: bool,
    /// Execution output
    pub output: serde_json::Value,
    /// Error message if execution failed
    pub error: Option<String>,
    /// Wall-clock execution time in seconds
    pub execution_time_secs: f64,
    /// Tokens consumed, if the execution layer reports them
    pub tokens_used: u64,
    /// Estimated cost of this execution
    pub cost_estimate: f64,
}

impl TaskResult {
    /// Successful result with the given output.
    pub fn success(task_id: Uuid, output: serde_json::Value) -> Self {
        Self {
            task_id,
            success: true,
            output,
            error: None,
            execution_time_secs: 0.0,
            tokens_used: 0,
            cost_estimate: 0.0,
        }
    }

    /// Failed result with the given error message.
    pub fn failure(task_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            task_id,
            success: false,
            output: serde_json::Value::Null,
            error: Some(error.into()),
            execution_time_secs: 0.0,
            tokens_used: 0,
            cost_estimate: 0.0,
        }
    }
}

/// Cumulative metrics tracked for each drone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneMetrics {
    /// Successfully completed task count
    pub tasks_completed: u64,
    /// Failed task count
    pub tasks_failed: u64,
    /// Total tokens consumed
    pub total_tokens: u64,
    /// Total cost incurred
    pub total_cost: f64,
    /// Running average execution time in seconds
    pub avg_execution_time_secs: f64,
    /// Fraction of tasks that succeeded
    pub success_rate: f64,
    /// Last time this drone finished a task
    pub last_active: DateTime<Utc>,
}

impl Default for DroneMetrics {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            tasks_failed: 0,
            total_tokens: 0,
            total_cost: 0.0,
            avg_execution_time_secs: 0.0,
            success_rate: 0.0,
            last_active: Utc::now(),
        }
    }
}

impl DroneMetrics {
    /// Fold a task result into the running totals.
    pub fn record(&mut self, result: &TaskResult) {
        if result.success {
            self.tasks_completed += 1;
        } else {
            self.tasks_failed += 1;
        }

        self.total_tokens += result.tokens_used;
        self.total_cost += result.cost_estimate;

        let total = self.tasks_completed + self.tasks_failed;
        debug_assert!(total > 0);
        #[allow(clippy::cast_precision_loss)]
        {
            self.avg_execution_time_secs = (self.avg_execution_time_secs * (total - 1) as f64
                + result.execution_time_secs)
                / total as f64;
            self.success_rate = self.tasks_completed as f64 / total as f64;
        }

        self.last_active = Utc::now();
    }
}

/// Data-driven descriptor for a drone type: its capability set and the
/// prompt template its executions are framed with. Selected by lookup
/// rather than virtual dispatch; the core only needs the execute contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneDescriptor {
    /// Type this descriptor applies to
    pub drone_type: DroneType,
    /// Capabilities this drone type advertises
    pub capabilities: Vec<&'static str>,
    /// Template the task description is rendered into; `{task}` is replaced
    pub prompt_template: &'static str,
}

impl DroneDescriptor {
    /// Look up the descriptor for a drone type.
    pub fn for_type(drone_type: DroneType) -> Self {
        match drone_type {
            DroneType::Worker => Self {
                drone_type,
                capabilities: vec!["general", "files", "code"],
                prompt_template:
                    "You are a generalist worker drone. Complete the task efficiently.\n\nTask: {task}",
            },
            DroneType::Builder => Self {
                drone_type,
                capabilities: vec!["code", "files", "products"],
                prompt_template:
                    "You are a builder drone. Create concrete, usable deliverables.\n\nTask: {task}",
            },
            DroneType::Researcher => Self {
                drone_type,
                capabilities: vec!["web", "analysis", "synthesis"],
                prompt_template:
                    "You are a researcher drone. Gather and synthesize accurate information.\n\nTask: {task}",
            },
            DroneType::Seller => Self {
                drone_type,
                capabilities: vec!["marketing", "outreach", "pricing"],
                prompt_template:
                    "You are a seller drone. Position and market deliverables for revenue.\n\nTask: {task}",
            },
            DroneType::Analyst => Self {
                drone_type,
                capabilities: vec!["metrics", "evaluation", "reporting"],
                prompt_template:
                    "You are an analyst drone. Evaluate data and report findings.\n\nTask: {task}",
            },
        }
    }

    /// Render the prompt for a concrete task description.
    pub fn render_prompt(&self, task_description: &str) -> String {
        self.prompt_template.replace("{task}", task_description)
    }
}

/// A drone agent in the hive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable name, e.g. `researcher-1a2b3c4d`
    pub name: String,
    /// Type of this drone
    pub drone_type: DroneType,
    /// Current status
    pub status: DroneStatus,
    /// Cumulative performance metrics
    pub metrics: DroneMetrics,
    /// Task currently occupying this drone
    pub current_task_id: Option<Uuid>,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl Drone {
    /// Create a new idle drone of the given type.
    pub fn new(drone_type: DroneType) -> Self {
        let id = Uuid::new_v4();
        let short = &id.simple().to_string()[..8];
        Self {
            id,
            name: format!("{}-{short}", drone_type.as_str()),
            drone_type,
            status: DroneStatus::Idle,
            metrics: DroneMetrics::default(),
            current_task_id: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this drone can accept a task right now.
    pub fn is_idle(&self) -> bool {
        self.status == DroneStatus::Idle
    }

    /// Mark the drone as working on a task.
    pub fn begin_task(&mut self, task_id: Uuid) {
        self.status = DroneStatus::Working;
        self.current_task_id = Some(task_id);
    }

    /// Fold a result into the drone's metrics and return it to idle.
    ///
    /// A failed result still frees the drone; only executor-level faults
    /// (recorded via [`Drone::mark_errored`]) park it in Error status.
    pub fn finish_task(&mut self, result: &TaskResult) {
        self.metrics.record(result);
        self.current_task_id = None;
        self.status = DroneStatus::Idle;
    }

    /// Park the drone in Error status after an executor-level fault.
    pub fn mark_errored(&mut self, result: &TaskResult) {
        self.metrics.record(result);
        self.current_task_id = None;
        self.status = DroneStatus::Error;
    }

    /// Terminate the drone.
    pub fn terminate(&mut self) {
        self.status = DroneStatus::Terminated;
        self.current_task_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_type_round_trip() {
        for dt in DroneType::ALL {
            assert_eq!(dt.as_str().parse::<DroneType>().unwrap(), dt);
        }
        assert!("queen".parse::<DroneType>().is_err());
    }

    #[test]
    fn test_generalist_alias() {
        assert_eq!("generalist".parse::<DroneType>().unwrap(), DroneType::Worker);
    }

    #[test]
    fn test_drone_new() {
        let drone = Drone::new(DroneType::Researcher);
        assert_eq!(drone.drone_type, DroneType::Researcher);
        assert_eq!(drone.status, DroneStatus::Idle);
        assert!(drone.name.starts_with("researcher-"));
        assert!(drone.current_task_id.is_none());
    }

    #[test]
    fn test_begin_and_finish_task() {
        let mut drone = Drone::new(DroneType::Worker);
        let task_id = Uuid::new_v4();

        drone.begin_task(task_id);
        assert_eq!(drone.status, DroneStatus::Working);
        assert_eq!(drone.current_task_id, Some(task_id));

        let result = TaskResult::success(task_id, serde_json::json!("done"));
        drone.finish_task(&result);
        assert_eq!(drone.status, DroneStatus::Idle);
        assert!(drone.current_task_id.is_none());
        assert_eq!(drone.metrics.tasks_completed, 1);
    }

    #[test]
    fn test_failed_result_frees_drone() {
        let mut drone = Drone::new(DroneType::Worker);
        let task_id = Uuid::new_v4();
        drone.begin_task(task_id);

        let result = TaskResult::failure(task_id, "timed out");
        drone.finish_task(&result);
        assert_eq!(drone.status, DroneStatus::Idle);
        assert_eq!(drone.metrics.tasks_failed, 1);
    }

    #[test]
    fn test_executor_fault_parks_drone() {
        let mut drone = Drone::new(DroneType::Worker);
        let task_id = Uuid::new_v4();
        drone.begin_task(task_id);

        let result = TaskResult::failure(task_id, "executor panicked");
        drone.mark_errored(&result);
        assert_eq!(drone.status, DroneStatus::Error);
        assert!(!drone.is_idle());
    }

    #[test]
    fn test_metrics_running_average() {
        let mut metrics = DroneMetrics::default();

        let mut r1 = TaskResult::success(Uuid::new_v4(), serde_json::Value::Null);
        r1.execution_time_secs = 2.0;
        metrics.record(&r1);

        let mut r2 = TaskResult::failure(Uuid::new_v4(), "boom");
        r2.execution_time_secs = 4.0;
        metrics.record(&r2);

        assert!((metrics.avg_execution_time_secs - 3.0).abs() < f64::EPSILON);
        assert!((metrics.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.tasks_completed, 1);
        assert_eq!(metrics.tasks_failed, 1);
    }

    #[test]
    fn test_descriptor_lookup() {
        for dt in DroneType::ALL {
            let desc = DroneDescriptor::for_type(dt);
            assert_eq!(desc.drone_type, dt);
            assert!(desc.prompt_template.contains("{task}"));
        }

        let desc = DroneDescriptor::for_type(DroneType::Builder);
        let prompt = desc.render_prompt("Build a landing page");
        assert!(prompt.contains("Build a landing page"));
        assert!(!prompt.contains("{task}"));
    }

    #[test]
    fn test_terminate() {
        let mut drone = Drone::new(DroneType::Analyst);
        drone.begin_task(Uuid::new_v4());
        drone.terminate();
        assert_eq!(drone.status, DroneStatus::Terminated);
        assert!(drone.current_task_id.is_none());
    }
}
