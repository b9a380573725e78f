//! Domain models for the Hive system.

pub mod config;
pub mod drone;
pub mod goal;
pub mod replication;
pub mod task;

pub use config::{HiveConfig, LoggingConfig, ReplicationConfig};
pub use drone::{Drone, DroneDescriptor, DroneMetrics, DroneStatus, DroneType, TaskResult};
pub use goal::{GoalStatus, StrategicGoal, StrategyType};
pub use replication::{ReplicationDecision, ReplicationMetrics};
pub use task::{Task, TaskPriority, TaskStatus};
