//! Hive - Self-Replicating Agent Orchestrator
//!
//! Hive coordinates a pool of autonomous drone agents under a central
//! orchestrator that plans work, assigns it, monitors outcomes, and decides
//! when to grow the pool.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic and domain models
//! - **Service Layer** (`services`): Strategic planner and replication manager
//! - **Application Layer** (`application`): The per-cycle control loop
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use hive::application::Hive;
//! use hive::domain::models::HiveConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut hive = Hive::new(HiveConfig::default(), executor);
//!     hive.initialize();
//!     let summary = hive.run_cycle().await;
//!     println!("completed: {}", summary.tasks_completed);
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{CycleResult, Hive, HiveStatus};
pub use domain::models::{
    Drone, DroneDescriptor, DroneMetrics, DroneStatus, DroneType, HiveConfig, LoggingConfig,
    ReplicationConfig, ReplicationDecision, ReplicationMetrics, StrategicGoal, StrategyType, Task,
    TaskPriority, TaskResult, TaskStatus,
};
pub use domain::ports::{DroneExecutor, ExecutionRequest, TaskObserver};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::Logging;
pub use services::{DependencyResolver, ReplicationManager, StrategicPlanner};
