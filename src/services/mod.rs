//! Service layer: strategic planning and pool replication.

pub mod dependency_resolver;
pub mod planner;
pub mod replicator;

pub use dependency_resolver::DependencyResolver;
pub use planner::{QueueStats, StrategicPlanner};
pub use replicator::{PoolStatus, ReplicationAction, ReplicationEvent, ReplicationManager};
