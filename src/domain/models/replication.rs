//! Replication decision types.
//!
//! These are ephemeral: metrics are recomputed from planner/pool state every
//! cycle and the decision is consumed immediately, never persisted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::drone::DroneType;

/// Snapshot of hive metrics a replication decision is based on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationMetrics {
    /// Number of pending tasks in the backlog
    pub task_queue_depth: usize,
    /// Live drone count per type
    pub drones_by_type: HashMap<DroneType, usize>,
    /// Success rate per type, where known
    pub success_rate_by_type: HashMap<DroneType, f64>,
    /// Estimated revenue the pool could realize
    pub revenue_potential: f64,
    /// Estimated cost of pool operation
    pub estimated_cost: f64,
}

/// Recommendation about whether to spawn a new drone, and of which type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationDecision {
    /// Whether a spawn is recommended
    pub should_replicate: bool,
    /// The type selected as most needed (set even on some refusals, for
    /// observability)
    pub drone_type: Option<DroneType>,
    /// Human-readable reason for the decision
    pub reason: String,
    /// Informational per-type ROI estimate; not authoritative for the
    /// approval itself
    pub estimated_roi: f64,
    /// Confidence in the recommendation
    pub confidence: f64,
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
}

impl ReplicationDecision {
    /// Refusal with a reason and no selected type.
    pub fn refuse(reason: impl Into<String>) -> Self {
        Self {
            should_replicate: false,
            drone_type: None,
            reason: reason.into(),
            estimated_roi: 0.0,
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Refusal that still reports the needed type and ROI estimate.
    pub fn refuse_with_type(
        drone_type: DroneType,
        reason: impl Into<String>,
        estimated_roi: f64,
    ) -> Self {
        Self {
            should_replicate: false,
            drone_type: Some(drone_type),
            reason: reason.into(),
            estimated_roi,
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Approval carrying the chosen type, ROI estimate and confidence.
    pub fn approve(
        drone_type: DroneType,
        reason: impl Into<String>,
        estimated_roi: f64,
        confidence: f64,
    ) -> Self {
        Self {
            should_replicate: true,
            drone_type: Some(drone_type),
            reason: reason.into(),
            estimated_roi,
            confidence,
            timestamp: Utc::now(),
        }
    }
}
