//! Worker pool manager: drone lifecycle and the replication heuristic.
//!
//! Owns every drone from spawn to termination. Capacity and cooldown
//! refusals are expected outcomes, surfaced as `None` or a refusing
//! decision plus a log line, never as errors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::{Drone, DroneType, ReplicationConfig, ReplicationDecision, ReplicationMetrics};

/// Kind of lifecycle event recorded in the replication history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationAction {
    Spawn,
    Terminate,
}

/// One entry of the replication history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationEvent {
    pub action: ReplicationAction,
    pub drone_id: Uuid,
    pub drone_type: DroneType,
    pub timestamp: DateTime<Utc>,
}

/// Pool-level status summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStatus {
    pub total_drones: usize,
    pub drones_by_type: HashMap<DroneType, usize>,
    pub last_replication: Option<DateTime<Utc>>,
    pub replication_history_count: usize,
}

/// Manages drone spawning, termination and replication decisions.
#[derive(Debug)]
pub struct ReplicationManager {
    config: ReplicationConfig,
    drones: HashMap<Uuid, Drone>,
    /// Insertion order of live drones; keeps `idle_drones` deterministic.
    spawn_order: Vec<Uuid>,
    last_replication: Option<DateTime<Utc>>,
    history: Vec<ReplicationEvent>,
}

impl ReplicationManager {
    pub fn new(config: ReplicationConfig) -> Self {
        Self {
            config,
            drones: HashMap::new(),
            spawn_order: Vec::new(),
            last_replication: None,
            history: Vec::new(),
        }
    }

    /// Live drone count per type; every type is present, zero-filled.
    pub fn counts_by_type(&self) -> HashMap<DroneType, usize> {
        let mut counts: HashMap<DroneType, usize> =
            DroneType::ALL.iter().map(|dt| (*dt, 0)).collect();
        for drone in self.drones.values() {
            *counts.entry(drone.drone_type).or_insert(0) += 1;
        }
        counts
    }

    /// Success rate per type, averaged over live drones that have finished
    /// at least one task.
    pub fn success_rates_by_type(&self) -> HashMap<DroneType, f64> {
        let mut sums: HashMap<DroneType, (f64, usize)> = HashMap::new();
        for drone in self.drones.values() {
            if drone.metrics.tasks_completed + drone.metrics.tasks_failed > 0 {
                let entry = sums.entry(drone.drone_type).or_insert((0.0, 0));
                entry.0 += drone.metrics.success_rate;
                entry.1 += 1;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        sums.into_iter()
            .map(|(dt, (sum, n))| (dt, sum / n as f64))
            .collect()
    }

    /// Spawn a new drone of the given type.
    ///
    /// Returns `None` if the type is at its configured cap; capacity
    /// refusal is an expected non-fatal outcome.
    pub fn spawn(&mut self, drone_type: DroneType) -> Option<&Drone> {
        let counts = self.counts_by_type();
        if counts[&drone_type] >= self.config.max_drones_per_type {
            warn!(
                drone_type = %drone_type,
                max = self.config.max_drones_per_type,
                "Cannot spawn drone: at max capacity"
            );
            return None;
        }

        let drone = Drone::new(drone_type);
        let id = drone.id;
        info!(name = %drone.name, drone_type = %drone_type, "Spawned new drone");

        self.drones.insert(id, drone);
        self.spawn_order.push(id);
        self.last_replication = Some(Utc::now());
        self.history.push(ReplicationEvent {
            action: ReplicationAction::Spawn,
            drone_id: id,
            drone_type,
            timestamp: Utc::now(),
        });

        self.drones.get(&id)
    }

    /// Spawn the initial drone set as configured. Each spawn arms the
    /// replication cooldown like any other.
    pub fn spawn_initial(&mut self) -> Vec<Uuid> {
        let plan = [
            (DroneType::Worker, self.config.initial_workers),
            (DroneType::Builder, self.config.initial_builders),
            (DroneType::Seller, self.config.initial_sellers),
            (DroneType::Researcher, self.config.initial_researchers),
            (DroneType::Analyst, self.config.initial_analysts),
        ];

        let mut spawned = Vec::new();
        for (drone_type, count) in plan {
            for _ in 0..count {
                if let Some(drone) = self.spawn(drone_type) {
                    spawned.push(drone.id);
                }
            }
        }

        info!(count = spawned.len(), "Spawned initial drones");
        spawned
    }

    /// Terminate a drone and remove it from the live set.
    /// Idempotent: a second call for the same id returns false.
    pub fn terminate(&mut self, drone_id: Uuid) -> bool {
        let Some(mut drone) = self.drones.remove(&drone_id) else {
            return false;
        };
        drone.terminate();
        self.spawn_order.retain(|id| *id != drone_id);
        self.history.push(ReplicationEvent {
            action: ReplicationAction::Terminate,
            drone_id,
            drone_type: drone.drone_type,
            timestamp: Utc::now(),
        });
        info!(drone_id = %drone_id, "Terminated drone");
        true
    }

    /// Look up a live drone.
    pub fn drone(&self, drone_id: Uuid) -> Option<&Drone> {
        self.drones.get(&drone_id)
    }

    /// Mutable access to a live drone.
    pub fn drone_mut(&mut self, drone_id: Uuid) -> Option<&mut Drone> {
        self.drones.get_mut(&drone_id)
    }

    /// All live drones in spawn order.
    pub fn drones(&self) -> Vec<&Drone> {
        self.spawn_order
            .iter()
            .filter_map(|id| self.drones.get(id))
            .collect()
    }

    /// All idle drones, in spawn order.
    pub fn idle_drones(&self) -> Vec<&Drone> {
        self.spawn_order
            .iter()
            .filter_map(|id| self.drones.get(id))
            .filter(|d| d.is_idle())
            .collect()
    }

    /// Total live drone count.
    pub fn total_drones(&self) -> usize {
        self.drones.len()
    }

    /// The replication history log, oldest first.
    pub fn history(&self) -> &[ReplicationEvent] {
        &self.history
    }

    /// Pool status summary for observability.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            total_drones: self.drones.len(),
            drones_by_type: self.counts_by_type(),
            last_replication: self.last_replication,
            replication_history_count: self.history.len(),
        }
    }

    /// Evaluate whether the hive should spawn a new drone.
    ///
    /// Gates are evaluated in a fixed order and the first refusal wins:
    /// cooldown, queue demand, capacity for the selected type, then the
    /// pool-wide profitability threshold. The per-type ROI estimate is
    /// computed for observability; it does not gate the decision.
    pub fn should_replicate(&self, metrics: &ReplicationMetrics) -> ReplicationDecision {
        if let Some(last) = self.last_replication {
            let elapsed = u64::try_from((Utc::now() - last).num_seconds().max(0)).unwrap_or(0);
            if elapsed < self.config.replication_cooldown_secs {
                return ReplicationDecision::refuse(format!(
                    "In cooldown period ({elapsed}s < {}s)",
                    self.config.replication_cooldown_secs
                ));
            }
        }

        if metrics.task_queue_depth < self.config.min_queue_depth {
            return ReplicationDecision::refuse(format!(
                "Queue depth too low ({} < {})",
                metrics.task_queue_depth, self.config.min_queue_depth
            ));
        }

        let needed_type = self.identify_needed_type(metrics);
        let estimated_roi = self.estimate_roi(needed_type, metrics);

        let live = metrics.drones_by_type.get(&needed_type).copied().unwrap_or(0);
        if live >= self.config.max_drones_per_type {
            return ReplicationDecision::refuse_with_type(
                needed_type,
                format!("At max capacity for {needed_type}"),
                estimated_roi,
            );
        }

        if metrics.revenue_potential
            > metrics.estimated_cost * self.config.cost_revenue_multiplier
        {
            return ReplicationDecision::approve(
                needed_type,
                format!("High demand for {needed_type} tasks"),
                estimated_roi,
                0.8,
            );
        }

        ReplicationDecision::refuse_with_type(needed_type, "ROI threshold not met", estimated_roi)
    }

    /// Load-balancing heuristic: the type with the fewest live instances,
    /// ties broken by enumeration order. Not task-type aware.
    fn identify_needed_type(&self, metrics: &ReplicationMetrics) -> DroneType {
        let mut needed = DroneType::Worker;
        let mut min_count = usize::MAX;
        for drone_type in DroneType::ALL {
            let count = metrics.drones_by_type.get(&drone_type).copied().unwrap_or(0);
            if count < min_count {
                min_count = count;
                needed = drone_type;
            }
        }
        needed
    }

    /// Informational per-type ROI estimate from queue depth and pool size.
    fn estimate_roi(&self, drone_type: DroneType, metrics: &ReplicationMetrics) -> f64 {
        let success_rate = metrics
            .success_rate_by_type
            .get(&drone_type)
            .copied()
            .unwrap_or(0.5);
        #[allow(clippy::cast_precision_loss)]
        let potential_tasks =
            metrics.task_queue_depth as f64 / self.drones.len().max(1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let avg_task_value =
            metrics.revenue_potential / metrics.task_queue_depth.max(1) as f64;

        let expected_revenue = potential_tasks * success_rate * avg_task_value;
        expected_revenue / metrics.estimated_cost.max(0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> ReplicationConfig {
        ReplicationConfig {
            replication_cooldown_secs: 0,
            ..ReplicationConfig::default()
        }
    }

    fn busy_metrics(manager: &ReplicationManager) -> ReplicationMetrics {
        ReplicationMetrics {
            task_queue_depth: 20,
            drones_by_type: manager.counts_by_type(),
            success_rate_by_type: HashMap::new(),
            revenue_potential: 100.0,
            estimated_cost: 1.0,
        }
    }

    #[test]
    fn test_spawn_and_counts() {
        let mut manager = ReplicationManager::new(quiet_config());
        let drone = manager.spawn(DroneType::Builder).unwrap();
        assert_eq!(drone.drone_type, DroneType::Builder);

        let counts = manager.counts_by_type();
        assert_eq!(counts[&DroneType::Builder], 1);
        // Every type is represented even at zero
        assert_eq!(counts[&DroneType::Analyst], 0);
        assert_eq!(counts.len(), DroneType::ALL.len());
    }

    #[test]
    fn test_spawn_respects_capacity() {
        let config = ReplicationConfig {
            max_drones_per_type: 2,
            ..quiet_config()
        };
        let mut manager = ReplicationManager::new(config);

        assert!(manager.spawn(DroneType::Worker).is_some());
        assert!(manager.spawn(DroneType::Worker).is_some());
        assert!(manager.spawn(DroneType::Worker).is_none());
        assert_eq!(manager.counts_by_type()[&DroneType::Worker], 2);

        // Other types are unaffected by one type's cap
        assert!(manager.spawn(DroneType::Seller).is_some());
    }

    #[test]
    fn test_spawn_initial_counts() {
        let config = ReplicationConfig {
            initial_workers: 2,
            initial_builders: 1,
            initial_sellers: 0,
            initial_researchers: 1,
            initial_analysts: 0,
            ..quiet_config()
        };
        let mut manager = ReplicationManager::new(config);
        let spawned = manager.spawn_initial();

        assert_eq!(spawned.len(), 4);
        let counts = manager.counts_by_type();
        assert_eq!(counts[&DroneType::Worker], 2);
        assert_eq!(counts[&DroneType::Builder], 1);
        assert_eq!(counts[&DroneType::Seller], 0);

        // Initial staffing arms the cooldown clock like any spawn
        assert!(manager.status().last_replication.is_some());
    }

    #[test]
    fn test_initial_staffing_arms_cooldown() {
        let config = ReplicationConfig {
            replication_cooldown_secs: 300,
            ..ReplicationConfig::default()
        };
        let mut manager = ReplicationManager::new(config);
        manager.spawn_initial();

        // Metrics that would otherwise approve: deep queue, high revenue
        let metrics = busy_metrics(&manager);
        let decision = manager.should_replicate(&metrics);
        assert!(!decision.should_replicate);
        assert!(decision.reason.contains("In cooldown period"));
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut manager = ReplicationManager::new(quiet_config());
        let id = manager.spawn(DroneType::Researcher).unwrap().id;

        assert!(manager.terminate(id));
        assert!(!manager.terminate(id));
        assert!(manager.drone(id).is_none());
        assert_eq!(manager.total_drones(), 0);
    }

    #[test]
    fn test_idle_drones_in_spawn_order() {
        let mut manager = ReplicationManager::new(quiet_config());
        let first = manager.spawn(DroneType::Worker).unwrap().id;
        let second = manager.spawn(DroneType::Builder).unwrap().id;
        let third = manager.spawn(DroneType::Worker).unwrap().id;

        manager.drone_mut(second).unwrap().begin_task(Uuid::new_v4());

        let idle: Vec<Uuid> = manager.idle_drones().iter().map(|d| d.id).collect();
        assert_eq!(idle, vec![first, third]);
    }

    #[test]
    fn test_cooldown_dominates_all_other_gates() {
        let config = ReplicationConfig {
            replication_cooldown_secs: 300,
            ..ReplicationConfig::default()
        };
        let mut manager = ReplicationManager::new(config);
        manager.spawn(DroneType::Worker).unwrap();

        // Metrics that would otherwise approve
        let metrics = busy_metrics(&manager);
        let decision = manager.should_replicate(&metrics);
        assert!(!decision.should_replicate);
        assert!(decision.reason.contains("In cooldown period"));
        assert!(decision.drone_type.is_none());
    }

    #[test]
    fn test_demand_gate_refuses_shallow_queue() {
        let manager = ReplicationManager::new(quiet_config());
        let metrics = ReplicationMetrics {
            task_queue_depth: 1,
            ..busy_metrics(&manager)
        };

        let decision = manager.should_replicate(&metrics);
        assert!(!decision.should_replicate);
        assert_eq!(decision.reason, "Queue depth too low (1 < 10)");
    }

    #[test]
    fn test_type_selection_prefers_fewest_live() {
        let mut manager = ReplicationManager::new(quiet_config());
        manager.spawn(DroneType::Worker).unwrap();
        manager.spawn(DroneType::Builder).unwrap();

        // Researcher, Seller, Analyst are all at zero; enumeration order
        // breaks the tie in favor of Researcher
        let decision = manager.should_replicate(&busy_metrics(&manager));
        assert!(decision.should_replicate);
        assert_eq!(decision.drone_type, Some(DroneType::Researcher));
        assert!(decision.reason.contains("High demand for researcher"));
        assert!((decision.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capacity_refusal_reports_type_and_roi() {
        let config = ReplicationConfig {
            max_drones_per_type: 1,
            ..quiet_config()
        };
        let mut manager = ReplicationManager::new(config);
        for dt in DroneType::ALL {
            manager.spawn(dt).unwrap();
        }

        let decision = manager.should_replicate(&busy_metrics(&manager));
        assert!(!decision.should_replicate);
        assert_eq!(decision.drone_type, Some(DroneType::Worker));
        assert!(decision.reason.contains("At max capacity for worker"));
        assert!(decision.estimated_roi > 0.0);
    }

    #[test]
    fn test_profitability_gate() {
        let manager = ReplicationManager::new(quiet_config());

        let mut metrics = busy_metrics(&manager);
        metrics.revenue_potential = 1.0;
        metrics.estimated_cost = 1.0;

        // 1.0 is not greater than 1.0 * 2.0
        let decision = manager.should_replicate(&metrics);
        assert!(!decision.should_replicate);
        assert_eq!(decision.reason, "ROI threshold not met");
        assert!(decision.drone_type.is_some());
    }

    #[test]
    fn test_history_records_lifecycle() {
        let mut manager = ReplicationManager::new(quiet_config());
        let id = manager.spawn(DroneType::Analyst).unwrap().id;
        manager.terminate(id);

        let history = manager.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, ReplicationAction::Spawn);
        assert_eq!(history[1].action, ReplicationAction::Terminate);
        assert_eq!(history[1].drone_id, id);
    }
}
