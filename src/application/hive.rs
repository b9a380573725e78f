//! The hive orchestrator and its per-cycle control loop.
//!
//! A single coordinating flow drives the cycle: Assign, Execute, Settle,
//! Scale. Execute fans out all assigned tasks concurrently (the system's
//! only true parallelism); every state mutation happens back on the
//! orchestrator flow, serialized through Settle. Errors raised inside a
//! cycle are caught at the cycle boundary and recorded on the cycle
//! summary; the hive itself keeps running.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    DroneDescriptor, DroneType, HiveConfig, ReplicationMetrics, StrategicGoal, StrategyType,
    Task, TaskPriority, TaskResult,
};
use crate::domain::ports::{DroneExecutor, ExecutionRequest, TaskObserver};
use crate::services::planner::{QueueStats, StrategicPlanner};
use crate::services::replicator::{PoolStatus, ReplicationManager};

/// Oldest task records are dropped beyond this many entries.
const TASK_HISTORY_LIMIT: usize = 1000;

/// Summary of one hive operation cycle; the only externally observable
/// unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleResult {
    pub cycle_number: u64,
    pub tasks_assigned: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    /// Cumulative revenue at cycle end
    pub revenue_generated: f64,
    /// Cumulative cost at cycle end
    pub cost_incurred: f64,
    /// Drone spawned by this cycle's scaling step, if any
    pub new_drone: Option<Uuid>,
    /// Errors caught at the cycle boundary
    pub errors: Vec<String>,
    pub duration_secs: f64,
    pub timestamp: DateTime<Utc>,
}

impl CycleResult {
    fn new(cycle_number: u64) -> Self {
        Self {
            cycle_number,
            tasks_assigned: 0,
            tasks_completed: 0,
            tasks_failed: 0,
            revenue_generated: 0.0,
            cost_incurred: 0.0,
            new_drone: None,
            errors: Vec::new(),
            duration_secs: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// Point-in-time status snapshot of the hive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiveStatus {
    pub total_drones: usize,
    pub active_tasks: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub uptime_seconds: f64,
    pub goals_active: usize,
    pub goals_completed: usize,
}

/// One line of the task execution history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub drone_id: Uuid,
    pub success: bool,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

/// The hive: planner, drone pool, and the cycle loop that drives them.
///
/// Constructed explicitly with its executor; there is no global instance.
pub struct Hive {
    config: HiveConfig,
    planner: StrategicPlanner,
    replicator: ReplicationManager,
    executor: Arc<dyn DroneExecutor>,
    observers: Vec<Arc<dyn TaskObserver>>,
    total_revenue: f64,
    total_cost: f64,
    cycle_count: u64,
    cycle_history: Vec<CycleResult>,
    task_history: Vec<TaskRecord>,
    initialized: bool,
    running: bool,
    created_at: DateTime<Utc>,
}

impl Hive {
    pub fn new(config: HiveConfig, executor: Arc<dyn DroneExecutor>) -> Self {
        let replicator = ReplicationManager::new(config.replication.clone());
        info!(hive = %config.hive_name, "Hive created");
        Self {
            config,
            planner: StrategicPlanner::new(),
            replicator,
            executor,
            observers: Vec::new(),
            total_revenue: 0.0,
            total_cost: 0.0,
            cycle_count: 0,
            cycle_history: Vec::new(),
            task_history: Vec::new(),
            initialized: false,
            running: false,
            created_at: Utc::now(),
        }
    }

    /// Spawn the initial drone set and seed the starting goals.
    /// Must be called before running cycles; calling twice is a no-op.
    pub fn initialize(&mut self) -> DomainResult<()> {
        if self.initialized {
            warn!("Hive already initialized");
            return Ok(());
        }

        self.replicator.spawn_initial();
        self.seed_initial_goals()?;

        self.initialized = true;
        info!(
            hive = %self.config.hive_name,
            drones = self.replicator.total_drones(),
            "Hive initialized"
        );
        Ok(())
    }

    fn seed_initial_goals(&mut self) -> DomainResult<()> {
        let revenue_goal = StrategicGoal::new(
            "First Revenue",
            "Generate the first $100 in revenue through products or services",
            StrategyType::Expand,
            "revenue",
            100.0,
        )
        .with_priority(TaskPriority::High);

        for task in self
            .planner
            .generate_tasks_for_goal(&revenue_goal, &HashMap::new())
        {
            self.planner.add_task(task)?;
        }
        self.planner.add_goal(revenue_goal)?;

        let learning_goal = StrategicGoal::new(
            "Knowledge Foundation",
            "Accumulate 50 validated skills in the skillbook",
            StrategyType::Optimize,
            "skill_count",
            50.0,
        );
        self.planner.add_goal(learning_goal)?;

        Ok(())
    }

    /// Register a settle-time observer. Observers are invoked in
    /// registration order, fire-and-forget, with an immutable snapshot.
    pub fn register_observer(&mut self, observer: Arc<dyn TaskObserver>) {
        self.observers.push(observer);
    }

    /// Add a task to the backlog.
    pub fn add_task(&mut self, task: Task) -> DomainResult<()> {
        self.planner.add_task(task)
    }

    /// Add a strategic goal.
    pub fn add_goal(&mut self, goal: StrategicGoal) -> DomainResult<()> {
        self.planner.add_goal(goal)
    }

    /// Record revenue and propagate it to revenue-tracking goals.
    pub fn add_revenue(&mut self, amount: f64, source: &str) {
        self.total_revenue += amount;

        let revenue_goals: Vec<Uuid> = self
            .planner
            .goals()
            .filter(|g| g.target_metric == "revenue")
            .map(|g| g.id)
            .collect();
        for goal_id in revenue_goals {
            self.planner.update_goal_progress(goal_id, self.total_revenue);
        }

        info!(amount, source, "Revenue added");
    }

    /// Run one complete hive cycle: Assign, Execute, Settle, Scale.
    ///
    /// Always returns a summary; errors end the cycle early and are
    /// recorded on it rather than propagated.
    pub async fn run_cycle(&mut self) -> CycleResult {
        self.cycle_count += 1;
        let started = Instant::now();
        let mut result = CycleResult::new(self.cycle_count);

        if let Err(e) = self.cycle_inner(&mut result).await {
            error!(cycle = self.cycle_count, error = %e, "Cycle error");
            result.errors.push(e.to_string());
        }

        result.revenue_generated = self.total_revenue;
        result.cost_incurred = self.total_cost;
        result.duration_secs = started.elapsed().as_secs_f64();
        self.cycle_history.push(result.clone());
        result
    }

    async fn cycle_inner(&mut self, result: &mut CycleResult) -> anyhow::Result<()> {
        anyhow::ensure!(self.initialized, "Hive not initialized; call initialize() first");

        result.tasks_assigned = self.assign_tasks();
        let outcomes = self.execute_assigned().await;
        self.settle(outcomes, result);
        result.new_drone = self.scale();
        Ok(())
    }

    /// Assign pending tasks to idle drones, one task per drone, walking
    /// idle drones in spawn order against the priority-sorted backlog.
    /// Never oversubscribes a cycle beyond `max_concurrent_tasks`.
    fn assign_tasks(&mut self) -> usize {
        let idle: Vec<(Uuid, DroneType)> = self
            .replicator
            .idle_drones()
            .iter()
            .map(|d| (d.id, d.drone_type))
            .collect();

        let mut assigned = 0;
        for (drone_id, drone_type) in idle {
            if assigned >= self.config.max_concurrent_tasks {
                break;
            }
            let Some(task) = self.planner.next_task(Some(drone_type)) else {
                continue;
            };
            if self.planner.assign(task.id, drone_id) {
                if let Some(drone) = self.replicator.drone_mut(drone_id) {
                    drone.begin_task(task.id);
                }
                debug!(task_id = %task.id, drone_id = %drone_id, "Assigned task to drone");
                assigned += 1;
            }
        }
        assigned
    }

    /// Fan out every assigned task to its drone's executor concurrently
    /// and await all of them. Returns (task, outcome) pairs; an `Err`
    /// outcome is an executor-level fault, distinct from a result with
    /// `success == false`.
    async fn execute_assigned(&self) -> Vec<(Task, Uuid, anyhow::Result<TaskResult>)> {
        let timeout_secs = self.config.task_timeout_secs;
        let mut jobs = Vec::new();

        for task in self.planner.assigned_tasks() {
            let Some(drone_id) = task.assigned_drone else {
                continue;
            };
            let descriptor = DroneDescriptor::for_type(task.required_drone_type);
            let request = ExecutionRequest {
                task_id: task.id,
                drone_id,
                drone_type: task.required_drone_type,
                description: task.description.clone(),
                prompt: descriptor.render_prompt(&task.description),
                context: task.context.clone(),
                timeout_secs,
            };
            let executor = Arc::clone(&self.executor);
            jobs.push(async move {
                let outcome = executor.execute(request).await;
                (task, drone_id, outcome)
            });
        }

        join_all(jobs).await
    }

    /// Serialize all outcome mutations: task archival, drone state,
    /// cost accumulation, history, and observer notification.
    fn settle(
        &mut self,
        outcomes: Vec<(Task, Uuid, anyhow::Result<TaskResult>)>,
        cycle: &mut CycleResult,
    ) {
        for (task, drone_id, outcome) in outcomes {
            let (task_result, executor_fault) = match outcome {
                Ok(r) => (r, false),
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Executor fault");
                    (TaskResult::failure(task.id, e.to_string()), true)
                }
            };

            if let Some(drone) = self.replicator.drone_mut(drone_id) {
                if executor_fault {
                    drone.mark_errored(&task_result);
                } else {
                    drone.finish_task(&task_result);
                }
            }

            self.planner.complete(task.id, task_result.success);
            self.total_cost += task_result.cost_estimate;

            if task_result.success {
                cycle.tasks_completed += 1;
            } else {
                cycle.tasks_failed += 1;
            }

            self.task_history.push(TaskRecord {
                task_id: task.id,
                drone_id,
                success: task_result.success,
                cost: task_result.cost_estimate,
                timestamp: Utc::now(),
            });
            if self.task_history.len() > TASK_HISTORY_LIMIT {
                self.task_history.remove(0);
            }

            self.notify_observers(drone_id, &task.description, &task_result);
        }
    }

    /// Emit the settled result to every observer without blocking the
    /// cycle. A single background task walks the subscriber list so
    /// observers for one settlement run in registration order.
    fn notify_observers(&self, drone_id: Uuid, task_description: &str, result: &TaskResult) {
        if self.observers.is_empty() {
            return;
        }
        let observers = self.observers.clone();
        let description = task_description.to_string();
        let snapshot = result.clone();
        tokio::spawn(async move {
            for observer in observers {
                observer
                    .on_task_settled(drone_id, description.clone(), snapshot.clone())
                    .await;
            }
        });
    }

    /// Evaluate the scaling decision and spawn at most one drone.
    fn scale(&mut self) -> Option<Uuid> {
        let metrics = ReplicationMetrics {
            task_queue_depth: self.planner.pending_count(),
            drones_by_type: self.replicator.counts_by_type(),
            success_rate_by_type: self.replicator.success_rates_by_type(),
            revenue_potential: self.total_revenue * self.config.replication.revenue_potential_factor,
            estimated_cost: self.config.replication.operation_cost,
        };

        let decision = self.replicator.should_replicate(&metrics);
        debug!(
            should_replicate = decision.should_replicate,
            reason = %decision.reason,
            "Replication decision"
        );

        if decision.should_replicate {
            if let Some(drone_type) = decision.drone_type {
                return self.replicator.spawn(drone_type).map(|d| d.id);
            }
        }
        None
    }

    /// Run up to `cycles` cycles, sleeping `interval` between them.
    /// With `stop_on_empty`, stops once no tasks are pending or active.
    /// An external `stop()` takes effect at the next cycle boundary; the
    /// running cycle drains first.
    pub async fn run(
        &mut self,
        cycles: usize,
        interval: Duration,
        stop_on_empty: bool,
    ) -> DomainResult<Vec<CycleResult>> {
        if !self.initialized {
            self.initialize()?;
        }

        self.running = true;
        let mut results = Vec::new();

        for i in 0..cycles {
            if !self.running {
                info!("Hive stopped by external signal");
                break;
            }

            results.push(self.run_cycle().await);

            if stop_on_empty {
                let status = self.status();
                if status.pending_tasks == 0 && status.active_tasks == 0 {
                    info!("No more tasks, stopping hive");
                    break;
                }
            }

            if i < cycles - 1 {
                sleep(interval).await;
            }
        }

        self.running = false;
        Ok(results)
    }

    /// Request a graceful stop; takes effect at the next cycle boundary.
    pub fn stop(&mut self) {
        self.running = false;
        info!(hive = %self.config.hive_name, "Hive stop requested");
    }

    /// Current status snapshot.
    pub fn status(&self) -> HiveStatus {
        let stats = self.planner.queue_stats();
        let (active_goals, completed_goals) =
            self.planner.goals().fold((0, 0), |(a, c), g| {
                if g.is_active() {
                    (a + 1, c)
                } else {
                    (a, c + 1)
                }
            });

        HiveStatus {
            total_drones: self.replicator.total_drones(),
            active_tasks: stats.total_assigned,
            pending_tasks: stats.total_pending,
            completed_tasks: stats.total_completed,
            total_revenue: self.total_revenue,
            total_cost: self.total_cost,
            uptime_seconds: (Utc::now() - self.created_at).num_milliseconds() as f64 / 1000.0,
            goals_active: active_goals,
            goals_completed: completed_goals,
        }
    }

    /// Read-only queue statistics.
    pub fn queue_stats(&self) -> QueueStats {
        self.planner.queue_stats()
    }

    /// Read-only pool status.
    pub fn pool_status(&self) -> PoolStatus {
        self.replicator.status()
    }

    /// Read-only view of the planner.
    pub fn planner(&self) -> &StrategicPlanner {
        &self.planner
    }

    /// Read-only view of the drone pool.
    pub fn replicator(&self) -> &ReplicationManager {
        &self.replicator
    }

    /// Cycle summaries, oldest first.
    pub fn cycle_history(&self) -> &[CycleResult] {
        &self.cycle_history
    }

    /// Per-task execution records, oldest first.
    pub fn task_history(&self) -> &[TaskRecord] {
        &self.task_history
    }

    /// Number of cycles run so far.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}

impl std::fmt::Debug for Hive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hive")
            .field("hive_name", &self.config.hive_name)
            .field("cycle_count", &self.cycle_count)
            .field("total_drones", &self.replicator.total_drones())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
