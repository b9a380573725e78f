//! Strategic planner: goal tracking, task backlog, and goal expansion.
//!
//! The planner owns every task while it is pending or assigned. Terminal
//! tasks move into the completed collection and become immutable. All
//! mutating operations are total over the current state: unknown ids signal
//! via `bool`/`Option` so duplicate callbacks stay benign races.

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    DroneType, StrategicGoal, StrategyType, Task, TaskPriority, TaskStatus,
};
use crate::services::dependency_resolver::DependencyResolver;

/// One step of a strategy expansion template.
struct TemplateStep {
    drone_type: DroneType,
    title_prefix: &'static str,
    description_template: &'static str,
    estimated_minutes: u32,
    /// Explicit cross-type dependency on the immediately preceding step.
    depends_on_previous: bool,
}

/// Fixed mapping from strategy category to an ordered step list.
///
/// Expansion is deterministic: no backtracking, no cost optimization.
fn strategy_template(strategy: StrategyType) -> &'static [TemplateStep] {
    match strategy {
        StrategyType::Expand => &[
            TemplateStep {
                drone_type: DroneType::Researcher,
                title_prefix: "Research",
                description_template: "Research opportunities for: {goal}",
                estimated_minutes: 30,
                depends_on_previous: false,
            },
            TemplateStep {
                drone_type: DroneType::Builder,
                title_prefix: "Build",
                description_template: "Create deliverables for: {goal}",
                estimated_minutes: 60,
                depends_on_previous: true,
            },
            TemplateStep {
                drone_type: DroneType::Seller,
                title_prefix: "Sell",
                description_template: "Market the deliverables for: {goal}",
                estimated_minutes: 45,
                depends_on_previous: true,
            },
        ],
        StrategyType::Optimize => &[
            TemplateStep {
                drone_type: DroneType::Analyst,
                title_prefix: "Analyze",
                description_template: "Analyze current state for: {goal}",
                estimated_minutes: 20,
                depends_on_previous: false,
            },
            TemplateStep {
                drone_type: DroneType::Worker,
                title_prefix: "Improve",
                description_template: "Apply improvements for: {goal}",
                estimated_minutes: 40,
                depends_on_previous: true,
            },
        ],
        StrategyType::Consolidate => &[
            TemplateStep {
                drone_type: DroneType::Analyst,
                title_prefix: "Audit",
                description_template: "Audit existing operations for: {goal}",
                estimated_minutes: 30,
                depends_on_previous: false,
            },
            TemplateStep {
                drone_type: DroneType::Worker,
                title_prefix: "Streamline",
                description_template: "Retire low-value work for: {goal}",
                estimated_minutes: 30,
                depends_on_previous: true,
            },
        ],
        StrategyType::Pivot => &[
            TemplateStep {
                drone_type: DroneType::Researcher,
                title_prefix: "Reassess",
                description_template: "Reassess direction for: {goal}",
                estimated_minutes: 30,
                depends_on_previous: false,
            },
            TemplateStep {
                drone_type: DroneType::Analyst,
                title_prefix: "Evaluate",
                description_template: "Evaluate pivot options for: {goal}",
                estimated_minutes: 30,
                depends_on_previous: false,
            },
            TemplateStep {
                drone_type: DroneType::Worker,
                title_prefix: "Execute",
                description_template: "Execute the pivot for: {goal}",
                estimated_minutes: 60,
                depends_on_previous: true,
            },
        ],
    }
}

/// Read-only aggregate counts over the backlog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total_pending: usize,
    pub total_assigned: usize,
    pub total_completed: usize,
    pub by_drone_type: HashMap<DroneType, usize>,
    pub by_priority: HashMap<TaskPriority, usize>,
    pub by_status: HashMap<TaskStatus, usize>,
}

/// Strategic planning component of the hive.
#[derive(Debug, Default)]
pub struct StrategicPlanner {
    goals: HashMap<Uuid, StrategicGoal>,
    backlog: Vec<Task>,
    completed: HashMap<Uuid, Task>,
    resolver: DependencyResolver,
}

impl StrategicPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategic goal. Malformed goals are rejected at insertion.
    pub fn add_goal(&mut self, goal: StrategicGoal) -> DomainResult<()> {
        goal.validate().map_err(DomainError::ValidationFailed)?;
        info!(goal = %goal.title, priority = goal.priority.as_str(), "Added goal");
        self.goals.insert(goal.id, goal);
        Ok(())
    }

    /// Remove a goal. Returns false if the id is unknown.
    pub fn remove_goal(&mut self, goal_id: Uuid) -> bool {
        self.goals.remove(&goal_id).is_some()
    }

    /// Set a goal's absolute metric value.
    ///
    /// Flips the goal to completed exactly once when progress reaches 1.0;
    /// later calls still update the value but never reopen the goal.
    /// Returns false if the id is unknown.
    pub fn update_goal_progress(&mut self, goal_id: Uuid, value: f64) -> bool {
        let Some(goal) = self.goals.get_mut(&goal_id) else {
            return false;
        };
        let was_active = goal.is_active();
        goal.update_progress(value);
        if was_active && !goal.is_active() {
            info!(goal = %goal.title, "Goal completed");
        }
        true
    }

    /// Read-only view of all goals.
    pub fn goals(&self) -> impl Iterator<Item = &StrategicGoal> {
        self.goals.values()
    }

    /// Look up a single goal.
    pub fn goal(&self, goal_id: Uuid) -> Option<&StrategicGoal> {
        self.goals.get(&goal_id)
    }

    /// Insert a task into the backlog and re-sort by priority.
    ///
    /// The sort is stable: tasks of equal priority retain insertion order.
    /// Self-dependencies and dependency cycles are configuration errors and
    /// are rejected here, never discovered at scheduling time.
    pub fn add_task(&mut self, task: Task) -> DomainResult<()> {
        task.validate().map_err(DomainError::ValidationFailed)?;
        self.resolver.check_insertion(&task, &self.backlog)?;

        debug!(task = %task.title, priority = task.priority.as_str(), "Added task");

        self.backlog.push(task);
        self.backlog.sort_by_key(|t| t.priority);
        Ok(())
    }

    /// Find the next eligible task: the first pending backlog entry in
    /// priority order that matches the type filter and whose dependencies
    /// have all completed successfully. `None` is a normal outcome.
    pub fn next_task(&self, drone_type: Option<DroneType>) -> Option<Task> {
        self.backlog
            .iter()
            .find(|task| {
                task.status == TaskStatus::Pending
                    && drone_type.is_none_or(|dt| task.required_drone_type == dt)
                    && self.dependencies_met(task)
            })
            .cloned()
    }

    fn dependencies_met(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|dep| {
            self.completed
                .get(dep)
                .is_some_and(|t| t.status == TaskStatus::Completed)
        })
    }

    /// Transition a pending task to assigned, recording the drone.
    /// Returns false if the task is absent or not pending.
    pub fn assign(&mut self, task_id: Uuid, drone_id: Uuid) -> bool {
        let Some(task) = self
            .backlog
            .iter_mut()
            .find(|t| t.id == task_id && t.status == TaskStatus::Pending)
        else {
            return false;
        };
        task.status = TaskStatus::Assigned;
        task.assigned_drone = Some(drone_id);
        debug!(task_id = %task_id, drone_id = %drone_id, "Assigned task");
        true
    }

    /// Settle an assigned task as completed or failed, moving it from the
    /// backlog into the completed collection. Returns the archived task, or
    /// `None` if the id is absent (e.g. a duplicate completion callback).
    pub fn complete(&mut self, task_id: Uuid, success: bool) -> Option<Task> {
        let idx = self
            .backlog
            .iter()
            .position(|t| t.id == task_id && t.status == TaskStatus::Assigned)?;
        let mut task = self.backlog.remove(idx);
        task.status = if success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        debug!(task_id = %task_id, success, "Settled task");
        self.completed.insert(task.id, task.clone());
        Some(task)
    }

    /// Tasks currently in assigned status, in backlog order.
    pub fn assigned_tasks(&self) -> Vec<Task> {
        self.backlog
            .iter()
            .filter(|t| t.status == TaskStatus::Assigned)
            .cloned()
            .collect()
    }

    /// Number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.backlog
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }

    /// Read-only view of the completed-tasks collection.
    pub fn completed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.completed.values()
    }

    /// Read-only aggregate counts; used for observability and as scaling
    /// input, never mutates state.
    pub fn queue_stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total_completed: self.completed.len(),
            ..QueueStats::default()
        };

        for task in &self.backlog {
            *stats
                .by_drone_type
                .entry(task.required_drone_type)
                .or_insert(0) += 1;
            *stats.by_priority.entry(task.priority).or_insert(0) += 1;
            *stats.by_status.entry(task.status).or_insert(0) += 1;
            match task.status {
                TaskStatus::Pending => stats.total_pending += 1,
                TaskStatus::Assigned => stats.total_assigned += 1,
                TaskStatus::Completed | TaskStatus::Failed => {}
            }
        }
        stats
    }

    /// Expand a goal into a concrete, ordered task graph via its strategy
    /// template.
    ///
    /// Tasks generated for the same drone type within one goal are chained
    /// as a linear dependency sequence; tasks for different types are
    /// independent unless their template step explicitly depends on the
    /// preceding step.
    pub fn generate_tasks_for_goal(
        &self,
        goal: &StrategicGoal,
        context: &HashMap<String, serde_json::Value>,
    ) -> Vec<Task> {
        let mut tasks: Vec<Task> = Vec::new();
        let mut last_of_type: HashMap<DroneType, Uuid> = HashMap::new();
        let mut previous: Option<Uuid> = None;

        for step in strategy_template(goal.strategy) {
            let mut task = Task::new(
                format!("{}: {}", step.title_prefix, goal.title),
                step.description_template.replace("{goal}", &goal.description),
                step.drone_type,
            )
            .with_priority(goal.priority)
            .with_estimated_minutes(step.estimated_minutes)
            .with_goal(goal.id);

            for (key, value) in context {
                task = task.with_context(key.clone(), value.clone());
            }

            if let Some(&prev_same_type) = last_of_type.get(&step.drone_type) {
                task = task.with_dependency(prev_same_type);
            }
            if step.depends_on_previous {
                if let Some(prev) = previous {
                    task = task.with_dependency(prev);
                }
            }

            last_of_type.insert(step.drone_type, task.id);
            previous = Some(task.id);
            tasks.push(task);
        }

        debug!(goal = %goal.title, count = tasks.len(), "Generated tasks for goal");
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_task(priority: TaskPriority) -> Task {
        Task::new("Task", "Do something", DroneType::Worker).with_priority(priority)
    }

    fn expand_goal() -> StrategicGoal {
        StrategicGoal::new(
            "First Revenue",
            "Generate the first $100",
            StrategyType::Expand,
            "revenue",
            100.0,
        )
    }

    #[test]
    fn test_backlog_sorted_by_priority() {
        let mut planner = StrategicPlanner::new();
        planner.add_task(pending_task(TaskPriority::Low)).unwrap();
        planner.add_task(pending_task(TaskPriority::Critical)).unwrap();
        planner.add_task(pending_task(TaskPriority::Medium)).unwrap();

        let next = planner.next_task(None).unwrap();
        assert_eq!(next.priority, TaskPriority::Critical);
    }

    #[test]
    fn test_stable_sort_for_equal_priority() {
        let mut planner = StrategicPlanner::new();
        let first = pending_task(TaskPriority::High);
        let second = pending_task(TaskPriority::High);
        let first_id = first.id;

        planner.add_task(first).unwrap();
        planner.add_task(second).unwrap();

        assert_eq!(planner.next_task(None).unwrap().id, first_id);
    }

    #[test]
    fn test_next_task_filters_by_type() {
        let mut planner = StrategicPlanner::new();
        planner
            .add_task(Task::new("R", "Research", DroneType::Researcher))
            .unwrap();

        assert!(planner.next_task(Some(DroneType::Builder)).is_none());
        assert!(planner.next_task(Some(DroneType::Researcher)).is_some());
    }

    #[test]
    fn test_dependency_gates_next_task() {
        let mut planner = StrategicPlanner::new();
        let a = Task::new("A", "First", DroneType::Worker);
        let a_id = a.id;
        let b = Task::new("B", "Second", DroneType::Worker).with_dependency(a_id);
        let b_id = b.id;

        planner.add_task(a).unwrap();
        planner.add_task(b).unwrap();

        // B never surfaces while A is pending
        assert_eq!(planner.next_task(Some(DroneType::Worker)).unwrap().id, a_id);

        let drone = Uuid::new_v4();
        assert!(planner.assign(a_id, drone));
        assert!(planner.next_task(Some(DroneType::Worker)).is_none());

        planner.complete(a_id, true).unwrap();
        assert_eq!(planner.next_task(Some(DroneType::Worker)).unwrap().id, b_id);
    }

    #[test]
    fn test_failed_dependency_never_unblocks() {
        let mut planner = StrategicPlanner::new();
        let a = Task::new("A", "First", DroneType::Worker);
        let a_id = a.id;
        let b = Task::new("B", "Second", DroneType::Worker).with_dependency(a_id);

        planner.add_task(a).unwrap();
        planner.add_task(b).unwrap();

        planner.assign(a_id, Uuid::new_v4());
        planner.complete(a_id, false).unwrap();

        // A is archived as failed, so B stays ineligible
        assert!(planner.next_task(Some(DroneType::Worker)).is_none());
    }

    #[test]
    fn test_assign_unknown_task_is_benign() {
        let mut planner = StrategicPlanner::new();
        assert!(!planner.assign(Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut planner = StrategicPlanner::new();
        let task = pending_task(TaskPriority::Medium);
        let task_id = task.id;
        planner.add_task(task).unwrap();
        planner.assign(task_id, Uuid::new_v4());

        assert!(planner.complete(task_id, true).is_some());
        // Second settle for the same id is a no-op
        assert!(planner.complete(task_id, true).is_none());
        assert_eq!(planner.queue_stats().total_completed, 1);
    }

    #[test]
    fn test_complete_requires_assignment() {
        let mut planner = StrategicPlanner::new();
        let task = pending_task(TaskPriority::Medium);
        let task_id = task.id;
        planner.add_task(task).unwrap();

        assert!(planner.complete(task_id, true).is_none());
    }

    #[test]
    fn test_cycle_rejected_at_insertion() {
        let mut planner = StrategicPlanner::new();
        let mut a = Task::new("A", "First", DroneType::Worker);
        let b = Task::new("B", "Second", DroneType::Worker).with_dependency(a.id);
        a.dependencies.push(b.id);

        planner.add_task(b).unwrap();
        assert!(matches!(
            planner.add_task(a),
            Err(DomainError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_goal_progress_update() {
        let mut planner = StrategicPlanner::new();
        let goal = expand_goal();
        let goal_id = goal.id;
        planner.add_goal(goal).unwrap();

        assert!(planner.update_goal_progress(goal_id, 100.0));
        assert!(!planner.goal(goal_id).unwrap().is_active());

        // Lower later value never reopens
        assert!(planner.update_goal_progress(goal_id, 10.0));
        assert!(!planner.goal(goal_id).unwrap().is_active());

        assert!(!planner.update_goal_progress(Uuid::new_v4(), 1.0));
    }

    #[test]
    fn test_generate_tasks_expand_template() {
        let planner = StrategicPlanner::new();
        let goal = expand_goal();
        let tasks = planner.generate_tasks_for_goal(&goal, &HashMap::new());

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].required_drone_type, DroneType::Researcher);
        assert_eq!(tasks[1].required_drone_type, DroneType::Builder);
        assert_eq!(tasks[2].required_drone_type, DroneType::Seller);

        // Template declares the build step depends on the research step
        assert!(tasks[0].dependencies.is_empty());
        assert_eq!(tasks[1].dependencies, vec![tasks[0].id]);
        assert_eq!(tasks[2].dependencies, vec![tasks[1].id]);

        for task in &tasks {
            assert_eq!(task.goal_id, Some(goal.id));
            assert_eq!(task.priority, goal.priority);
        }
    }

    #[test]
    fn test_generate_tasks_pivot_independent_steps() {
        let planner = StrategicPlanner::new();
        let goal = StrategicGoal::new(
            "New Direction",
            "Change course",
            StrategyType::Pivot,
            "profit",
            50.0,
        );
        let tasks = planner.generate_tasks_for_goal(&goal, &HashMap::new());

        assert_eq!(tasks.len(), 3);
        // Researcher and analyst steps are independent of each other
        assert!(tasks[0].dependencies.is_empty());
        assert!(tasks[1].dependencies.is_empty());
        // The worker step explicitly depends on the preceding step
        assert_eq!(tasks[2].dependencies, vec![tasks[1].id]);
    }

    #[test]
    fn test_generated_graph_is_insertable() {
        let mut planner = StrategicPlanner::new();
        let goal = expand_goal();
        let mut context = HashMap::new();
        context.insert("budget".to_string(), serde_json::json!(100));

        for task in planner.generate_tasks_for_goal(&goal, &context) {
            assert_eq!(task.context.get("budget"), Some(&serde_json::json!(100)));
            planner.add_task(task).unwrap();
        }
        assert_eq!(planner.pending_count(), 3);
    }

    #[test]
    fn test_queue_stats() {
        let mut planner = StrategicPlanner::new();
        let t1 = Task::new("R", "Research", DroneType::Researcher)
            .with_priority(TaskPriority::High);
        let t1_id = t1.id;
        planner.add_task(t1).unwrap();
        planner
            .add_task(Task::new("B", "Build", DroneType::Builder))
            .unwrap();

        planner.assign(t1_id, Uuid::new_v4());

        let stats = planner.queue_stats();
        assert_eq!(stats.total_pending, 1);
        assert_eq!(stats.total_assigned, 1);
        assert_eq!(stats.total_completed, 0);
        assert_eq!(stats.by_drone_type[&DroneType::Researcher], 1);
        assert_eq!(stats.by_priority[&TaskPriority::High], 1);
        assert_eq!(stats.by_status[&TaskStatus::Assigned], 1);
    }
}
