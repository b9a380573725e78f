//! Dependency validation for the task backlog.
//!
//! Cycles and self-references are configuration errors and must be rejected
//! when a task is inserted, not discovered at scheduling time.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Task;

/// Service for detecting circular dependencies among tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyResolver;

/// DFS bookkeeping: globally visited nodes, the current descent, and the
/// path that produced it.
#[derive(Default)]
struct DfsState {
    visited: HashSet<Uuid>,
    on_path: HashSet<Uuid>,
    path: Vec<Uuid>,
}

/// Walk the dependency edges from `node`, returning the offending cycle
/// as soon as an edge lands back on the current descent path.
fn find_cycle_from(
    node: Uuid,
    graph: &HashMap<Uuid, Vec<Uuid>>,
    state: &mut DfsState,
) -> Option<Vec<Uuid>> {
    state.visited.insert(node);
    state.on_path.insert(node);
    state.path.push(node);

    for &dep in graph.get(&node).map(Vec::as_slice).unwrap_or_default() {
        if state.on_path.contains(&dep) {
            let start = state.path.iter().position(|&id| id == dep).unwrap_or(0);
            return Some(state.path[start..].to_vec());
        }
        if !state.visited.contains(&dep) {
            if let Some(cycle) = find_cycle_from(dep, graph, state) {
                return Some(cycle);
            }
        }
    }

    state.on_path.remove(&node);
    state.path.pop();
    None
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Check a candidate task against the existing backlog.
    ///
    /// Rejects self-dependencies and any dependency path through the backlog
    /// that loops back to the candidate. Dependencies on unknown ids are
    /// allowed; they may refer to already-completed tasks.
    pub fn check_insertion(&self, candidate: &Task, backlog: &[Task]) -> DomainResult<()> {
        if candidate.dependencies.contains(&candidate.id) {
            return Err(DomainError::SelfDependency(candidate.id));
        }

        let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in backlog {
            graph
                .entry(task.id)
                .or_default()
                .extend(task.dependencies.iter().copied());
        }
        graph
            .entry(candidate.id)
            .or_default()
            .extend(candidate.dependencies.iter().copied());

        if let Some(cycle) = detect_cycle(&graph) {
            return Err(DomainError::DependencyCycle(cycle));
        }
        Ok(())
    }

    /// Detect a circular dependency in a set of tasks, returning the cycle
    /// path if one exists.
    pub fn detect_cycle(&self, tasks: &[Task]) -> Option<Vec<Uuid>> {
        let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in tasks {
            graph
                .entry(task.id)
                .or_default()
                .extend(task.dependencies.iter().copied());
        }
        detect_cycle(&graph)
    }
}

fn detect_cycle(graph: &HashMap<Uuid, Vec<Uuid>>) -> Option<Vec<Uuid>> {
    let mut state = DfsState::default();
    for &root in graph.keys() {
        if state.visited.contains(&root) {
            continue;
        }
        if let Some(cycle) = find_cycle_from(root, graph, &mut state) {
            return Some(cycle);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DroneType;

    fn task_with_deps(deps: Vec<Uuid>) -> Task {
        let mut task = Task::new("Test", "Description", DroneType::Worker);
        task.dependencies = deps;
        task
    }

    #[test]
    fn test_no_cycle() {
        let resolver = DependencyResolver::new();
        let a = task_with_deps(vec![]);
        let b = task_with_deps(vec![a.id]);

        assert!(resolver.detect_cycle(&[a.clone(), b.clone()]).is_none());
        assert!(resolver.check_insertion(&b, &[a]).is_ok());
    }

    #[test]
    fn test_two_node_cycle() {
        let resolver = DependencyResolver::new();
        let mut a = task_with_deps(vec![]);
        let b = task_with_deps(vec![a.id]);
        a.dependencies = vec![b.id];

        assert!(resolver.detect_cycle(&[a.clone(), b.clone()]).is_some());
        assert!(matches!(
            resolver.check_insertion(&a, &[b]),
            Err(DomainError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let resolver = DependencyResolver::new();
        let mut task = task_with_deps(vec![]);
        let id = task.id;
        task.dependencies = vec![id];

        assert!(matches!(
            resolver.check_insertion(&task, &[]),
            Err(DomainError::SelfDependency(_))
        ));
    }

    #[test]
    fn test_unknown_dependency_allowed() {
        // Unknown ids may be tasks that already completed and were archived
        let resolver = DependencyResolver::new();
        let task = task_with_deps(vec![Uuid::new_v4()]);
        assert!(resolver.check_insertion(&task, &[]).is_ok());
    }

    #[test]
    fn test_cycle_path_names_participants() {
        let resolver = DependencyResolver::new();
        let mut a = task_with_deps(vec![]);
        let b = task_with_deps(vec![a.id]);
        a.dependencies = vec![b.id];

        let cycle = resolver.detect_cycle(&[a.clone(), b.clone()]).unwrap();
        assert!(cycle.contains(&a.id));
        assert!(cycle.contains(&b.id));
        assert_eq!(cycle.len(), 2);
    }

    #[test]
    fn test_three_node_cycle() {
        let resolver = DependencyResolver::new();
        let mut a = task_with_deps(vec![]);
        let mut b = task_with_deps(vec![]);
        let c = task_with_deps(vec![b.id]);
        b.dependencies = vec![a.id];
        a.dependencies = vec![c.id];

        assert!(resolver.detect_cycle(&[a, b, c]).is_some());
    }
}
