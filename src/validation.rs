//! Input validation and cycle detection.
//!
//! Two entry points guard the scheduling passes:
//!
//! - [`validate_input`] checks raw records before a graph is built and
//!   collects every issue it finds (duplicate IDs, bad durations,
//!   inconsistent windows, bad edges, cycles).
//! - [`find_cycle`] / [`would_create_cycle`] run against a built
//!   [`ScheduleGraph`] before every cascade, auto-schedule pass and
//!   dependency insertion.
//!
//! Both traversals use an explicit stack, so deep chains cannot exhaust
//! the call stack.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3-22.4 (DFS, Topological Sort)

use std::collections::{HashMap, HashSet};

use crate::error::CycleError;
use crate::graph::ScheduleGraph;
use crate::models::window::{is_valid_lag, MAX_SPAN_DAYS};
use crate::models::{Dependency, Task};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A task's duration is zero, negative or longer than `MAX_SPAN_DAYS`.
    InvalidDuration,
    /// A dependency's lag exceeds `MAX_SPAN_DAYS` either way.
    InvalidLag,
    /// An unconstrained task's end date disagrees with its duration.
    InconsistentWindow,
    /// Records from more than one schedule were mixed.
    ScheduleMismatch,
    /// A dependency points a task at itself.
    SelfLoop,
    /// A dependency references a task that doesn't exist.
    InvalidTaskReference,
    /// Dependency graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the records of one schedule.
///
/// Checks:
/// 1. No duplicate task IDs
/// 2. No duplicate dependency IDs
/// 3. All records share the first task's schedule
/// 4. Every duration is in `1..=MAX_SPAN_DAYS`, every lag within `±MAX_SPAN_DAYS`
/// 5. Unconstrained tasks satisfy `end = start + duration - 1`
/// 6. No self-loops, no references to unknown tasks
/// 7. No circular dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(tasks: &[Task], dependencies: &[Dependency]) -> ValidationResult {
    let mut errors = Vec::new();
    let schedule_id = tasks.first().map(|t| t.schedule_id.as_str());

    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }
        if Some(task.schedule_id.as_str()) != schedule_id {
            errors.push(ValidationError::new(
                ValidationErrorKind::ScheduleMismatch,
                format!(
                    "Task '{}' belongs to schedule '{}'",
                    task.id, task.schedule_id
                ),
            ));
        }
        if !task.has_valid_duration() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!(
                    "Task '{}' has duration {}, expected 1..={}",
                    task.id, task.duration_days, MAX_SPAN_DAYS
                ),
            ));
        } else if !task.constraint.is_active() && !task.is_window_consistent() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentWindow,
                format!(
                    "Task '{}' spans {} .. {} but lasts {} days",
                    task.id, task.start_date, task.end_date, task.duration_days
                ),
            ));
        }
    }

    let mut dependency_ids = HashSet::new();
    for dep in dependencies {
        if !dependency_ids.insert(dep.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate dependency ID: {}", dep.id),
            ));
        }
        if schedule_id.is_some_and(|s| s != dep.schedule_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::ScheduleMismatch,
                format!(
                    "Dependency '{}' belongs to schedule '{}'",
                    dep.id, dep.schedule_id
                ),
            ));
        }
        if !is_valid_lag(dep.lag_days) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidLag,
                format!(
                    "Dependency '{}' has lag {} days, expected at most {} either way",
                    dep.id, dep.lag_days, MAX_SPAN_DAYS
                ),
            ));
        }
        if dep.is_self_loop() {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfLoop,
                format!("Dependency '{}' makes '{}' depend on itself", dep.id, dep.task_id),
            ));
        }
        for endpoint in [&dep.task_id, &dep.depends_on_task_id] {
            if !task_ids.contains(endpoint.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTaskReference,
                    format!(
                        "Dependency '{}' references unknown task '{}'",
                        dep.id, endpoint
                    ),
                ));
            }
        }
    }

    // Cycle detection needs a well-formed graph; skip it when loading fails.
    if errors.is_empty() {
        if let Ok(graph) = ScheduleGraph::load(tasks.to_vec(), dependencies.to_vec()) {
            if let Some(cycle) = find_cycle(&graph) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::CyclicDependency,
                    CycleError::new(cycle).to_string(),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Finds a cycle in the whole graph, if any.
///
/// # Algorithm
/// Three-colour DFS: white = unvisited, gray = on the current path,
/// black = finished. An edge into a gray node closes a cycle; the gray
/// path from that node to the top of the stack is returned.
pub fn find_cycle(graph: &ScheduleGraph) -> Option<Vec<String>> {
    let n = graph.len();
    let mut color = vec![Color::White; n];

    for root in 0..n {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Gray;
        // (node, position of the next successor to visit)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let successors = graph.successors_at(node);
            if frame.1 == successors.len() {
                color[node] = Color::Black;
                stack.pop();
                continue;
            }
            let next = successors[frame.1].index;
            frame.1 += 1;

            match color[next] {
                Color::White => {
                    color[next] = Color::Gray;
                    stack.push((next, 0));
                }
                Color::Gray => {
                    let start = stack.iter().position(|&(i, _)| i == next).unwrap_or(0);
                    return Some(
                        stack[start..]
                            .iter()
                            .map(|&(i, _)| graph.task_at(i).id.clone())
                            .collect(),
                    );
                }
                Color::Black => {}
            }
        }
    }

    None
}

/// Verifies the graph is a DAG.
pub fn check_acyclic(graph: &ScheduleGraph) -> Result<(), CycleError> {
    match find_cycle(graph) {
        Some(cycle) => Err(CycleError::new(cycle)),
        None => Ok(()),
    }
}

/// Checks whether adding "`task_id` depends on `depends_on`" would close a cycle.
///
/// Searches the descendants of `task_id`; if `depends_on` is reachable the
/// new edge would complete a loop. Returns that loop, starting at
/// `task_id` and ending at `depends_on`. Unknown ids never form a cycle.
pub fn would_create_cycle(
    graph: &ScheduleGraph,
    task_id: &str,
    depends_on: &str,
) -> Option<Vec<String>> {
    if task_id == depends_on {
        return Some(vec![task_id.to_string()]);
    }
    let from = graph.index_of(task_id)?;
    let target = graph.index_of(depends_on)?;

    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut visited = vec![false; graph.len()];
    let mut stack = vec![from];
    visited[from] = true;

    while let Some(node) = stack.pop() {
        if node == target {
            let mut path = vec![node];
            let mut cur = node;
            while let Some(&p) = parent.get(&cur) {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(
                path.into_iter()
                    .map(|i| graph.task_at(i).id.clone())
                    .collect(),
            );
        }
        for link in graph.successors_at(node) {
            if !visited[link.index] {
                visited[link.index] = true;
                parent.insert(link.index, node);
                stack.push(link.index);
            }
        }
    }

    None
}
