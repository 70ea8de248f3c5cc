//! Date cascade after a single task moves.
//!
//! # Algorithm
//!
//! 1. Refuse to run on a cyclic graph.
//! 2. Collect the descendants of the moved task (the affected subgraph) and
//!    count, for each, how many of its predecessor links come from inside
//!    that subgraph.
//! 3. Walk the subgraph level by level (Kahn's algorithm): a task is
//!    visited once all of its affected predecessors have been, so a task
//!    with two moved predecessors is recomputed once, using both.
//! 4. A visited task is recomputed only if one of its predecessors actually
//!    changed; otherwise the branch stops moving there.
//! 5. New windows are staged and written to the graph in one step at the
//!    end.
//!
//! Tasks outside the affected subgraph are never read for writing, so
//! independent branches keep their dates.
//!
//! # Complexity
//! O(a + e_a) where a is the number of affected tasks and e_a the edges
//! touching them.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::error::{Result, ScheduleError};
use crate::graph::ScheduleGraph;
use crate::models::window::is_valid_duration;
use crate::models::{ConstraintViolation, DateWindow, TaskWindow, ViolationKind};
use crate::validation;

/// Outcome of a cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeResult {
    /// Tasks whose window changed, in propagation order.
    pub updated: Vec<TaskWindow>,
    /// Constraint conflicts met on the way.
    pub violations: Vec<ConstraintViolation>,
}

impl CascadeResult {
    /// Whether nothing moved and nothing was flagged.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.violations.is_empty()
    }

    /// The change recorded for a task, if it moved.
    pub fn window_of(&self, task_id: &str) -> Option<&TaskWindow> {
        self.updated.iter().find(|w| w.task_id == task_id)
    }

    /// Whether a task was flagged.
    pub fn is_flagged(&self, task_id: &str) -> bool {
        self.violations.iter().any(|v| v.task_id == task_id)
    }
}

/// Propagates a date change through dependent tasks.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use site_schedule::graph::ScheduleGraph;
/// use site_schedule::models::{Dependency, Task};
/// use site_schedule::scheduler::CascadePropagator;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let mut graph = ScheduleGraph::load(
///     vec![Task::new("A", "S1", day(1), 3), Task::new("B", "S1", day(4), 2)],
///     vec![Dependency::new("D1", "S1", "B", "A")],
/// )
/// .unwrap();
///
/// let result = CascadePropagator::new()
///     .apply_date_change(&mut graph, "A", day(3), day(5))
///     .unwrap();
///
/// assert_eq!(result.updated.len(), 2);
/// assert_eq!(graph.task("B").unwrap().start_date, day(6));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CascadePropagator {
    config: SchedulerConfig,
}

impl CascadePropagator {
    /// Creates a propagator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Moves `task_id` to `[new_start, new_end]` and cascades to its dependents.
    ///
    /// The task's duration follows the new window. If the window breaks the
    /// task's own constraint the edit still applies and a violation is
    /// reported. Repeating the same change reports no updates.
    pub fn apply_date_change(
        &self,
        graph: &mut ScheduleGraph,
        task_id: &str,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<CascadeResult> {
        let root = graph
            .index_of(task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;
        let window = DateWindow::new(new_start, new_end);
        if !window.is_valid() || !is_valid_duration(window.duration_days()) {
            return Err(ScheduleError::InvalidWindow {
                task_id: task_id.to_string(),
                start: new_start,
                end: new_end,
            });
        }
        validation::check_acyclic(graph)?;

        let task = graph.task_at(root);
        let moved = task.window() != window;
        let own_violation = (!task.constraint.is_satisfied_by(&window))
            .then(|| ConstraintViolation::broken_by_edit(task_id, task.constraint, window));

        let mut result = self.cascade(graph, root, window, moved)?;
        if let Some(v) = own_violation {
            result.violations.insert(0, v);
        }
        Ok(result)
    }

    /// Re-runs the cascade from `task_id` without moving it.
    ///
    /// Used after structural edits (for example a new dependency) to bring
    /// the task's dependents back in line.
    pub fn propagate(&self, graph: &mut ScheduleGraph, task_id: &str) -> Result<CascadeResult> {
        let root = graph
            .index_of(task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;
        validation::check_acyclic(graph)?;
        let window = graph.task_at(root).window();
        self.cascade(graph, root, window, true)
    }

    fn cascade(
        &self,
        graph: &mut ScheduleGraph,
        root: usize,
        root_window: DateWindow,
        root_dirty: bool,
    ) -> Result<CascadeResult> {
        let n = graph.len();

        let mut affected = vec![false; n];
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            for link in graph.successors_at(i) {
                if !affected[link.index] {
                    affected[link.index] = true;
                    stack.push(link.index);
                }
            }
        }

        let mut pending = vec![0usize; n];
        for i in (0..n).filter(|&i| affected[i]) {
            pending[i] = graph
                .predecessors_at(i)
                .iter()
                .filter(|l| l.index == root || affected[l.index])
                .count();
        }

        let mut staged: HashMap<usize, DateWindow> = HashMap::new();
        staged.insert(root, root_window);
        let mut dirty = vec![false; n];
        dirty[root] = root_dirty;
        let mut changed = Vec::new();
        if graph.task_at(root).window() != root_window {
            changed.push(root);
        }
        let mut violations = Vec::new();

        let mut queue = VecDeque::from([root]);
        while let Some(i) = queue.pop_front() {
            if i != root && graph.predecessors_at(i).iter().any(|l| dirty[l.index]) {
                let (window, violation) = self.recompute(graph, i, &staged)?;
                violations.extend(violation);
                if window != graph.task_at(i).window() {
                    debug!(
                        task_id = %graph.task_at(i).id,
                        start = %window.start,
                        end = %window.end,
                        "cascade moved task"
                    );
                    staged.insert(i, window);
                    dirty[i] = true;
                    changed.push(i);
                }
            }
            for link in graph.successors_at(i) {
                pending[link.index] -= 1;
                if pending[link.index] == 0 {
                    queue.push_back(link.index);
                }
            }
        }

        let mut updated = Vec::with_capacity(changed.len());
        for i in changed {
            let new = staged[&i];
            let task = graph.task_at(i);
            updated.push(TaskWindow {
                task_id: task.id.clone(),
                old: task.window(),
                new,
            });
            graph.set_window_at(i, new);
        }

        info!(
            schedule_id = %graph.schedule_id(),
            task_id = %graph.task_at(root).id,
            affected = affected.iter().filter(|&&a| a).count(),
            updated = updated.len(),
            violations = violations.len(),
            "cascade complete"
        );

        Ok(CascadeResult {
            updated,
            violations,
        })
    }

    /// New window for task `i` from its predecessors' (possibly staged) windows.
    fn recompute(
        &self,
        graph: &ScheduleGraph,
        i: usize,
        staged: &HashMap<usize, DateWindow>,
    ) -> Result<(DateWindow, Option<ConstraintViolation>)> {
        let task = graph.task_at(i);
        let window_of = |j: usize| {
            staged
                .get(&j)
                .copied()
                .unwrap_or_else(|| graph.task_at(j).window())
        };

        let out_of_range = || ScheduleError::DateOutOfRange(task.id.clone());
        let mut driving: Option<NaiveDate> = None;
        for l in graph.predecessors_at(i) {
            let start = l
                .dependency_type
                .driving_start(&window_of(l.index), l.lag_days, task.duration_days)
                .ok_or_else(out_of_range)?;
            driving = driving.max(Some(start));
        }
        let Some(mut driving) = driving else {
            return Ok((task.window(), None));
        };
        if !self.config.pull_forward {
            driving = driving.max(task.start_date);
        }

        if self.config.lock_completed && task.is_complete() {
            let violation = (driving > task.start_date).then(|| {
                ConstraintViolation::new(
                    &task.id,
                    ViolationKind::LockedTaskConflict,
                    task.constraint,
                    driving,
                    task.start_date,
                )
            });
            return Ok((task.window(), violation));
        }

        let resolution = task
            .constraint
            .resolve(driving, task.duration_days)
            .ok_or_else(out_of_range)?;
        let violation = resolution.conflict.map(|kind| {
            ConstraintViolation::new(
                &task.id,
                kind,
                task.constraint,
                driving,
                resolution.window.start,
            )
        });
        Ok((resolution.window, violation))
    }
}
