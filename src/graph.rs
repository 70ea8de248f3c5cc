//! In-memory dependency graph for one schedule.
//!
//! [`ScheduleGraph`] owns the tasks and dependencies of a single schedule
//! and answers structural queries. It is built fresh from records for each
//! request and handed back as records afterwards; nothing about it is
//! shared between requests.
//!
//! # Complexity
//! Construction is O(n + e). Direct predecessor/successor lookups are a
//! hash lookup plus a slice borrow.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use site_schedule::graph::ScheduleGraph;
//! use site_schedule::models::{Dependency, Task};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let graph = ScheduleGraph::load(
//!     vec![Task::new("A", "S1", start, 3), Task::new("B", "S1", start, 2)],
//!     vec![Dependency::new("D1", "S1", "B", "A")],
//! )
//! .unwrap();
//!
//! assert_eq!(graph.successors_of("A")[0].task_id, "B");
//! assert_eq!(graph.topological_order().unwrap(), vec!["A", "B"]);
//! ```

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{CycleError, InvalidEdgeError, InvalidEdgeReason, Result, ScheduleError};
use crate::models::window::{is_valid_lag, MAX_SPAN_DAYS};
use crate::models::{DateWindow, Dependency, DependencyType, Task};
use crate::validation;

/// One side of a dependency edge as seen from a task.
///
/// In `predecessors_of(x)` the link names a predecessor of `x`; in
/// `successors_of(x)` it names a successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The task at the other end of the edge.
    pub task_id: String,
    /// Dependency record this link came from.
    pub dependency_id: String,
    /// Precedence relation.
    pub dependency_type: DependencyType,
    /// Signed lag in days.
    pub lag_days: i64,
    pub(crate) index: usize,
}

/// Tasks and dependency edges of one schedule.
#[derive(Debug, Clone)]
pub struct ScheduleGraph {
    schedule_id: String,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    index: HashMap<String, usize>,
    predecessors: Vec<Vec<Link>>,
    successors: Vec<Vec<Link>>,
}

impl ScheduleGraph {
    /// Builds a graph from plain records.
    ///
    /// Fails on duplicate task ids, tasks from another schedule, durations
    /// outside `1..=MAX_SPAN_DAYS`, lags beyond `±MAX_SPAN_DAYS`, self-loops
    /// and cross-schedule edges. Dependencies whose endpoints are missing are
    /// dropped, as are exact duplicates of an edge already loaded. Cycles are
    /// not checked here; see [`topological_order`](Self::topological_order).
    pub fn load(tasks: Vec<Task>, dependencies: Vec<Dependency>) -> Result<Self> {
        let schedule_id = tasks
            .first()
            .map(|t| t.schedule_id.clone())
            .or_else(|| dependencies.first().map(|d| d.schedule_id.clone()))
            .unwrap_or_default();

        let mut graph = Self {
            schedule_id,
            tasks: Vec::with_capacity(tasks.len()),
            dependencies: Vec::with_capacity(dependencies.len()),
            index: HashMap::with_capacity(tasks.len()),
            predecessors: Vec::new(),
            successors: Vec::new(),
        };

        for task in tasks {
            if task.schedule_id != graph.schedule_id {
                return Err(ScheduleError::ScheduleMismatch {
                    task_id: task.id,
                    expected: graph.schedule_id,
                    found: task.schedule_id,
                });
            }
            if graph.index.contains_key(&task.id) {
                return Err(ScheduleError::DuplicateTask(task.id));
            }
            if !task.has_valid_duration() {
                return Err(invalid_duration(&task));
            }
            graph.index.insert(task.id.clone(), graph.tasks.len());
            graph.tasks.push(task);
        }

        let mut seen = HashSet::with_capacity(dependencies.len());
        let mut dropped = 0usize;
        for dep in dependencies {
            graph.check_edge(&dep)?;
            check_lag(&dep)?;
            if !graph.index.contains_key(&dep.task_id)
                || !graph.index.contains_key(&dep.depends_on_task_id)
            {
                warn!(
                    schedule_id = %graph.schedule_id,
                    dependency_id = %dep.id,
                    "dropping dependency with a missing endpoint"
                );
                dropped += 1;
                continue;
            }
            let key = (
                dep.task_id.clone(),
                dep.depends_on_task_id.clone(),
                dep.dependency_type,
                dep.lag_days,
            );
            if !seen.insert(key) {
                debug!(dependency_id = %dep.id, "skipping duplicate dependency");
                continue;
            }
            graph.dependencies.push(dep);
        }

        graph.reindex();
        debug!(
            schedule_id = %graph.schedule_id,
            tasks = graph.tasks.len(),
            dependencies = graph.dependencies.len(),
            dropped,
            "loaded schedule graph"
        );
        Ok(graph)
    }

    /// Owning schedule.
    pub fn schedule_id(&self) -> &str {
        &self.schedule_id
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether `task_id` is on this schedule.
    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    /// Finds a task by ID.
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.index.get(task_id).map(|&i| &self.tasks[i])
    }

    /// All tasks in load order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// All accepted dependencies.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Direct predecessors of a task. Unknown ids have none.
    pub fn predecessors_of(&self, task_id: &str) -> &[Link] {
        match self.index.get(task_id) {
            Some(&i) => &self.predecessors[i],
            None => &[],
        }
    }

    /// Direct successors of a task. Unknown ids have none.
    pub fn successors_of(&self, task_id: &str) -> &[Link] {
        match self.index.get(task_id) {
            Some(&i) => &self.successors[i],
            None => &[],
        }
    }

    /// Task ids ordered so every predecessor precedes its successors.
    ///
    /// Ties are broken by load order, so the result is deterministic.
    pub fn topological_order(&self) -> std::result::Result<Vec<String>, CycleError> {
        Ok(self
            .topological_indices()?
            .into_iter()
            .map(|i| self.tasks[i].id.clone())
            .collect())
    }

    /// Adds a dependency after validating it.
    ///
    /// Self-loops, cross-schedule edges and unknown endpoints are rejected
    /// with [`InvalidEdgeError`], an out-of-range lag with
    /// [`ScheduleError::InvalidInput`]; an edge that would close a loop is rejected
    /// with [`CycleError`]. The graph is unchanged on failure. Inserting an
    /// edge identical to an existing one is a no-op.
    pub fn insert_dependency(&mut self, dep: Dependency) -> Result<()> {
        self.check_edge(&dep)?;
        check_lag(&dep)?;
        for endpoint in [&dep.task_id, &dep.depends_on_task_id] {
            if !self.contains(endpoint) {
                return Err(InvalidEdgeError {
                    dependency_id: dep.id.clone(),
                    reason: InvalidEdgeReason::UnknownTask(endpoint.clone()),
                }
                .into());
            }
        }
        if let Some(cycle) =
            validation::would_create_cycle(self, &dep.task_id, &dep.depends_on_task_id)
        {
            warn!(dependency_id = %dep.id, ?cycle, "rejected dependency that closes a cycle");
            return Err(CycleError::new(cycle).into());
        }
        if self.has_edge(&dep) {
            return Ok(());
        }

        let succ = self.index[&dep.task_id];
        let pred = self.index[&dep.depends_on_task_id];
        self.predecessors[succ].push(Self::link(&dep, &self.tasks[pred].id, pred));
        self.successors[pred].push(Self::link(&dep, &self.tasks[succ].id, succ));
        debug!(dependency_id = %dep.id, "inserted dependency");
        self.dependencies.push(dep);
        Ok(())
    }

    /// Removes a dependency by ID.
    pub fn remove_dependency(&mut self, dependency_id: &str) -> Option<Dependency> {
        let pos = self
            .dependencies
            .iter()
            .position(|d| d.id == dependency_id)?;
        let dep = self.dependencies.remove(pos);
        let succ = self.index[&dep.task_id];
        let pred = self.index[&dep.depends_on_task_id];
        self.predecessors[succ].retain(|l| l.dependency_id != dependency_id);
        self.successors[pred].retain(|l| l.dependency_id != dependency_id);
        Some(dep)
    }

    /// Removes a task together with every incident dependency.
    ///
    /// Rebuilds the adjacency lists in O(n + e).
    pub fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        let pos = *self.index.get(task_id)?;
        let task = self.tasks.remove(pos);
        let before = self.dependencies.len();
        self.dependencies
            .retain(|d| d.task_id != task_id && d.depends_on_task_id != task_id);
        debug!(
            task_id,
            removed_edges = before - self.dependencies.len(),
            "removed task"
        );
        self.reindex();
        Some(task)
    }

    /// Consumes the graph, returning its records.
    pub fn into_parts(self) -> (Vec<Task>, Vec<Dependency>) {
        (self.tasks, self.dependencies)
    }

    // ---- index-based access for the scheduling passes ----

    pub(crate) fn index_of(&self, task_id: &str) -> Option<usize> {
        self.index.get(task_id).copied()
    }

    pub(crate) fn task_at(&self, index: usize) -> &Task {
        &self.tasks[index]
    }

    pub(crate) fn predecessors_at(&self, index: usize) -> &[Link] {
        &self.predecessors[index]
    }

    pub(crate) fn successors_at(&self, index: usize) -> &[Link] {
        &self.successors[index]
    }

    pub(crate) fn set_window_at(&mut self, index: usize, window: DateWindow) {
        self.tasks[index].set_window(window);
    }

    pub(crate) fn set_critical_at(&mut self, index: usize, critical: bool) {
        self.tasks[index].is_critical = critical;
    }

    /// Kahn's algorithm with a min-heap over load positions.
    pub(crate) fn topological_indices(&self) -> std::result::Result<Vec<usize>, CycleError> {
        let n = self.tasks.len();
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for link in &self.successors[i] {
                in_degree[link.index] -= 1;
                if in_degree[link.index] == 0 {
                    ready.push(Reverse(link.index));
                }
            }
        }

        if order.len() == n {
            return Ok(order);
        }
        let cycle = validation::find_cycle(self).unwrap_or_else(|| {
            (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.tasks[i].id.clone())
                .collect()
        });
        Err(CycleError::new(cycle))
    }

    fn check_edge(&self, dep: &Dependency) -> Result<()> {
        let reason = if dep.is_self_loop() {
            InvalidEdgeReason::SelfLoop
        } else if dep.schedule_id != self.schedule_id {
            InvalidEdgeReason::CrossSchedule {
                expected: self.schedule_id.clone(),
                found: dep.schedule_id.clone(),
            }
        } else {
            return Ok(());
        };
        Err(InvalidEdgeError {
            dependency_id: dep.id.clone(),
            reason,
        }
        .into())
    }

    fn has_edge(&self, dep: &Dependency) -> bool {
        self.predecessors_of(&dep.task_id).iter().any(|l| {
            l.task_id == dep.depends_on_task_id
                && l.dependency_type == dep.dependency_type
                && l.lag_days == dep.lag_days
        })
    }

    fn link(dep: &Dependency, other_id: &str, other_index: usize) -> Link {
        Link {
            task_id: other_id.to_string(),
            dependency_id: dep.id.clone(),
            dependency_type: dep.dependency_type,
            lag_days: dep.lag_days,
            index: other_index,
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        self.predecessors = vec![Vec::new(); self.tasks.len()];
        self.successors = vec![Vec::new(); self.tasks.len()];
        for dep in &self.dependencies {
            let succ = self.index[&dep.task_id];
            let pred = self.index[&dep.depends_on_task_id];
            self.predecessors[succ].push(Self::link(dep, &dep.depends_on_task_id, pred));
            self.successors[pred].push(Self::link(dep, &dep.task_id, succ));
        }
    }
}

fn invalid_duration(task: &Task) -> ScheduleError {
    ScheduleError::InvalidInput(format!(
        "task {} has duration {} days, expected 1..={}",
        task.id, task.duration_days, MAX_SPAN_DAYS
    ))
}

fn check_lag(dep: &Dependency) -> Result<()> {
    if is_valid_lag(dep.lag_days) {
        return Ok(());
    }
    Err(ScheduleError::InvalidInput(format!(
        "dependency {} has lag {} days, expected at most {} either way",
        dep.id, dep.lag_days, MAX_SPAN_DAYS
    )))
}
