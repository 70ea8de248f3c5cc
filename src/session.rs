//! Request-scoped entry points.
//!
//! A [`ScheduleSession`] wraps the graph of one schedule for the length of
//! one request: load records, apply edits or a full recompute, re-evaluate
//! milestones, hand the records back for persistence. Mutating methods
//! take `&mut self`, so edits against one session are serialized by the
//! borrow checker; sessions for different schedules share nothing and can
//! run on different threads.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use site_schedule::config::SchedulerConfig;
//! use site_schedule::models::{Dependency, ScheduleRecords, Task};
//! use site_schedule::session::{MemorySource, ScheduleSession};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let records = ScheduleRecords::new()
//!     .with_task(Task::new("A", "S1", day(1), 3))
//!     .with_task(Task::new("B", "S1", day(1), 2))
//!     .with_dependency(Dependency::new("D1", "S1", "B", "A"));
//! let source = MemorySource::new().with_schedule("S1", records);
//!
//! let mut session = ScheduleSession::open(&source, "S1", SchedulerConfig::default()).unwrap();
//! let cpm = session.recompute_schedule(day(1)).unwrap();
//! assert_eq!(cpm.critical_path, vec!["A", "B"]);
//!
//! let records = session.into_records();
//! assert_eq!(records.task("B").unwrap().start_date, day(4));
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::error::{Result, ScheduleError};
use crate::graph::ScheduleGraph;
use crate::milestones::{self, MilestoneChange};
use crate::models::{Dependency, Milestone, ScheduleRecords, Task};
use crate::scheduler::{AutoScheduler, CascadePropagator, CascadeResult, CpmResult, ScheduleKpi};

/// Supplies the records of a schedule.
///
/// Implemented by the persistence layer; the core never performs I/O
/// itself.
pub trait ScheduleSource {
    /// Loads every task, dependency and milestone of `schedule_id`.
    fn load_schedule(&self, schedule_id: &str) -> Result<ScheduleRecords>;
}

/// A [`ScheduleSource`] backed by a map, for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    schedules: HashMap<String, ScheduleRecords>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the records of a schedule.
    pub fn with_schedule(mut self, schedule_id: impl Into<String>, records: ScheduleRecords) -> Self {
        self.schedules.insert(schedule_id.into(), records);
        self
    }
}

impl ScheduleSource for MemorySource {
    fn load_schedule(&self, schedule_id: &str) -> Result<ScheduleRecords> {
        self.schedules
            .get(schedule_id)
            .cloned()
            .ok_or_else(|| ScheduleError::Source(format!("unknown schedule {schedule_id}")))
    }
}

/// One schedule loaded for one request.
#[derive(Debug, Clone)]
pub struct ScheduleSession {
    graph: ScheduleGraph,
    milestones: Vec<Milestone>,
    cascade: CascadePropagator,
    auto: AutoScheduler,
}

impl ScheduleSession {
    /// Loads `schedule_id` from `source`.
    pub fn open(
        source: &impl ScheduleSource,
        schedule_id: &str,
        config: SchedulerConfig,
    ) -> Result<Self> {
        let records = source.load_schedule(schedule_id)?;
        if let Some(task) = records.tasks.iter().find(|t| t.schedule_id != schedule_id) {
            return Err(ScheduleError::ScheduleMismatch {
                task_id: task.id.clone(),
                expected: schedule_id.to_string(),
                found: task.schedule_id.clone(),
            });
        }
        let session = Self::from_records(records, config)?;
        info!(
            schedule_id,
            tasks = session.graph.len(),
            milestones = session.milestones.len(),
            "opened schedule session"
        );
        Ok(session)
    }

    /// Builds a session from records already in hand.
    pub fn from_records(records: ScheduleRecords, config: SchedulerConfig) -> Result<Self> {
        let ScheduleRecords {
            tasks,
            dependencies,
            milestones,
        } = records;
        let graph = ScheduleGraph::load(tasks, dependencies)?;
        if let Some(m) = milestones
            .iter()
            .find(|m| !graph.is_empty() && m.schedule_id != graph.schedule_id())
        {
            return Err(ScheduleError::InvalidInput(format!(
                "milestone {} belongs to schedule {}, expected {}",
                m.id,
                m.schedule_id,
                graph.schedule_id()
            )));
        }
        Ok(Self {
            graph,
            milestones,
            cascade: CascadePropagator::new().with_config(config.clone()),
            auto: AutoScheduler::new().with_config(config),
        })
    }

    /// The schedule graph.
    pub fn graph(&self) -> &ScheduleGraph {
        &self.graph
    }

    /// Milestones with their last evaluated status.
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Moves a task and cascades to its dependents.
    pub fn apply_date_change(
        &mut self,
        task_id: &str,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<CascadeResult> {
        self.cascade
            .apply_date_change(&mut self.graph, task_id, new_start, new_end)
    }

    /// Re-runs the cascade from a task without moving it.
    pub fn propagate(&mut self, task_id: &str) -> Result<CascadeResult> {
        self.cascade.propagate(&mut self.graph, task_id)
    }

    /// Adds a dependency, rejecting invalid edges and cycles.
    ///
    /// Dates are not touched; follow with [`propagate`](Self::propagate)
    /// on the predecessor or a full [`recompute_schedule`](Self::recompute_schedule).
    pub fn insert_dependency(&mut self, dependency: Dependency) -> Result<()> {
        self.graph.insert_dependency(dependency)
    }

    /// Removes a dependency.
    pub fn remove_dependency(&mut self, dependency_id: &str) -> Option<Dependency> {
        self.graph.remove_dependency(dependency_id)
    }

    /// Removes a task and its incident dependencies.
    pub fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        self.graph.remove_task(task_id)
    }

    /// Recomputes the whole schedule from `project_start`.
    pub fn recompute_schedule(&mut self, project_start: NaiveDate) -> Result<CpmResult> {
        self.auto.schedule(&mut self.graph, project_start)
    }

    /// Re-derives milestone statuses from the current task state.
    pub fn evaluate_milestones(&mut self) -> Vec<MilestoneChange> {
        milestones::evaluate_milestones(&mut self.milestones, &self.graph)
    }

    /// Summary metrics for the current state.
    pub fn kpi(&self) -> ScheduleKpi {
        ScheduleKpi::calculate(&self.graph, &self.milestones)
    }

    /// Hands the records back for persistence.
    pub fn into_records(self) -> ScheduleRecords {
        let (tasks, dependencies) = self.graph.into_parts();
        ScheduleRecords {
            tasks,
            dependencies,
            milestones: self.milestones,
        }
    }
}
