//! Schedule records.
//!
//! The plain record bundle exchanged with the persistence collaborator.
//! A schedule is the unit of isolation: every task, dependency and
//! milestone in one bundle shares a `schedule_id`.

use serde::{Deserialize, Serialize};

use super::{Dependency, Milestone, Task};

/// Everything stored for one schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecords {
    /// Tasks on the schedule.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Precedence links between those tasks.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Milestones tracked on the schedule.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl ScheduleRecords {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Adds a dependency.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Adds a milestone.
    pub fn with_milestone(mut self, milestone: Milestone) -> Self {
        self.milestones.push(milestone);
        self
    }

    /// Finds a task by ID.
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Dependencies whose successor is `task_id`.
    pub fn dependencies_of(&self, task_id: &str) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.task_id == task_id)
            .collect()
    }

    /// Whether the bundle holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
