//! Milestone model.
//!
//! A milestone marks a target date on a schedule and tracks a set of tasks
//! whose completion it depends on. Only `status` is derived; everything
//! else is owned by the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Derived milestone status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    AtRisk,
    Complete,
}

/// A schedule milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique milestone identifier.
    pub id: String,
    /// Owning schedule.
    pub schedule_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Date the associated work should be finished by.
    pub target_date: NaiveDate,
    /// Derived status.
    #[serde(default)]
    pub status: MilestoneStatus,
    /// Tasks whose completion determines the status.
    #[serde(default)]
    pub task_ids: Vec<String>,
}

impl Milestone {
    /// Creates a pending milestone with no associated tasks.
    pub fn new(
        id: impl Into<String>,
        schedule_id: impl Into<String>,
        target_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            schedule_id: schedule_id.into(),
            name: String::new(),
            target_date,
            status: MilestoneStatus::Pending,
            task_ids: Vec::new(),
        }
    }

    /// Sets the milestone name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Associates a task.
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_ids.push(task_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let m = Milestone::new("M1", "S1", date)
            .with_name("Dry-in")
            .with_task("T1")
            .with_task("T2");
        assert_eq!(m.task_ids, vec!["T1", "T2"]);
        assert_eq!(m.status, MilestoneStatus::Pending);
        assert_eq!(m.name, "Dry-in");
    }
}
