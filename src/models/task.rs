//! Task model.
//!
//! A task is one bar on the schedule: a named unit of work with a
//! duration in whole days, an inclusive date window, an optional date
//! constraint, and a progress status.
//!
//! Outside of tests, task dates are only rewritten by the cascade
//! propagator and the auto-scheduler. Writing `start_date`/`end_date`
//! directly leaves dependents out of sync.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::window::{add_days, is_valid_duration, DateWindow};
use super::DateConstraint;

/// Progress status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// A scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque task identifier.
    pub id: String,
    /// Owning schedule.
    pub schedule_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Duration in whole days (positive).
    pub duration_days: i64,
    /// First day of work.
    pub start_date: NaiveDate,
    /// Last day of work (inclusive).
    pub end_date: NaiveDate,
    /// Date constraint, if any.
    #[serde(default)]
    pub constraint: DateConstraint,
    /// Progress status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Derived by the auto-scheduler; ignored on input.
    #[serde(default)]
    pub is_critical: bool,
}

impl Task {
    /// Creates a task starting on `start_date` lasting `duration_days`.
    ///
    /// A window that does not fit the calendar ends at its bound; such a
    /// duration is refused when the task is loaded or validated.
    pub fn new(
        id: impl Into<String>,
        schedule_id: impl Into<String>,
        start_date: NaiveDate,
        duration_days: i64,
    ) -> Self {
        let end_date = add_days(start_date, duration_days.saturating_sub(1)).unwrap_or(
            if duration_days > 0 {
                NaiveDate::MAX
            } else {
                NaiveDate::MIN
            },
        );
        Self {
            id: id.into(),
            schedule_id: schedule_id.into(),
            name: String::new(),
            duration_days,
            start_date,
            end_date,
            constraint: DateConstraint::None,
            status: TaskStatus::NotStarted,
            is_critical: false,
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the date constraint.
    pub fn with_constraint(mut self, constraint: DateConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Sets the progress status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Current window.
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    /// Whether the task is finished.
    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }

    /// Whether the duration is positive and within the supported span.
    pub fn has_valid_duration(&self) -> bool {
        is_valid_duration(self.duration_days)
    }

    /// Whether `end_date = start_date + duration_days - 1` holds.
    pub fn is_window_consistent(&self) -> bool {
        self.window().duration_days() == self.duration_days
    }

    pub(crate) fn set_window(&mut self, window: DateWindow) {
        self.start_date = window.start;
        self.end_date = window.end;
        self.duration_days = window.duration_days();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("T1", "S1", d(2024, 1, 1), 3)
            .with_name("Pour footings")
            .with_constraint(DateConstraint::StartNoEarlierThan(d(2024, 1, 1)))
            .with_status(TaskStatus::InProgress);

        assert_eq!(task.id, "T1");
        assert_eq!(task.schedule_id, "S1");
        assert_eq!(task.name, "Pour footings");
        assert_eq!(task.end_date, d(2024, 1, 3));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.is_window_consistent());
        assert!(!task.is_critical);
    }

    #[test]
    fn test_set_window_tracks_duration() {
        let mut task = Task::new("T1", "S1", d(2024, 1, 1), 3);
        task.set_window(DateWindow::new(d(2024, 1, 5), d(2024, 1, 9)));
        assert_eq!(task.duration_days, 5);
        assert!(task.is_window_consistent());
    }

    #[test]
    fn test_oversized_duration_does_not_panic() {
        let task = Task::new("T1", "S1", d(2024, 1, 1), 9_000_000_000_000);
        assert_eq!(task.end_date, NaiveDate::MAX);
        assert!(!task.has_valid_duration());

        let empty = Task::new("T2", "S1", d(2024, 1, 1), 0);
        assert!(!empty.has_valid_duration());
        assert!(Task::new("T3", "S1", d(2024, 1, 1), i64::MIN).end_date < empty.start_date);
    }

    #[test]
    fn test_task_from_json_defaults() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": "T9",
                "schedule_id": "S1",
                "duration_days": 2,
                "start_date": "2024-01-04",
                "end_date": "2024-01-05"
            }"#,
        )
        .unwrap();
        assert_eq!(task.constraint, DateConstraint::None);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.name.is_empty());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
    }
}
