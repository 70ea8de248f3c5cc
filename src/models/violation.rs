//! Constraint violations surfaced as data.
//!
//! Violations never abort a scheduling pass. They are collected and
//! returned alongside a best-effort schedule so the caller can attach a
//! warning to the affected task.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DateConstraint, DateWindow};

/// Classification of constraint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Predecessors push the task past a `*_no_later_than` cap (or an
    /// explicit edit breaks the task's own constraint).
    ConstraintViolated,
    /// A `must_*` date lands earlier than the predecessors allow.
    PredecessorConflict,
    /// Predecessors would move a completed task that is locked in place.
    LockedTaskConflict,
}

/// A constraint violation attached to one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Affected task.
    pub task_id: String,
    /// Type of violation.
    pub kind: ViolationKind,
    /// The task's constraint at the time of the pass.
    pub constraint: DateConstraint,
    /// Start date the predecessors asked for. For an edit that breaks the
    /// task's own constraint, the nearest start the constraint allows.
    pub driving_start: NaiveDate,
    /// Start date actually published.
    pub scheduled_start: NaiveDate,
    /// Human-readable description.
    pub message: String,
}

impl ConstraintViolation {
    /// Creates a violation with a generated message.
    pub fn new(
        task_id: impl Into<String>,
        kind: ViolationKind,
        constraint: DateConstraint,
        driving_start: NaiveDate,
        scheduled_start: NaiveDate,
    ) -> Self {
        let task_id = task_id.into();
        let message = match kind {
            ViolationKind::ConstraintViolated => format!(
                "Task {} wants to start {} but its {} constraint holds it at {}",
                task_id,
                driving_start,
                constraint.name(),
                scheduled_start
            ),
            ViolationKind::PredecessorConflict => format!(
                "Task {} is pinned to start {} but its predecessors allow {} at the earliest",
                task_id, scheduled_start, driving_start
            ),
            ViolationKind::LockedTaskConflict => format!(
                "Task {} is complete and locked at {} but its predecessors push it to {}",
                task_id, scheduled_start, driving_start
            ),
        };
        Self {
            task_id,
            kind,
            constraint,
            driving_start,
            scheduled_start,
            message,
        }
    }

    /// An explicit edit placed the task at `window`, outside its own constraint.
    pub fn broken_by_edit(
        task_id: impl Into<String>,
        constraint: DateConstraint,
        window: DateWindow,
    ) -> Self {
        let task_id = task_id.into();
        let allowed_start = constraint
            .resolve(window.start, window.duration_days())
            .map_or(window.start, |r| r.window.start);
        let bound = constraint
            .date()
            .map_or_else(String::new, |d| format!(" {d}"));
        let message = format!(
            "Task {} placed at {} .. {} breaks its {}{} constraint; nearest allowed start is {}",
            task_id,
            window.start,
            window.end,
            constraint.name(),
            bound,
            allowed_start
        );
        Self {
            task_id,
            kind: ViolationKind::ConstraintViolated,
            constraint,
            driving_start: allowed_start,
            scheduled_start: window.start,
            message,
        }
    }

    /// Days between the requested and the published start.
    pub fn slip_days(&self) -> i64 {
        (self.driving_start - self.scheduled_start).num_days()
    }
}
