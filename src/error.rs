//! Crate-wide errors.
//!
//! Structural problems are errors and abort the requested operation with
//! no mutation. Constraint conflicts are not errors; they travel as
//! [`ConstraintViolation`](crate::models::ConstraintViolation) data.

use chrono::NaiveDate;
use thiserror::Error;

/// The dependency graph is not a DAG.
///
/// `cycle` lists the task ids on the loop in traversal order; the last
/// task depends back on the first.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency cycle detected: {}", format_cycle(.cycle))]
pub struct CycleError {
    /// Task ids on the loop.
    pub cycle: Vec<String>,
}

impl CycleError {
    /// Wraps a cycle path.
    pub fn new(cycle: Vec<String>) -> Self {
        Self { cycle }
    }
}

fn format_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => String::from("<empty>"),
    }
}

/// Why an edge was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidEdgeReason {
    /// `task_id == depends_on_task_id`.
    SelfLoop,
    /// The edge belongs to a different schedule than the graph.
    CrossSchedule {
        /// Schedule of the graph.
        expected: String,
        /// Schedule the edge names.
        found: String,
    },
    /// An endpoint is not part of the schedule.
    UnknownTask(String),
}

impl std::fmt::Display for InvalidEdgeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfLoop => write!(f, "a task cannot depend on itself"),
            Self::CrossSchedule { expected, found } => {
                write!(f, "edge belongs to schedule {found}, expected {expected}")
            }
            Self::UnknownTask(id) => write!(f, "task {id} is not on this schedule"),
        }
    }
}

/// A dependency rejected before insertion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid dependency {dependency_id}: {reason}")]
pub struct InvalidEdgeError {
    /// The refused dependency.
    pub dependency_id: String,
    /// What is wrong with it.
    pub reason: InvalidEdgeReason,
}

/// Errors returned by graph construction, the scheduling passes and sessions.
///
/// Every variant aborts the operation before anything is written.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The dependency graph has a cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// A dependency was refused.
    #[error(transparent)]
    InvalidEdge(#[from] InvalidEdgeError),

    /// No task with this id on the schedule.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Two tasks share an id.
    #[error("Duplicate task ID: {0}")]
    DuplicateTask(String),

    /// A task belongs to another schedule.
    #[error("Task {task_id} belongs to schedule {found}, expected {expected}")]
    ScheduleMismatch {
        /// Offending task.
        task_id: String,
        /// Schedule being loaded.
        expected: String,
        /// Schedule the task names.
        found: String,
    },

    /// An edit asked for an empty or oversized window.
    #[error("Invalid window for task {task_id}: {start} .. {end}")]
    InvalidWindow {
        /// Edited task.
        task_id: String,
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Records failed validation (durations, lags, template keys).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A task's computed dates fall outside the supported calendar range.
    #[error("Dates for task {0} fall outside the supported calendar range")]
    DateOutOfRange(String),

    /// The [`ScheduleSource`](crate::session::ScheduleSource) failed.
    #[error("Schedule source error: {0}")]
    Source(String),
}

impl ScheduleError {
    /// Whether this error is a dependency cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle(_))
    }
}

/// Result alias for [`ScheduleError`].
pub type Result<T> = std::result::Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_closes_loop() {
        let err = CycleError::new(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(
            err.to_string(),
            "dependency cycle detected: A -> B -> C -> A"
        );
    }

    #[test]
    fn test_invalid_edge_display() {
        let err = InvalidEdgeError {
            dependency_id: "D1".into(),
            reason: InvalidEdgeReason::SelfLoop,
        };
        assert!(err.to_string().contains("cannot depend on itself"));

        let wrapped: ScheduleError = err.into();
        assert!(!wrapped.is_cycle());
    }

    #[test]
    fn test_cycle_converts() {
        let wrapped: ScheduleError = CycleError::new(vec!["X".into()]).into();
        assert!(wrapped.is_cycle());
        assert!(wrapped.to_string().contains("X -> X"));
    }

    #[test]
    fn test_out_of_range_display() {
        let err = ScheduleError::DateOutOfRange("B".into());
        assert_eq!(
            err.to_string(),
            "Dates for task B fall outside the supported calendar range"
        );
        assert!(!err.is_cycle());
    }
}
