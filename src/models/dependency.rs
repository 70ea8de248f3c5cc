//! Dependency (precedence link) model.
//!
//! A dependency ties a successor task to a predecessor task with one of
//! the four classic precedence relations plus a signed lag in days. A
//! negative lag is lead time.
//!
//! # Relations
//!
//! | Type | Successor start is driven by |
//! |------|------------------------------|
//! | `FinishToStart` | `pred.end + lag + 1` |
//! | `StartToStart` | `pred.start + lag` |
//! | `FinishToFinish` | `pred.end + lag - duration + 1` |
//! | `StartToFinish` | `pred.start + lag - duration + 1` |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::window::{add_days, DateWindow};

/// Precedence relation between two tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl DependencyType {
    /// Earliest start this relation allows the successor.
    ///
    /// `None` when the result falls outside the calendar range.
    pub fn driving_start(
        &self,
        predecessor: &DateWindow,
        lag_days: i64,
        successor_duration: i64,
    ) -> Option<NaiveDate> {
        match self {
            Self::FinishToStart => add_days(predecessor.end, lag_days.checked_add(1)?),
            Self::StartToStart => add_days(predecessor.start, lag_days),
            Self::FinishToFinish => add_days(
                predecessor.end,
                lag_days.checked_sub(successor_duration)?.checked_add(1)?,
            ),
            Self::StartToFinish => add_days(
                predecessor.start,
                lag_days.checked_sub(successor_duration)?.checked_add(1)?,
            ),
        }
    }

    /// Latest finish this relation allows the predecessor, given the
    /// successor's latest window.
    pub fn latest_predecessor_finish(
        &self,
        successor_late: &DateWindow,
        lag_days: i64,
        predecessor_duration: i64,
    ) -> Option<NaiveDate> {
        let lead = lag_days.checked_neg()?;
        match self {
            Self::FinishToStart => add_days(successor_late.start, lead.checked_sub(1)?),
            Self::StartToStart => add_days(
                successor_late.start,
                lead.checked_add(predecessor_duration)?.checked_sub(1)?,
            ),
            Self::FinishToFinish => add_days(successor_late.end, lead),
            Self::StartToFinish => add_days(
                successor_late.end,
                lead.checked_add(predecessor_duration)?.checked_sub(1)?,
            ),
        }
    }
}

/// A precedence dependency between two tasks of one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Unique dependency identifier.
    pub id: String,
    /// Owning schedule.
    pub schedule_id: String,
    /// Successor task.
    pub task_id: String,
    /// Predecessor task.
    pub depends_on_task_id: String,
    /// Precedence relation.
    #[serde(default)]
    pub dependency_type: DependencyType,
    /// Signed offset in days.
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    /// Creates a zero-lag finish-to-start dependency: `task_id` waits for `depends_on`.
    pub fn new(
        id: impl Into<String>,
        schedule_id: impl Into<String>,
        task_id: impl Into<String>,
        depends_on: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            schedule_id: schedule_id.into(),
            task_id: task_id.into(),
            depends_on_task_id: depends_on.into(),
            dependency_type: DependencyType::FinishToStart,
            lag_days: 0,
        }
    }

    /// Sets the precedence relation.
    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// Sets the lag (negative for lead time).
    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// Whether the dependency points a task at itself.
    pub fn is_self_loop(&self) -> bool {
        self.task_id == self.depends_on_task_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn pred() -> DateWindow {
        DateWindow::new(d(2024, 1, 1), d(2024, 1, 3))
    }

    #[test]
    fn test_driving_start_all_types() {
        let p = pred();
        assert_eq!(
            DependencyType::FinishToStart.driving_start(&p, 0, 2),
            Some(d(2024, 1, 4))
        );
        assert_eq!(
            DependencyType::StartToStart.driving_start(&p, 1, 2),
            Some(d(2024, 1, 2))
        );
        // FF: successor ends with the predecessor
        assert_eq!(
            DependencyType::FinishToFinish.driving_start(&p, 0, 2),
            Some(d(2024, 1, 2))
        );
        // SF: successor ends on the predecessor's start
        assert_eq!(
            DependencyType::StartToFinish.driving_start(&p, 0, 2),
            Some(d(2023, 12, 31))
        );
    }

    #[test]
    fn test_negative_lag_is_lead() {
        assert_eq!(
            DependencyType::FinishToStart.driving_start(&pred(), -2, 1),
            Some(d(2024, 1, 2))
        );
    }

    #[test]
    fn test_latest_predecessor_finish_inverts_driving_start() {
        let p = pred();
        for ty in [
            DependencyType::FinishToStart,
            DependencyType::StartToStart,
            DependencyType::FinishToFinish,
            DependencyType::StartToFinish,
        ] {
            let succ_start = ty.driving_start(&p, 2, 4).unwrap();
            let succ = DateWindow::from_start(succ_start, 4).unwrap();
            assert_eq!(
                ty.latest_predecessor_finish(&succ, 2, p.duration_days()),
                Some(p.end),
                "{ty:?}"
            );
        }
    }

    #[test]
    fn test_huge_lag_has_no_driving_start() {
        let p = pred();
        for ty in [
            DependencyType::FinishToStart,
            DependencyType::StartToStart,
            DependencyType::FinishToFinish,
            DependencyType::StartToFinish,
        ] {
            assert_eq!(ty.driving_start(&p, 1_000_000_000, 2), None, "{ty:?}");
            assert_eq!(ty.driving_start(&p, i64::MAX, 2), None, "{ty:?}");
            assert_eq!(ty.latest_predecessor_finish(&p, i64::MIN, 2), None, "{ty:?}");
        }
    }

    #[test]
    fn test_dependency_builder() {
        let dep = Dependency::new("D1", "S1", "B", "A")
            .with_type(DependencyType::StartToStart)
            .with_lag(-1);
        assert_eq!(dep.task_id, "B");
        assert_eq!(dep.depends_on_task_id, "A");
        assert_eq!(dep.lag_days, -1);
        assert!(!dep.is_self_loop());
        assert!(Dependency::new("D2", "S1", "A", "A").is_self_loop());
    }

    #[test]
    fn test_dependency_from_json() {
        let dep: Dependency = serde_json::from_str(
            r#"{"id":"D1","schedule_id":"S1","task_id":"B","depends_on_task_id":"A",
                "dependency_type":"finish_to_finish","lag_days":-2}"#,
        )
        .unwrap();
        assert_eq!(dep.dependency_type, DependencyType::FinishToFinish);
        assert_eq!(dep.lag_days, -2);
    }
}
