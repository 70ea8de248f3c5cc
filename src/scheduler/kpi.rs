//! Schedule summary metrics.
//!
//! Computes progress indicators from the current state of a schedule and
//! its milestones.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Span | Days from earliest start to latest finish, inclusive |
//! | Percent complete | Completed task-days / total task-days |
//! | Critical count | Tasks flagged critical by the last auto-schedule |
//! | Milestones at risk | Milestones whose status is `at_risk` |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::graph::ScheduleGraph;
use crate::models::window::days_between;
use crate::models::{Milestone, MilestoneStatus};

/// Schedule progress indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Earliest task start.
    pub start: Option<NaiveDate>,
    /// Latest task finish.
    pub finish: Option<NaiveDate>,
    /// Inclusive span in days (0 when empty).
    pub span_days: i64,
    /// Number of tasks.
    pub task_count: usize,
    /// Number of completed tasks.
    pub completed_count: usize,
    /// Completed task-days over total task-days (0.0..1.0).
    pub percent_complete: f64,
    /// Tasks currently flagged critical.
    pub critical_count: usize,
    /// Milestones with status `at_risk`.
    pub milestones_at_risk: usize,
    /// Milestones with status `complete`.
    pub milestones_complete: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a graph and its (already evaluated) milestones.
    pub fn calculate(graph: &ScheduleGraph, milestones: &[Milestone]) -> Self {
        let tasks = graph.tasks();
        let start = tasks.iter().map(|t| t.start_date).min();
        let finish = tasks.iter().map(|t| t.end_date).max();
        let span_days = match (start, finish) {
            (Some(s), Some(f)) => days_between(s, f) + 1,
            _ => 0,
        };

        let total_days: i64 = tasks.iter().map(|t| t.duration_days).sum();
        let done_days: i64 = tasks
            .iter()
            .filter(|t| t.is_complete())
            .map(|t| t.duration_days)
            .sum();
        let percent_complete = if total_days == 0 {
            0.0
        } else {
            done_days as f64 / total_days as f64
        };

        let count = |status: MilestoneStatus| {
            milestones.iter().filter(|m| m.status == status).count()
        };

        Self {
            start,
            finish,
            span_days,
            task_count: tasks.len(),
            completed_count: tasks.iter().filter(|t| t.is_complete()).count(),
            percent_complete,
            critical_count: tasks.iter().filter(|t| t.is_critical).count(),
            milestones_at_risk: count(MilestoneStatus::AtRisk),
            milestones_complete: count(MilestoneStatus::Complete),
        }
    }

    /// Whether no milestone is at risk.
    pub fn is_on_track(&self) -> bool {
        self.milestones_at_risk == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, Task, TaskStatus};
    use crate::scheduler::AutoScheduler;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    #[test]
    fn test_kpi_basic() {
        let mut g = ScheduleGraph::load(
            vec![
                Task::new("A", "S1", day(1), 3).with_status(TaskStatus::Complete),
                Task::new("B", "S1", day(1), 1),
                Task::new("C", "S1", day(1), 4),
            ],
            vec![Dependency::new("D1", "S1", "C", "A")],
        )
        .unwrap();
        AutoScheduler::new().schedule(&mut g, day(1)).unwrap();

        let mut at_risk = Milestone::new("M1", "S1", day(5));
        at_risk.status = MilestoneStatus::AtRisk;
        let kpi = ScheduleKpi::calculate(&g, &[at_risk]);

        assert_eq!(kpi.start, Some(day(1)));
        assert_eq!(kpi.finish, Some(day(7)));
        assert_eq!(kpi.span_days, 7);
        assert_eq!(kpi.task_count, 3);
        assert_eq!(kpi.completed_count, 1);
        assert!((kpi.percent_complete - 3.0 / 8.0).abs() < 1e-10);
        assert_eq!(kpi.critical_count, 2);
        assert_eq!(kpi.milestones_at_risk, 1);
        assert!(!kpi.is_on_track());
    }

    #[test]
    fn test_kpi_empty() {
        let g = ScheduleGraph::load(vec![], vec![]).unwrap();
        let kpi = ScheduleKpi::calculate(&g, &[]);
        assert_eq!(kpi.span_days, 0);
        assert_eq!(kpi.percent_complete, 0.0);
        assert!(kpi.is_on_track());
    }
}
