//! Critical Path Method auto-scheduler.
//!
//! # Algorithm
//!
//! 1. Topologically sort the graph; a cycle aborts before anything is
//!    computed.
//! 2. Forward pass: each task starts at the latest driving date among its
//!    predecessors (the project start for tasks without any), then its
//!    constraint is applied. These early dates are published (ASAP).
//! 3. Backward pass: from the project finish, each task's latest finish is
//!    the tightest of its successors' limits, the project finish and its
//!    own latest-finish constraint.
//! 4. Total float = late start − early start. Tasks with no (or negative)
//!    float are critical.
//! 5. The critical path is traced back from the critical tasks that finish
//!    the project, following critical predecessors whose edge actually
//!    drives the successor's start.
//!
//! # Complexity
//! O(n log n + e) (the topological sort uses a heap for deterministic ties).
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SchedulerConfig;
use crate::error::{Result, ScheduleError};
use crate::graph::ScheduleGraph;
use crate::models::window::days_between;
use crate::models::{ConstraintViolation, DateWindow, TaskWindow, ViolationKind};

/// CPM figures for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Task identifier.
    pub task_id: String,
    /// Published (early) window.
    pub early: DateWindow,
    /// Latest window that does not delay the project or a successor.
    pub late: DateWindow,
    /// Late start − early start, in days. Negative when a constraint
    /// cannot be met.
    pub total_float_days: i64,
    /// `total_float_days <= 0`.
    pub is_critical: bool,
}

/// Outcome of a full recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpmResult {
    /// Start date the forward pass was seeded with.
    pub project_start: NaiveDate,
    /// Latest early finish; `None` for an empty schedule.
    pub project_finish: Option<NaiveDate>,
    /// Per-task figures in topological order.
    pub tasks: Vec<ScheduledTask>,
    /// Critical chain task ids in topological order.
    pub critical_path: Vec<String>,
    /// Constraint conflicts found during the forward pass.
    pub violations: Vec<ConstraintViolation>,
    /// Tasks whose published window changed.
    pub updated: Vec<TaskWindow>,
}

impl CpmResult {
    /// Finds the figures for a task.
    pub fn task(&self, task_id: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Inclusive project length in days (0 when empty).
    pub fn duration_days(&self) -> i64 {
        self.project_finish
            .map(|f| days_between(self.project_start, f) + 1)
            .unwrap_or(0)
    }
}

/// Full-schedule recompute with critical path analysis.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use site_schedule::graph::ScheduleGraph;
/// use site_schedule::models::{Dependency, Task};
/// use site_schedule::scheduler::AutoScheduler;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let mut graph = ScheduleGraph::load(
///     vec![Task::new("A", "S1", day(1), 3), Task::new("B", "S1", day(1), 2)],
///     vec![Dependency::new("D1", "S1", "B", "A")],
/// )
/// .unwrap();
///
/// let result = AutoScheduler::new().schedule(&mut graph, day(1)).unwrap();
/// assert_eq!(graph.task("B").unwrap().start_date, day(4));
/// assert_eq!(result.critical_path, vec!["A", "B"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoScheduler {
    config: SchedulerConfig,
}

impl AutoScheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Recomputes every task's window from `project_start` and marks the
    /// critical path. The graph is only written once both passes succeed.
    pub fn schedule(
        &self,
        graph: &mut ScheduleGraph,
        project_start: NaiveDate,
    ) -> Result<CpmResult> {
        let order = graph.topological_indices()?;
        let n = graph.len();
        let mut violations = Vec::new();

        // Forward pass
        let mut early: Vec<DateWindow> = graph.tasks().iter().map(|t| t.window()).collect();
        for &i in &order {
            let task = graph.task_at(i);
            let duration = task.duration_days;
            let out_of_range = || ScheduleError::DateOutOfRange(task.id.clone());
            let mut from_predecessors: Option<NaiveDate> = None;
            for l in graph.predecessors_at(i) {
                let start = l
                    .dependency_type
                    .driving_start(&early[l.index], l.lag_days, duration)
                    .ok_or_else(out_of_range)?;
                from_predecessors = from_predecessors.max(Some(start));
            }
            let mut driving = from_predecessors.unwrap_or(project_start);
            if self.config.clamp_to_project_start {
                driving = driving.max(project_start);
            }

            if self.config.lock_completed && task.is_complete() {
                // Work already done before the project start is not a conflict.
                if let Some(pushed) = from_predecessors.filter(|&d| d > task.start_date) {
                    violations.push(ConstraintViolation::new(
                        &task.id,
                        ViolationKind::LockedTaskConflict,
                        task.constraint,
                        pushed,
                        task.start_date,
                    ));
                }
                early[i] = task.window();
                continue;
            }

            let resolution = task
                .constraint
                .resolve(driving, duration)
                .ok_or_else(out_of_range)?;
            if let Some(kind) = resolution.conflict {
                violations.push(ConstraintViolation::new(
                    &task.id,
                    kind,
                    task.constraint,
                    driving,
                    resolution.window.start,
                ));
            }
            early[i] = resolution.window;
        }

        let Some(project_finish) = early.iter().map(|w| w.end).max() else {
            return Ok(CpmResult {
                project_start,
                project_finish: None,
                tasks: Vec::new(),
                critical_path: Vec::new(),
                violations,
                updated: Vec::new(),
            });
        };

        // Backward pass
        let mut late = early.clone();
        for &i in order.iter().rev() {
            let task = graph.task_at(i);
            let duration = task.duration_days;
            let out_of_range = || ScheduleError::DateOutOfRange(task.id.clone());
            let mut latest_finish = project_finish;
            for l in graph.successors_at(i) {
                let limit = l
                    .dependency_type
                    .latest_predecessor_finish(&late[l.index], l.lag_days, duration)
                    .ok_or_else(out_of_range)?;
                latest_finish = latest_finish.min(limit);
            }
            if let Some(limit) = task.constraint.latest_finish(duration) {
                latest_finish = latest_finish.min(limit);
            }
            late[i] = DateWindow::from_finish(latest_finish, duration).ok_or_else(out_of_range)?;
        }

        let float: Vec<i64> = (0..n)
            .map(|i| days_between(early[i].start, late[i].start))
            .collect();
        let critical: Vec<bool> = float.iter().map(|&f| f <= 0).collect();
        let on_path = trace_critical_path(graph, &early, &critical, project_finish);

        let tasks: Vec<ScheduledTask> = order
            .iter()
            .map(|&i| ScheduledTask {
                task_id: graph.task_at(i).id.clone(),
                early: early[i],
                late: late[i],
                total_float_days: float[i],
                is_critical: critical[i],
            })
            .collect();
        let critical_path: Vec<String> = order
            .iter()
            .filter(|&&i| on_path[i])
            .map(|&i| graph.task_at(i).id.clone())
            .collect();

        let mut updated = Vec::new();
        for &i in &order {
            let old = graph.task_at(i).window();
            if old != early[i] {
                updated.push(TaskWindow {
                    task_id: graph.task_at(i).id.clone(),
                    old,
                    new: early[i],
                });
                graph.set_window_at(i, early[i]);
            }
            graph.set_critical_at(i, critical[i]);
        }

        info!(
            schedule_id = %graph.schedule_id(),
            tasks = n,
            %project_finish,
            critical = critical_path.len(),
            updated = updated.len(),
            violations = violations.len(),
            "auto-schedule complete"
        );

        Ok(CpmResult {
            project_start,
            project_finish: Some(project_finish),
            tasks,
            critical_path,
            violations,
            updated,
        })
    }
}

/// Marks critical tasks chained by driving edges back from the project finish.
fn trace_critical_path(
    graph: &ScheduleGraph,
    early: &[DateWindow],
    critical: &[bool],
    project_finish: NaiveDate,
) -> Vec<bool> {
    let mut on_path = vec![false; early.len()];
    let mut stack: Vec<usize> = (0..early.len())
        .filter(|&i| critical[i] && early[i].end == project_finish)
        .collect();
    for &i in &stack {
        on_path[i] = true;
    }

    while let Some(i) = stack.pop() {
        let duration = graph.task_at(i).duration_days;
        for link in graph.predecessors_at(i) {
            let p = link.index;
            if on_path[p] || !critical[p] {
                continue;
            }
            let drives = link
                .dependency_type
                .driving_start(&early[p], link.lag_days, duration)
                == Some(early[i].start);
            if drives {
                on_path[p] = true;
                stack.push(p);
            }
        }
    }
    on_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::window::MAX_SPAN_DAYS;
    use crate::models::{DateConstraint, Dependency, DependencyType, Task, TaskStatus};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    fn task(id: &str, duration: i64) -> Task {
        Task::new(id, "S1", day(20), duration)
    }

    fn dep(id: &str, succ: &str, pred: &str) -> Dependency {
        Dependency::new(id, "S1", succ, pred)
    }

    #[test]
    fn test_two_task_chain_is_critical() {
        let mut g = ScheduleGraph::load(
            vec![task("A", 3), task("B", 2)],
            vec![dep("D1", "B", "A")],
        )
        .unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();

        let b = g.task("B").unwrap();
        assert_eq!(b.start_date, day(4));
        assert_eq!(b.end_date, day(5));
        assert!(b.is_critical);
        assert!(g.task("A").unwrap().is_critical);

        assert_eq!(r.task("A").unwrap().total_float_days, 0);
        assert_eq!(r.task("B").unwrap().total_float_days, 0);
        assert_eq!(r.critical_path, vec!["A", "B"]);
        assert_eq!(r.project_finish, Some(day(5)));
        assert_eq!(r.duration_days(), 5);
        assert_eq!(r.updated.len(), 2);
    }

    #[test]
    fn test_parallel_branch_has_float() {
        // A(3) -> C(1); B(1) -> C
        let mut g = ScheduleGraph::load(
            vec![task("A", 3), task("B", 1), task("C", 1)],
            vec![dep("D1", "C", "A"), dep("D2", "C", "B")],
        )
        .unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();

        let b = r.task("B").unwrap();
        assert_eq!(b.early.start, day(1));
        assert_eq!(b.late.start, day(3));
        assert_eq!(b.total_float_days, 2);
        assert!(!b.is_critical);
        assert_eq!(r.critical_path, vec!["A", "C"]);
        assert_eq!(g.task("C").unwrap().start_date, day(4));
    }

    #[test]
    fn test_sink_short_task_has_float_to_project_finish() {
        // A(5) alone, B(2) alone: B can slip 3 days
        let mut g = ScheduleGraph::load(vec![task("A", 5), task("B", 2)], vec![]).unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();
        assert_eq!(r.task("B").unwrap().total_float_days, 3);
        assert_eq!(r.critical_path, vec!["A"]);
    }

    #[test]
    fn test_start_no_earlier_than_raises_and_breaks_chain() {
        let mut g = ScheduleGraph::load(
            vec![
                task("A", 2),
                task("B", 2).with_constraint(DateConstraint::StartNoEarlierThan(day(10))),
            ],
            vec![dep("D1", "B", "A")],
        )
        .unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();

        assert_eq!(g.task("B").unwrap().start_date, day(10));
        // A has slack up to B's start
        assert_eq!(r.task("A").unwrap().total_float_days, 7);
        assert_eq!(r.critical_path, vec!["B"]);
        assert!(r.violations.is_empty());
    }

    #[test]
    fn test_finish_no_later_than_gives_negative_float() {
        let mut g = ScheduleGraph::load(
            vec![
                task("A", 5),
                task("B", 2).with_constraint(DateConstraint::FinishNoLaterThan(day(6))),
            ],
            vec![dep("D1", "B", "A")],
        )
        .unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();

        // Driving start is the 6th; the cap clamps B to 5th..6th and flags it.
        assert_eq!(r.violations.len(), 1);
        assert_eq!(r.violations[0].kind, ViolationKind::ConstraintViolated);
        assert_eq!(g.task("B").unwrap().window(), DateWindow::new(day(5), day(6)));
        assert!(r.task("A").unwrap().total_float_days < 0);
        assert!(r.task("A").unwrap().is_critical);
    }

    #[test]
    fn test_must_start_on_is_authoritative() {
        let mut g = ScheduleGraph::load(
            vec![
                task("A", 4),
                task("B", 1).with_constraint(DateConstraint::MustStartOn(day(3))),
            ],
            vec![dep("D1", "B", "A")],
        )
        .unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();
        assert_eq!(g.task("B").unwrap().start_date, day(3));
        assert_eq!(r.violations[0].kind, ViolationKind::PredecessorConflict);
    }

    #[test]
    fn test_start_to_start_and_lag() {
        let mut g = ScheduleGraph::load(
            vec![task("A", 10), task("B", 3)],
            vec![dep("D1", "B", "A")
                .with_type(DependencyType::StartToStart)
                .with_lag(2)],
        )
        .unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();
        assert_eq!(g.task("B").unwrap().window(), DateWindow::new(day(3), day(5)));
        // B may slip until it would end with the project
        assert_eq!(r.task("B").unwrap().total_float_days, 5);
        assert_eq!(r.critical_path, vec!["A"]);
    }

    #[test]
    fn test_negative_lag_clamped_to_project_start() {
        let build = || {
            ScheduleGraph::load(
                vec![task("A", 2), task("B", 1)],
                vec![dep("D1", "B", "A")
                    .with_type(DependencyType::StartToStart)
                    .with_lag(-3)],
            )
            .unwrap()
        };
        let mut clamped = build();
        AutoScheduler::new().schedule(&mut clamped, day(5)).unwrap();
        assert_eq!(clamped.task("B").unwrap().start_date, day(5));

        let mut free = build();
        AutoScheduler::new()
            .with_config(SchedulerConfig::new().with_clamp_to_project_start(false))
            .schedule(&mut free, day(5))
            .unwrap();
        assert_eq!(free.task("B").unwrap().start_date, day(2));
    }

    #[test]
    fn test_locked_completed_keeps_actual_dates() {
        let done = Task::new("A", "S1", day(2), 2).with_status(TaskStatus::Complete);
        let mut g = ScheduleGraph::load(vec![done, task("B", 1)], vec![dep("D1", "B", "A")])
            .unwrap();
        AutoScheduler::new()
            .with_config(SchedulerConfig::new().with_lock_completed(true))
            .schedule(&mut g, day(1))
            .unwrap();
        assert_eq!(g.task("A").unwrap().start_date, day(2));
        assert_eq!(g.task("B").unwrap().start_date, day(4));
    }

    #[test]
    fn test_cycle_computes_nothing() {
        let mut g = ScheduleGraph::load(
            vec![task("A", 1), task("B", 1)],
            vec![dep("D1", "B", "A"), dep("D2", "A", "B")],
        )
        .unwrap();
        let err = AutoScheduler::new().schedule(&mut g, day(1)).unwrap_err();
        assert!(err.is_cycle());
        assert_eq!(g.task("A").unwrap().start_date, day(20));
        assert!(!g.task("A").unwrap().is_critical);
    }

    #[test]
    fn test_date_overflow_computes_nothing() {
        let last = NaiveDate::MAX;
        let mut g = ScheduleGraph::load(
            vec![task("A", 3), task("B", 2)],
            vec![dep("D1", "B", "A").with_lag(MAX_SPAN_DAYS)],
        )
        .unwrap();
        let err = AutoScheduler::new()
            .schedule(&mut g, last.pred_opt().unwrap())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::DateOutOfRange(_)));
        assert_eq!(g.task("A").unwrap().start_date, day(20));
        assert_eq!(g.task("B").unwrap().start_date, day(20));
    }

    #[test]
    fn test_empty_schedule() {
        let mut g = ScheduleGraph::load(vec![], vec![]).unwrap();
        let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();
        assert!(r.project_finish.is_none());
        assert_eq!(r.duration_days(), 0);
        assert!(r.critical_path.is_empty());
    }

    #[test]
    fn test_rerun_is_stable() {
        let mut g = ScheduleGraph::load(
            vec![task("A", 3), task("B", 2), task("C", 4)],
            vec![dep("D1", "B", "A"), dep("D2", "C", "A")],
        )
        .unwrap();
        let s = AutoScheduler::new();
        s.schedule(&mut g, day(1)).unwrap();
        let again = s.schedule(&mut g, day(1)).unwrap();
        assert!(again.updated.is_empty());
    }

    #[test]
    fn test_random_dags_critical_path_is_contiguous_chain() {
        let mut rng = StdRng::seed_from_u64(42);
        let types = [
            DependencyType::FinishToStart,
            DependencyType::StartToStart,
            DependencyType::FinishToFinish,
        ];
        for _ in 0..40 {
            let n: usize = rng.random_range(1..25);
            let tasks: Vec<Task> = (0..n)
                .map(|i| task(&format!("T{i}"), rng.random_range(1..6)))
                .collect();
            let mut deps = Vec::new();
            for succ in 0..n {
                for pred in 0..succ {
                    if rng.random_bool(0.2) {
                        deps.push(
                            dep(&format!("D{pred}-{succ}"), &format!("T{succ}"), &format!("T{pred}"))
                                .with_type(types[rng.random_range(0..types.len())])
                                .with_lag(rng.random_range(0..3)),
                        );
                    }
                }
            }
            let mut g = ScheduleGraph::load(tasks, deps).unwrap();
            let r = AutoScheduler::new().schedule(&mut g, day(1)).unwrap();
            let finish = r.project_finish.unwrap();

            assert!(!r.critical_path.is_empty());
            let path: Vec<&ScheduledTask> = r
                .critical_path
                .iter()
                .map(|id| r.task(id).unwrap())
                .collect();
            assert!(path.iter().all(|t| t.total_float_days == 0));
            assert!(path.iter().any(|t| t.early.end == finish));
            assert!(path.iter().any(|t| t.early.start == day(1)));

            // Every path task either starts the project or is driven by
            // another path task.
            for t in &path {
                if t.early.start == day(1) {
                    continue;
                }
                let driven = g.predecessors_of(&t.task_id).iter().any(|l| {
                    r.critical_path.contains(&l.task_id)
                        && l.dependency_type.driving_start(
                            &r.task(&l.task_id).unwrap().early,
                            l.lag_days,
                            t.early.duration_days(),
                        ) == Some(t.early.start)
                });
                assert!(driven, "{} is not driven by the path", t.task_id);
            }

            // Dependencies hold for every task.
            for d in g.dependencies() {
                let pred = g.task(&d.depends_on_task_id).unwrap().window();
                let succ = g.task(&d.task_id).unwrap();
                let earliest = d
                    .dependency_type
                    .driving_start(&pred, d.lag_days, succ.duration_days)
                    .unwrap();
                assert!(succ.start_date >= earliest);
            }
        }
    }
}
