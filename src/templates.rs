//! Reusable schedule templates.
//!
//! A template describes a standard sequence of work (for example a
//! single-family build) with keys instead of ids and day offsets instead
//! of dates. [`ScheduleTemplate::instantiate`] stamps it onto a schedule:
//! every record gets the id `"{schedule_id}:{key}"` and task starts are
//! offset from the project start. The result is checked with
//! [`validate_input`](crate::validation::validate_input) before it is
//! returned, so a broken template never reaches a session.
//!
//! Templates are plain serde types and are usually read from JSON:
//!
//! ```
//! use chrono::NaiveDate;
//! use site_schedule::templates::ScheduleTemplate;
//!
//! let template: ScheduleTemplate = serde_json::from_str(r#"{
//!     "name": "Slab on grade",
//!     "tasks": [
//!         {"key": "form", "name": "Formwork", "duration_days": 2},
//!         {"key": "pour", "name": "Pour", "duration_days": 1, "offset_days": 2}
//!     ],
//!     "dependencies": [
//!         {"key": "form-pour", "task": "pour", "depends_on": "form"}
//!     ]
//! }"#).unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let records = template.instantiate("S7", start).unwrap();
//! assert_eq!(records.tasks[1].id, "S7:pour");
//! assert_eq!(records.dependencies[0].depends_on_task_id, "S7:form");
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::models::window::add_days;
use crate::models::{DateConstraint, Dependency, DependencyType, Milestone, ScheduleRecords, Task};
use crate::validation::validate_input;

/// A task in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTask {
    /// Key unique within the template.
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub duration_days: i64,
    /// Days after the project start the task is first placed.
    #[serde(default)]
    pub offset_days: i64,
    #[serde(default)]
    pub constraint: DateConstraint,
}

/// A dependency in a template, between task keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDependency {
    pub key: String,
    /// Successor key.
    pub task: String,
    /// Predecessor key.
    pub depends_on: String,
    #[serde(default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_days: i64,
}

/// A milestone in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMilestone {
    pub key: String,
    #[serde(default)]
    pub name: String,
    /// Target date as days after the project start.
    pub target_offset_days: i64,
    /// Keys of the tasks the milestone tracks.
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// A keyed, date-free schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TemplateTask>,
    #[serde(default)]
    pub dependencies: Vec<TemplateDependency>,
    #[serde(default)]
    pub milestones: Vec<TemplateMilestone>,
}

impl ScheduleTemplate {
    /// Creates an empty template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a task at `offset_days` from the project start.
    pub fn with_task(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        duration_days: i64,
        offset_days: i64,
    ) -> Self {
        self.tasks.push(TemplateTask {
            key: key.into(),
            name: name.into(),
            duration_days,
            offset_days,
            constraint: DateConstraint::None,
        });
        self
    }

    /// Adds a dependency of `task` on `depends_on`.
    pub fn with_dependency(
        mut self,
        key: impl Into<String>,
        task: impl Into<String>,
        depends_on: impl Into<String>,
        dependency_type: DependencyType,
        lag_days: i64,
    ) -> Self {
        self.dependencies.push(TemplateDependency {
            key: key.into(),
            task: task.into(),
            depends_on: depends_on.into(),
            dependency_type,
            lag_days,
        });
        self
    }

    /// Adds a milestone over the given task keys.
    pub fn with_milestone(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        target_offset_days: i64,
        tasks: &[&str],
    ) -> Self {
        self.milestones.push(TemplateMilestone {
            key: key.into(),
            name: name.into(),
            target_offset_days,
            tasks: tasks.iter().map(|k| k.to_string()).collect(),
        });
        self
    }

    /// Produces the records of a new schedule.
    ///
    /// Fails with [`ScheduleError::InvalidInput`] listing every problem if
    /// the stamped records do not validate (duplicate keys, durations or
    /// lags out of range, offsets past the calendar, unknown keys, cycles).
    pub fn instantiate(
        &self,
        schedule_id: &str,
        project_start: NaiveDate,
    ) -> Result<ScheduleRecords> {
        let id = |key: &str| format!("{schedule_id}:{key}");
        let mut problems = Vec::new();
        let mut offset = |what: &str, key: &str, days: i64| {
            add_days(project_start, days).unwrap_or_else(|| {
                problems.push(format!("{what} '{key}' offset {days} days is out of range"));
                project_start
            })
        };

        let tasks: Vec<Task> = self
            .tasks
            .iter()
            .map(|t| {
                Task::new(
                    id(&t.key),
                    schedule_id,
                    offset("Task", &t.key, t.offset_days),
                    t.duration_days,
                )
                .with_name(t.name.clone())
                .with_constraint(t.constraint)
            })
            .collect();

        let dependencies: Vec<Dependency> = self
            .dependencies
            .iter()
            .map(|d| {
                Dependency::new(id(&d.key), schedule_id, id(&d.task), id(&d.depends_on))
                    .with_type(d.dependency_type)
                    .with_lag(d.lag_days)
            })
            .collect();

        let mut milestones = Vec::with_capacity(self.milestones.len());
        for m in &self.milestones {
            let target = offset("Milestone", &m.key, m.target_offset_days);
            milestones.push(
                Milestone::new(id(&m.key), schedule_id, target).with_name(m.name.clone()),
            );
        }

        if let Err(errors) = validate_input(&tasks, &dependencies) {
            problems.extend(errors.into_iter().map(|e| e.message));
        }
        for (m, milestone) in self.milestones.iter().zip(milestones.iter_mut()) {
            for key in &m.tasks {
                if !self.tasks.iter().any(|t| &t.key == key) {
                    problems.push(format!("Milestone '{}' tracks unknown task '{}'", m.key, key));
                }
                milestone.task_ids.push(id(key));
            }
        }

        if !problems.is_empty() {
            return Err(ScheduleError::InvalidInput(format!(
                "template '{}': {}",
                self.name,
                problems.join("; ")
            )));
        }

        debug!(
            template = %self.name,
            schedule_id,
            tasks = tasks.len(),
            dependencies = dependencies.len(),
            "instantiated template"
        );
        Ok(ScheduleRecords {
            tasks,
            dependencies,
            milestones,
        })
    }
}
