//! Dependency-driven date scheduling for construction projects.
//!
//! Tasks on a schedule are linked by typed, lagged dependencies
//! (finish-to-start, start-to-start, finish-to-finish, start-to-finish).
//! This crate keeps their dates consistent:
//!
//! - a manual edit to one task cascades to everything downstream of it,
//!   and nothing else;
//! - a full recompute places every task as early as its predecessors and
//!   date constraints allow, and marks the critical path;
//! - milestone statuses are re-derived from the resulting task dates.
//!
//! Constraint conflicts never abort a pass. They come back as
//! [`ConstraintViolation`](models::ConstraintViolation) records next to a
//! best-effort schedule. Cycles and malformed edges are hard errors that
//! leave the schedule untouched.
//!
//! # Modules
//!
//! - **`models`**: Records: `Task`, `Dependency`, `Milestone`, date constraints
//! - **`graph`**: `ScheduleGraph`, adjacency and topological order
//! - **`validation`**: Input checks and cycle detection
//! - **`scheduler`**: Cascade propagation, CPM auto-scheduling, KPIs
//! - **`milestones`**: Milestone status evaluation
//! - **`session`**: Request-scoped entry points over a `ScheduleSource`
//! - **`templates`**: Stamping keyed templates onto new schedules
//! - **`config`**: Behaviour switches shared by the passes
//!
//! The core is synchronous and performs no I/O; loading and persisting
//! records is the caller's job.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Kahn (1962), "Topological sorting of large networks"

pub mod config;
pub mod error;
pub mod graph;
pub mod milestones;
pub mod models;
pub mod scheduler;
pub mod session;
pub mod templates;
pub mod validation;

pub use config::SchedulerConfig;
pub use error::{CycleError, InvalidEdgeError, Result, ScheduleError};
pub use graph::ScheduleGraph;
pub use session::{ScheduleSession, ScheduleSource};
