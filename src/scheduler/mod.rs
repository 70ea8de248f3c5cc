//! Scheduling passes over a [`ScheduleGraph`](crate::graph::ScheduleGraph).
//!
//! - [`CascadePropagator`] pushes one task's date change through its
//!   dependents, touching as few tasks as possible.
//! - [`AutoScheduler`] recomputes the whole schedule with the Critical
//!   Path Method and marks critical tasks.
//! - [`ScheduleKpi`] summarises a computed schedule.
//!
//! Both passes run synchronously on a caller-owned graph. They check for
//! cycles first and write results into the graph only after the whole pass
//! has succeeded.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Kahn (1962), "Topological sorting of large networks"

mod cascade;
mod cpm;
mod kpi;

pub use cascade::{CascadePropagator, CascadeResult};
pub use cpm::{AutoScheduler, CpmResult, ScheduledTask};
pub use kpi::ScheduleKpi;
