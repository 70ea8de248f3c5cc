//! Schedule domain models.
//!
//! Plain records exchanged with the caller: tasks, dependencies,
//! milestones and the per-task date constraint, plus the date window
//! arithmetic shared by the cascade and the auto-scheduler.
//!
//! # Domain Mappings
//!
//! | site-schedule | Construction | Gantt chart |
//! |---------------|--------------|-------------|
//! | Task | Scope of work / trade activity | Bar |
//! | Dependency | Sequencing logic | Arrow |
//! | Milestone | Inspection / draw / handover | Diamond |
//! | ScheduleRecords | Project schedule | Chart |

mod constraint;
mod dependency;
mod milestone;
mod schedule;
mod task;
mod violation;
pub mod window;

pub use constraint::{DateConstraint, Resolution};
pub use dependency::{Dependency, DependencyType};
pub use milestone::{Milestone, MilestoneStatus};
pub use schedule::ScheduleRecords;
pub use task::{Task, TaskStatus};
pub use violation::{ConstraintViolation, ViolationKind};
pub use window::{DateWindow, TaskWindow};
