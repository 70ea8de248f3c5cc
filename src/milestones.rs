//! Milestone status evaluation.
//!
//! A read-only pass run after a cascade or an auto-schedule:
//!
//! - `complete` iff every associated task is complete;
//! - otherwise `at_risk` iff any associated task ends after the target date;
//! - otherwise `pending`.
//!
//! Task ids that are no longer on the schedule are ignored. A milestone
//! with no remaining tasks stays `pending`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::ScheduleGraph;
use crate::models::{Milestone, MilestoneStatus, Task};

/// A milestone whose status changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneChange {
    pub milestone_id: String,
    pub old: MilestoneStatus,
    pub new: MilestoneStatus,
}

/// Status a milestone should have given the current task state.
pub fn evaluate_milestone(milestone: &Milestone, graph: &ScheduleGraph) -> MilestoneStatus {
    let tasks: Vec<&Task> = milestone
        .task_ids
        .iter()
        .filter_map(|id| graph.task(id))
        .collect();

    if tasks.is_empty() {
        MilestoneStatus::Pending
    } else if tasks.iter().all(|t| t.is_complete()) {
        MilestoneStatus::Complete
    } else if tasks.iter().any(|t| t.end_date > milestone.target_date) {
        MilestoneStatus::AtRisk
    } else {
        MilestoneStatus::Pending
    }
}

/// Re-evaluates every milestone in place, returning the ones that changed.
pub fn evaluate_milestones(
    milestones: &mut [Milestone],
    graph: &ScheduleGraph,
) -> Vec<MilestoneChange> {
    let mut changes = Vec::new();
    for milestone in milestones.iter_mut() {
        let status = evaluate_milestone(milestone, graph);
        if status != milestone.status {
            debug!(milestone_id = %milestone.id, ?status, "milestone status changed");
            changes.push(MilestoneChange {
                milestone_id: milestone.id.clone(),
                old: milestone.status,
                new: status,
            });
            milestone.status = status;
        }
    }
    changes
}
