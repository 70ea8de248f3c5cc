//! Scheduling behaviour switches.
//!
//! Callers usually deserialize this from their own settings file; every
//! field has a default so an empty object is a valid configuration.
//!
//! ```
//! use site_schedule::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::new().with_lock_completed(true);
//! assert!(config.pull_forward);
//! assert!(config.lock_completed);
//! ```

use serde::{Deserialize, Serialize};

/// Options shared by the cascade propagator and the auto-scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Move successors earlier when their predecessors move earlier.
    /// When `false` a cascade only ever pushes dates later.
    pub pull_forward: bool,
    /// Keep completed tasks where they are; conflicting predecessors
    /// produce a `LockedTaskConflict` instead of moving them.
    pub lock_completed: bool,
    /// Never let the auto-scheduler start a task before the project start,
    /// even when a negative lag would allow it.
    pub clamp_to_project_start: bool,
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            pull_forward: true,
            lock_completed: false,
            clamp_to_project_start: true,
        }
    }

    /// Sets pull-forward behaviour.
    pub fn with_pull_forward(mut self, pull_forward: bool) -> Self {
        self.pull_forward = pull_forward;
        self
    }

    /// Sets completed-task locking.
    pub fn with_lock_completed(mut self, lock_completed: bool) -> Self {
        self.lock_completed = lock_completed;
        self
    }

    /// Sets the project-start floor.
    pub fn with_clamp_to_project_start(mut self, clamp: bool) -> Self {
        self.clamp_to_project_start = clamp;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}
