// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Lane Run State — the mutable, per-lane progress record persisted under
//! the run directory (spec.md §3, §6).

use crate::dependency::DependencyRequestPlan;
use crate::lane::{Lane, TaskRef};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Status of a lane within a run.
///
/// `Completed` and `Failed` are the only terminal statuses; once entered
/// they never transition again for the life of the run (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneStatus {
    Pending,
    Waiting,
    Running,
    Blocked,
    Reviewing,
    Paused,
    Completed,
    Failed,
}

crate::simple_display! {
    LaneStatus {
        Pending => "pending",
        Waiting => "waiting",
        Running => "running",
        Blocked => "blocked",
        Reviewing => "reviewing",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
    }
}

impl LaneStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaneStatus::Completed | LaneStatus::Failed)
    }
}

/// The mutable progress record for one lane (spec.md §3).
///
/// Exclusively written by the Lane Supervisor that owns the lane's child
/// process; the Scheduler and Resolver only read it, except that the
/// Scheduler may transition a lane straight to `Failed` when it concludes
/// the lane is unreachable (deadlock or failed dependency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRunState {
    pub lane_name: String,
    pub status: LaneStatus,
    pub current_task_index: usize,
    pub total_tasks: usize,
    #[serde(default)]
    pub completed_task_names: Vec<String>,
    pub worktree_dir: PathBuf,
    pub pipeline_branch: String,
    #[serde(default)]
    pub start_time_epoch_ms: Option<u64>,
    #[serde(default)]
    pub end_time_epoch_ms: Option<u64>,
    #[serde(default)]
    pub last_child_pid: Option<u32>,
    #[serde(default)]
    pub dependency_request: Option<DependencyRequestPlan>,
    /// Number of restarts the Stall Controller has triggered for this lane
    /// (bounded, see spec.md §4.3 and §9).
    #[serde(default)]
    pub restart_count: u32,
}

impl LaneRunState {
    /// The initial state for a lane that has not yet been started.
    pub fn pending(lane: &Lane) -> Self {
        Self {
            lane_name: lane.name.clone(),
            status: LaneStatus::Pending,
            current_task_index: 0,
            total_tasks: lane.tasks.len(),
            completed_task_names: Vec::new(),
            worktree_dir: lane.worktree_root.clone(),
            pipeline_branch: lane.pipeline_branch.clone(),
            start_time_epoch_ms: None,
            end_time_epoch_ms: None,
            last_child_pid: None,
            dependency_request: None,
            restart_count: 0,
        }
    }

    /// Whether `reference` names a task this lane has already completed
    /// (spec.md §4.2 readiness predicate, rule 2 for `X:T` edges).
    pub fn has_completed_task(&self, reference: &TaskRef) -> bool {
        match reference {
            TaskRef::Name(name) => self.completed_task_names.iter().any(|n| n == name),
            TaskRef::Index(i) => self.current_task_index > *i as usize,
        }
    }

    /// Record a task as completed. Idempotent: re-marking the same name is
    /// a no-op, preserving the append-only invariant (spec.md §3).
    pub fn mark_task_completed(&mut self, name: &str) {
        if !self.completed_task_names.iter().any(|n| n == name) {
            self.completed_task_names.push(name.to_string());
        }
    }

    /// Advance `current_task_index`. Never decreases within one child
    /// process's lifetime (spec.md §3, §8).
    pub fn advance_to(&mut self, index: usize) {
        if index > self.current_task_index {
            self.current_task_index = index;
        }
    }
}

#[cfg(test)]
#[path = "run_state_tests.rs"]
mod tests;
