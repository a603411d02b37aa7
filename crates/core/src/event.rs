// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Event types for the lane orchestration engine.
//!
//! Events are fan-out only (pub/sub); subscribers may not mutate them
//! (spec.md §3). Serializes with `{"type": "category:name", ...fields}`,
//! the same tagging convention the teacher uses for its own event model.

use crate::dependency::DependencyRequestPlan;
use crate::message::ParsedMessage;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifies one orchestrator run; namespaces the run directory and is
    /// stamped onto every [`Event`].
    pub struct RunId("run-");
}

/// The eight event categories named in spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Orchestration,
    Lane,
    Task,
    Recovery,
    Git,
    Agent,
    State,
    System,
}

crate::simple_display! {
    EventCategory {
        Orchestration => "orchestration",
        Lane => "lane",
        Task => "task",
        Recovery => "recovery",
        Git => "git",
        Agent => "agent",
        State => "state",
        System => "system",
    }
}

/// A typed lifecycle record fanned out over the in-process event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- orchestration --
    #[serde(rename = "orchestration:run_started")]
    RunStarted { run_id: RunId, lane_count: usize, concurrency: usize, timestamp_epoch_ms: u64 },

    #[serde(rename = "orchestration:run_completed")]
    RunCompleted { run_id: RunId, exit_code: i32, timestamp_epoch_ms: u64 },

    // -- lane --
    #[serde(rename = "lane:started")]
    LaneStarted {
        run_id: RunId,
        lane_name: String,
        start_index: usize,
        timestamp_epoch_ms: u64,
    },

    #[serde(rename = "lane:completed")]
    LaneCompleted { run_id: RunId, lane_name: String, timestamp_epoch_ms: u64 },

    #[serde(rename = "lane:failed")]
    LaneFailed { run_id: RunId, lane_name: String, reason: String, timestamp_epoch_ms: u64 },

    #[serde(rename = "lane:blocked")]
    LaneBlocked {
        run_id: RunId,
        lane_name: String,
        request: DependencyRequestPlan,
        timestamp_epoch_ms: u64,
    },

    // -- task --
    #[serde(rename = "task:started")]
    TaskStarted {
        run_id: RunId,
        lane_name: String,
        task_name: String,
        task_index: usize,
        timestamp_epoch_ms: u64,
    },

    #[serde(rename = "task:completed")]
    TaskCompleted {
        run_id: RunId,
        lane_name: String,
        task_name: String,
        task_index: usize,
        timestamp_epoch_ms: u64,
    },

    // -- recovery --
    #[serde(rename = "recovery:nudged")]
    LaneNudged { run_id: RunId, lane_name: String, timestamp_epoch_ms: u64 },

    #[serde(rename = "recovery:restarted")]
    LaneRestarted {
        run_id: RunId,
        lane_name: String,
        restart_count: u32,
        timestamp_epoch_ms: u64,
    },

    #[serde(rename = "recovery:aborted")]
    LaneAborted { run_id: RunId, lane_name: String, timestamp_epoch_ms: u64 },

    // -- git --
    #[serde(rename = "git:resolution_committed")]
    ResolutionCommitted { run_id: RunId, changes: Vec<String>, timestamp_epoch_ms: u64 },

    #[serde(rename = "git:branch_synced")]
    BranchSynced { run_id: RunId, lane_name: String, timestamp_epoch_ms: u64 },

    #[serde(rename = "git:sync_failed")]
    BranchSyncFailed {
        run_id: RunId,
        lane_name: String,
        reason: String,
        timestamp_epoch_ms: u64,
    },

    // -- agent --
    #[serde(rename = "agent:message")]
    AgentMessage { run_id: RunId, lane_name: String, message: ParsedMessage },

    // -- state --
    #[serde(rename = "state:lane_updated")]
    LaneStateUpdated {
        run_id: RunId,
        lane_name: String,
        status: crate::run_state::LaneStatus,
        timestamp_epoch_ms: u64,
    },

    // -- system --
    #[serde(rename = "system:deadlock")]
    Deadlock { run_id: RunId, lane_names: Vec<String>, timestamp_epoch_ms: u64 },

    #[serde(rename = "system:shutdown")]
    Shutdown { run_id: RunId, timestamp_epoch_ms: u64 },
}

impl Event {
    pub fn category(&self) -> EventCategory {
        use Event::*;
        match self {
            RunStarted { .. } | RunCompleted { .. } => EventCategory::Orchestration,
            LaneStarted { .. } | LaneCompleted { .. } | LaneFailed { .. } | LaneBlocked { .. } => {
                EventCategory::Lane
            }
            TaskStarted { .. } | TaskCompleted { .. } => EventCategory::Task,
            LaneNudged { .. } | LaneRestarted { .. } | LaneAborted { .. } => {
                EventCategory::Recovery
            }
            ResolutionCommitted { .. } | BranchSynced { .. } | BranchSyncFailed { .. } => {
                EventCategory::Git
            }
            AgentMessage { .. } => EventCategory::Agent,
            LaneStateUpdated { .. } => EventCategory::State,
            Deadlock { .. } | Shutdown { .. } => EventCategory::System,
        }
    }

    pub fn run_id(&self) -> RunId {
        use Event::*;
        match self {
            RunStarted { run_id, .. }
            | RunCompleted { run_id, .. }
            | LaneStarted { run_id, .. }
            | LaneCompleted { run_id, .. }
            | LaneFailed { run_id, .. }
            | LaneBlocked { run_id, .. }
            | TaskStarted { run_id, .. }
            | TaskCompleted { run_id, .. }
            | LaneNudged { run_id, .. }
            | LaneRestarted { run_id, .. }
            | LaneAborted { run_id, .. }
            | ResolutionCommitted { run_id, .. }
            | BranchSynced { run_id, .. }
            | BranchSyncFailed { run_id, .. }
            | AgentMessage { run_id, .. }
            | LaneStateUpdated { run_id, .. }
            | Deadlock { run_id, .. }
            | Shutdown { run_id, .. } => *run_id,
        }
    }

    pub fn lane_name(&self) -> Option<&str> {
        use Event::*;
        match self {
            LaneStarted { lane_name, .. }
            | LaneCompleted { lane_name, .. }
            | LaneFailed { lane_name, .. }
            | LaneBlocked { lane_name, .. }
            | TaskStarted { lane_name, .. }
            | TaskCompleted { lane_name, .. }
            | LaneNudged { lane_name, .. }
            | LaneRestarted { lane_name, .. }
            | LaneAborted { lane_name, .. }
            | BranchSynced { lane_name, .. }
            | BranchSyncFailed { lane_name, .. }
            | AgentMessage { lane_name, .. }
            | LaneStateUpdated { lane_name, .. } => Some(lane_name),
            _ => None,
        }
    }

    pub fn timestamp_epoch_ms(&self) -> u64 {
        use Event::*;
        match self {
            RunStarted { timestamp_epoch_ms, .. }
            | RunCompleted { timestamp_epoch_ms, .. }
            | LaneStarted { timestamp_epoch_ms, .. }
            | LaneCompleted { timestamp_epoch_ms, .. }
            | LaneFailed { timestamp_epoch_ms, .. }
            | LaneBlocked { timestamp_epoch_ms, .. }
            | TaskStarted { timestamp_epoch_ms, .. }
            | TaskCompleted { timestamp_epoch_ms, .. }
            | LaneNudged { timestamp_epoch_ms, .. }
            | LaneRestarted { timestamp_epoch_ms, .. }
            | LaneAborted { timestamp_epoch_ms, .. }
            | ResolutionCommitted { timestamp_epoch_ms, .. }
            | BranchSynced { timestamp_epoch_ms, .. }
            | BranchSyncFailed { timestamp_epoch_ms, .. }
            | LaneStateUpdated { timestamp_epoch_ms, .. }
            | Deadlock { timestamp_epoch_ms, .. }
            | Shutdown { timestamp_epoch_ms, .. } => *timestamp_epoch_ms,
            AgentMessage { message, .. } => message.timestamp_epoch_ms,
        }
    }

    /// The serialized `type` tag (e.g. `"lane:started"`), for subscribers
    /// that filter the event bus by exact type rather than by category
    /// (spec.md §6: "Subscribers may register per event type, per category
    /// wildcard, or global").
    pub fn type_tag(&self) -> &'static str {
        use Event::*;
        match self {
            RunStarted { .. } => "orchestration:run_started",
            RunCompleted { .. } => "orchestration:run_completed",
            LaneStarted { .. } => "lane:started",
            LaneCompleted { .. } => "lane:completed",
            LaneFailed { .. } => "lane:failed",
            LaneBlocked { .. } => "lane:blocked",
            TaskStarted { .. } => "task:started",
            TaskCompleted { .. } => "task:completed",
            LaneNudged { .. } => "recovery:nudged",
            LaneRestarted { .. } => "recovery:restarted",
            LaneAborted { .. } => "recovery:aborted",
            ResolutionCommitted { .. } => "git:resolution_committed",
            BranchSynced { .. } => "git:branch_synced",
            BranchSyncFailed { .. } => "git:sync_failed",
            AgentMessage { .. } => "agent:message",
            LaneStateUpdated { .. } => "state:lane_updated",
            Deadlock { .. } => "system:deadlock",
            Shutdown { .. } => "system:shutdown",
        }
    }

    /// One-line summary for structured logging (teacher idiom: see
    /// `Effect::fields`/`Event::log_summary` in the teacher's core crate).
    pub fn log_summary(&self) -> String {
        match self.lane_name() {
            Some(lane) => format!("{} lane={}", self.category(), lane),
            None => self.category().to_string(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
