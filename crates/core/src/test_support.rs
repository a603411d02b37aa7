// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::dependency::DependencyRequestPlan;
use crate::event::{Event, RunId};
use crate::lane::{Lane, LaneBuilder, Task};
use crate::run_state::LaneRunState;
use std::path::PathBuf;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::run_state::LaneStatus;
    use proptest::prelude::*;

    pub fn arb_lane_status() -> impl Strategy<Value = LaneStatus> {
        prop_oneof![
            Just(LaneStatus::Pending),
            Just(LaneStatus::Waiting),
            Just(LaneStatus::Running),
            Just(LaneStatus::Blocked),
            Just(LaneStatus::Reviewing),
            Just(LaneStatus::Paused),
            Just(LaneStatus::Completed),
            Just(LaneStatus::Failed),
        ]
    }
}

// ── Lane / task factory functions ───────────────────────────────────────

/// A minimal single-task lane named `name`, rooted under a throwaway path.
pub fn simple_lane(name: &str) -> Lane {
    LaneBuilder::default()
        .name(name)
        .worktree_root(PathBuf::from(format!("/tmp/{name}")))
        .tasks(vec![Task::simple("t1", "do the thing")])
        .build()
}

/// A lane with `n` sequential tasks named `t1..tn`.
pub fn lane_with_tasks(name: &str, n: usize) -> Lane {
    let tasks = (1..=n).map(|i| Task::simple(format!("t{i}"), format!("step {i}"))).collect();
    LaneBuilder::default()
        .name(name)
        .worktree_root(PathBuf::from(format!("/tmp/{name}")))
        .tasks(tasks)
        .build()
}

/// A lane that depends on `dep` at the lane level.
pub fn lane_depending_on(name: &str, dep: &str) -> Lane {
    LaneBuilder::default()
        .name(name)
        .worktree_root(PathBuf::from(format!("/tmp/{name}")))
        .tasks(vec![Task::simple("t1", "do the thing")])
        .depends_on(vec![dep.into()])
        .build()
}

pub fn pending_state(lane: &Lane) -> LaneRunState {
    LaneRunState::pending(lane)
}

pub fn actionable_request() -> DependencyRequestPlan {
    DependencyRequestPlan {
        reason: "need a new dependency".to_string(),
        changes: vec!["package.json".to_string()],
        commands: vec!["npm install left-pad".to_string()],
    }
}

// ── Event factory functions ─────────────────────────────────────────────

pub fn test_run_id() -> RunId {
    RunId::from_string("run-test000000000000001")
}

pub fn run_started_event(lane_count: usize) -> Event {
    Event::RunStarted {
        run_id: test_run_id(),
        lane_count,
        concurrency: lane_count,
        timestamp_epoch_ms: 0,
    }
}

pub fn lane_started_event(lane_name: &str) -> Event {
    Event::LaneStarted {
        run_id: test_run_id(),
        lane_name: lane_name.to_string(),
        start_index: 0,
        timestamp_epoch_ms: 0,
    }
}

pub fn lane_completed_event(lane_name: &str) -> Event {
    Event::LaneCompleted {
        run_id: test_run_id(),
        lane_name: lane_name.to_string(),
        timestamp_epoch_ms: 0,
    }
}

pub fn lane_blocked_event(lane_name: &str) -> Event {
    Event::LaneBlocked {
        run_id: test_run_id(),
        lane_name: lane_name.to_string(),
        request: actionable_request(),
        timestamp_epoch_ms: 0,
    }
}

pub fn task_completed_event(lane_name: &str, task_name: &str, index: usize) -> Event {
    Event::TaskCompleted {
        run_id: test_run_id(),
        lane_name: lane_name.to_string(),
        task_name: task_name.to_string(),
        task_index: index,
        timestamp_epoch_ms: 0,
    }
}
