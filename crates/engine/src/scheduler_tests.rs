// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use lanes_core::test_support::{lane_with_tasks, simple_lane};
use lanes_core::{DependencyRequestPlan, LaneSet};
use yare::parameterized;

fn set(lanes: Vec<lanes_core::Lane>) -> LaneSet {
    LaneSet::new(lanes).unwrap()
}

#[test]
fn empty_dependency_list_is_always_ready() {
    let scheduler = Scheduler::new(set(vec![simple_lane("a")]), 2, true);
    assert_eq!(scheduler.readiness("a"), Readiness::Ready);
}

#[test]
fn lane_level_chain_gates_until_dependency_completes() {
    let a = simple_lane("a");
    let mut b = simple_lane("b");
    b.depends_on.push("a".into());
    let mut scheduler = Scheduler::new(set(vec![a, b]), 2, true);

    let tick = scheduler.tick();
    assert_eq!(tick.to_start, vec!["a".to_string()]);
    scheduler.mark_started("a");
    assert_eq!(scheduler.readiness("b"), Readiness::Waiting);

    scheduler.observe_exit("a", 0, None, false, 1);
    let tick = scheduler.tick();
    assert_eq!(tick.to_start, vec!["b".to_string()]);
}

#[test]
fn task_level_gate_is_satisfied_while_dependency_still_running() {
    let a = lane_with_tasks("a", 3);
    let mut b = simple_lane("b");
    b.depends_on.push("a:t2".into());
    let mut scheduler = Scheduler::new(set(vec![a.clone(), b]), 2, true);

    scheduler.mark_started("a");
    assert_eq!(scheduler.readiness("b"), Readiness::Waiting);

    let mut state = lanes_core::LaneRunState::pending(&a);
    state.mark_task_completed("t1");
    state.mark_task_completed("t2");
    state.advance_to(2);
    scheduler.sync_state("a", state);

    assert_eq!(scheduler.readiness("b"), Readiness::Ready);
    let tick = scheduler.tick();
    assert!(tick.to_start.contains(&"b".to_string()));
    assert!(scheduler.running().contains("a"));
}

#[test]
fn numeric_task_edge_is_satisfied_when_completed_lane_has_fewer_tasks() {
    let a = simple_lane("a");
    let mut b = simple_lane("b");
    b.depends_on.push("a:5".into());
    let mut scheduler = Scheduler::new(set(vec![a, b]), 2, true);
    scheduler.mark_started("a");
    scheduler.observe_exit("a", 0, None, false, 1);
    assert_eq!(scheduler.readiness("b"), Readiness::Ready);
}

#[test]
fn fail_fast_propagates_to_dependents_without_starting_them() {
    let a = simple_lane("a");
    let mut b = simple_lane("b");
    b.depends_on.push("a".into());
    let mut scheduler = Scheduler::new(set(vec![a, b]), 2, true);

    scheduler.mark_started("a");
    let outcome = scheduler.observe_exit("a", 1, None, false, 0);
    assert!(matches!(outcome, ExitOutcome::Failed(_)));

    let tick = scheduler.tick();
    assert!(tick.to_start.is_empty());
    assert!(scheduler.failed().contains("a"));
    assert!(scheduler.failed().contains("b"));
    assert!(tick.newly_failed.iter().any(|(name, _)| name == "b"));
}

#[test]
fn blocked_dependency_leaves_dependent_waiting_not_failed() {
    let a = simple_lane("a");
    let mut b = simple_lane("b");
    b.depends_on.push("a".into());
    let mut scheduler = Scheduler::new(set(vec![a, b]), 2, true);
    scheduler.mark_started("a");
    let plan = DependencyRequestPlan {
        reason: "need pkg".to_string(),
        changes: vec!["pkg.json".to_string()],
        commands: vec!["npm i".to_string()],
    };
    scheduler.observe_exit("a", 2, Some(plan), false, 1);
    assert_eq!(scheduler.readiness("b"), Readiness::Waiting);
    assert!(!scheduler.failed().contains("b"));
}

#[test]
fn exit_code_2_without_request_is_a_failure() {
    let mut scheduler = Scheduler::new(set(vec![simple_lane("a")]), 1, true);
    scheduler.mark_started("a");
    let outcome = scheduler.observe_exit("a", 2, None, false, 0);
    assert_eq!(outcome, ExitOutcome::MalformedBlock);
    assert!(scheduler.failed().contains("a"));
}

#[test]
fn blocked_lane_retries_from_pre_block_task_index() {
    let mut scheduler = Scheduler::new(set(vec![lane_with_tasks("a", 3)]), 1, true);
    scheduler.mark_started("a");
    let plan = DependencyRequestPlan {
        reason: "r".to_string(),
        changes: vec!["c".to_string()],
        commands: vec!["cmd".to_string()],
    };
    scheduler.observe_exit("a", 2, Some(plan), false, 2);
    assert_eq!(scheduler.start_index("a"), 1);
    scheduler.clear_resolved(&["a".to_string()]);
    let tick = scheduler.tick();
    assert_eq!(tick.to_start, vec!["a".to_string()]);
}

#[test]
fn restart_pending_keeps_current_task_index_and_is_not_a_failure() {
    let mut scheduler = Scheduler::new(set(vec![lane_with_tasks("a", 3)]), 1, true);
    scheduler.mark_started("a");
    let outcome = scheduler.observe_exit("a", 9, None, true, 1);
    assert_eq!(outcome, ExitOutcome::RestartPending);
    assert!(!scheduler.failed().contains("a"));
    assert_eq!(scheduler.start_index("a"), 1);
}

#[test]
fn deadlock_fails_every_unreachable_lane() {
    let mut a = simple_lane("a");
    a.depends_on.push("b".into());
    let mut b = simple_lane("b");
    b.depends_on.push("a".into());
    // Self-referencing cycle would be rejected at LaneSet::new time, so
    // build the set manually to simulate deadlock via external state
    // instead: both lanes depend on a third lane that never resolves.
    let mut scheduler = Scheduler::new(set(vec![a, b, simple_lane("c")]), 2, true);
    scheduler.mark_started("c");
    scheduler.observe_exit("c", 2, None, false, 0);
    // "c" is blocked forever (no resolver run in this test); a/b depend on
    // each other indirectly through nothing ready — deadlock triggers only
    // once running is empty and nothing is ready.
    let tick = scheduler.tick();
    assert!(tick.deadlocked);
    assert!(scheduler.failed().contains("a"));
    assert!(scheduler.failed().contains("b"));
}

#[test]
fn termination_waits_for_blocked_when_auto_resolve_enabled() {
    let mut scheduler = Scheduler::new(set(vec![simple_lane("a")]), 1, true);
    scheduler.mark_started("a");
    let plan = DependencyRequestPlan {
        reason: "r".to_string(),
        changes: vec!["c".to_string()],
        commands: vec!["cmd".to_string()],
    };
    scheduler.observe_exit("a", 2, Some(plan), false, 0);
    let tick = scheduler.tick();
    assert!(!tick.done);
}

#[test]
fn termination_completes_with_blocked_when_auto_resolve_disabled() {
    let mut scheduler = Scheduler::new(set(vec![simple_lane("a")]), 1, false);
    scheduler.mark_started("a");
    let plan = DependencyRequestPlan {
        reason: "r".to_string(),
        changes: vec!["c".to_string()],
        commands: vec!["cmd".to_string()],
    };
    scheduler.observe_exit("a", 2, Some(plan), false, 0);
    let tick = scheduler.tick();
    assert!(tick.done);
    assert_eq!(scheduler.exit_code(), 2);
}

#[test]
fn exit_code_is_one_when_any_lane_failed() {
    let mut scheduler = Scheduler::new(set(vec![simple_lane("a")]), 1, true);
    scheduler.mark_started("a");
    scheduler.observe_exit("a", 1, None, false, 0);
    assert_eq!(scheduler.exit_code(), 1);
}

#[parameterized(
    zero_index = ("a:0", 1, true),
    short_lane_still_satisfies = ("a:50", 1, true),
    name_match = ("a:t1", 1, true),
    unknown_name_never_satisfied_until_completion = ("a:nonexistent", 0, false),
)]
fn numeric_and_name_task_edges(case: (&str, usize, bool)) {
    let (edge, completed_index, expect_satisfied) = case;
    let a = lane_with_tasks("a", 1);
    let mut b = simple_lane("b");
    b.depends_on.push(edge.into());
    let mut scheduler = Scheduler::new(set(vec![a.clone(), b]), 2, true);
    scheduler.mark_started("a");
    let mut state = lanes_core::LaneRunState::pending(&a);
    state.advance_to(completed_index);
    scheduler.sync_state("a", state);
    let ready = scheduler.readiness("b") == Readiness::Ready;
    assert_eq!(ready, expect_satisfied);
}
