// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use crate::errors::LaneSetError;
use crate::lane::LaneBuilder;
use std::path::PathBuf;

fn lane(name: &str) -> Lane {
    LaneBuilder::default()
        .name(name)
        .worktree_root(PathBuf::from(format!("/tmp/{name}")))
        .build()
}

#[test]
fn accepts_two_independent_lanes() {
    let set = LaneSet::new(vec![lane("a"), lane("b")]).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn accepts_a_lane_level_chain() {
    let b = LaneBuilder::default().name("b").depends_on(vec!["a".into()]).build();
    let set = LaneSet::new(vec![lane("a"), b]).unwrap();
    assert!(set.get("b").is_some());
}

#[test]
fn accepts_a_task_level_gate_on_an_existing_task() {
    let a = LaneBuilder::default()
        .name("a")
        .tasks(vec![Task::simple("setup", "p"), Task::simple("build", "p")])
        .build();
    let b = LaneBuilder::default().name("b").depends_on(vec!["a:setup".into()]).build();
    let set = LaneSet::new(vec![a, b]).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn rejects_empty_lane() {
    let empty = LaneBuilder::default().name("empty").tasks(vec![]).build();
    let err = LaneSet::new(vec![empty]).unwrap_err();
    assert_eq!(err, LaneSetError::EmptyLane("empty".to_string()));
}

#[test]
fn rejects_duplicate_lane_names() {
    let err = LaneSet::new(vec![lane("a"), lane("a")]).unwrap_err();
    assert_eq!(err, LaneSetError::DuplicateLaneName("a".to_string()));
}

#[test]
fn rejects_duplicate_task_names_within_a_lane() {
    let dup = LaneBuilder::default()
        .name("a")
        .tasks(vec![Task::simple("build", "p1"), Task::simple("build", "p2")])
        .build();
    let err = LaneSet::new(vec![dup]).unwrap_err();
    assert_eq!(err, LaneSetError::DuplicateTaskName("a".to_string(), "build".to_string()));
}

#[test]
fn rejects_reference_to_unknown_lane() {
    let a = LaneBuilder::default().name("a").depends_on(vec!["ghost".into()]).build();
    let err = LaneSet::new(vec![a]).unwrap_err();
    assert_eq!(err, LaneSetError::UnknownLaneReference("a".to_string(), "ghost".to_string()));
}

#[test]
fn accepts_reference_to_unknown_task_name() {
    // spec.md §3: unknown task names are permitted at load time; they
    // simply never become satisfied unless the referenced lane completes
    // (spec.md §4.2).
    let a_dep = LaneBuilder::default().name("a").build();
    let b = LaneBuilder::default().name("b").depends_on(vec!["a:no_such_task".into()]).build();
    let set = LaneSet::new(vec![a_dep, b]).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn rejects_self_dependency() {
    let a = LaneBuilder::default().name("a").depends_on(vec!["a".into()]).build();
    let err = LaneSet::new(vec![a]).unwrap_err();
    assert_eq!(err, LaneSetError::SelfDependency("a".to_string()));
}

#[test]
fn rejects_two_lane_cycle() {
    let a = LaneBuilder::default().name("a").depends_on(vec!["b".into()]).build();
    let b = LaneBuilder::default().name("b").depends_on(vec!["a".into()]).build();
    let err = LaneSet::new(vec![a, b]).unwrap_err();
    assert!(matches!(err, LaneSetError::Cycle(_)));
}

#[test]
fn accepts_diamond_shaped_dependencies() {
    let a = lane("a");
    let b = LaneBuilder::default().name("b").depends_on(vec!["a".into()]).build();
    let c = LaneBuilder::default().name("c").depends_on(vec!["a".into()]).build();
    let d = LaneBuilder::default()
        .name("d")
        .depends_on(vec!["b".into(), "c".into()])
        .build();
    let set = LaneSet::new(vec![a, b, c, d]).unwrap();
    assert_eq!(set.len(), 4);
}

#[test]
fn round_trips_through_toml() {
    let set = LaneSet::new(vec![lane("a"), lane("b")]).unwrap();
    let toml_str = toml::to_string(&set).unwrap();
    let parsed: LaneSet = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, set);
}
