// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;

#[test]
fn task_ref_parses_numeric_string_as_index() {
    assert_eq!(TaskRef::parse("3"), TaskRef::Index(3));
}

#[test]
fn task_ref_parses_non_numeric_string_as_name() {
    assert_eq!(TaskRef::parse("build"), TaskRef::Name("build".to_string()));
}

#[test]
fn task_ref_display_round_trips() {
    assert_eq!(TaskRef::Name("build".to_string()).to_string(), "build");
    assert_eq!(TaskRef::Index(2).to_string(), "2");
}

#[test]
fn dependency_edge_parses_lane_form() {
    let edge: DependencyEdge = "frontend".into();
    assert_eq!(edge, DependencyEdge::Lane("frontend".to_string()));
    assert_eq!(edge.lane_name(), "frontend");
}

#[test]
fn dependency_edge_parses_task_name_form() {
    let edge: DependencyEdge = "backend:migrate".into();
    assert_eq!(
        edge,
        DependencyEdge::Task("backend".to_string(), TaskRef::Name("migrate".to_string()))
    );
}

#[test]
fn dependency_edge_parses_task_index_form() {
    let edge: DependencyEdge = "backend:0".into();
    assert_eq!(edge, DependencyEdge::Task("backend".to_string(), TaskRef::Index(0)));
}

#[test]
fn dependency_edge_display_round_trips_through_string() {
    for raw in ["frontend", "backend:migrate", "backend:0"] {
        let edge: DependencyEdge = raw.into();
        assert_eq!(edge.to_string(), raw);
        let reparsed: DependencyEdge = edge.to_string().into();
        assert_eq!(edge, reparsed);
    }
}

#[test]
fn dependency_edge_serde_round_trips_as_string() {
    let edge = DependencyEdge::Task("backend".to_string(), TaskRef::Name("migrate".to_string()));
    let json = serde_json::to_string(&edge).unwrap();
    assert_eq!(json, "\"backend:migrate\"");
    let parsed: DependencyEdge = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, edge);
}

#[test]
fn lane_policy_default_enables_auto_resolve_only() {
    let policy = LanePolicy::default();
    assert!(policy.auto_resolve);
    assert!(!policy.review);
    assert_eq!(policy.output_format, AgentOutputFormat::Ndjson);
}

#[test]
fn lane_first_task_returns_none_for_empty_task_list() {
    let lane = LaneBuilder::default().tasks(vec![]).build();
    assert!(lane.first_task().is_none());
}

#[test]
fn lane_task_index_finds_by_name_and_index() {
    let lane = LaneBuilder::default()
        .tasks(vec![Task::simple("a", "p1"), Task::simple("b", "p2")])
        .build();
    assert_eq!(lane.task_index(&TaskRef::Name("b".to_string())), Some(1));
    assert_eq!(lane.task_index(&TaskRef::Index(0)), Some(0));
    assert_eq!(lane.task_index(&TaskRef::Index(9)), None);
    assert_eq!(lane.task_index(&TaskRef::Name("missing".to_string())), None);
}

#[test]
fn lane_task_name_at_returns_name_or_none() {
    let lane = LaneBuilder::default().tasks(vec![Task::simple("a", "p1")]).build();
    assert_eq!(lane.task_name_at(0), Some("a"));
    assert_eq!(lane.task_name_at(1), None);
}

#[test]
fn task_timeout_serializes_as_seconds() {
    let task = Task {
        name: "t".to_string(),
        prompt: "p".to_string(),
        depends_on: Vec::new(),
        model: None,
        timeout: Some(std::time::Duration::from_secs(90)),
    };
    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["timeout"], 90);
}

#[test]
fn lane_builder_produces_distinct_instances() {
    let a = LaneBuilder::default().name("a").build();
    let b = LaneBuilder::default().name("b").build();
    assert_eq!(a.name, "a");
    assert_eq!(b.name, "b");
}
