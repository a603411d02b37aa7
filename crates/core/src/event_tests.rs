// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use crate::message::ParsedMessage;

fn run_id() -> RunId {
    RunId::from_string("run-test0000000000000a1")
}

#[test]
fn category_maps_lane_events_to_lane_category() {
    let event = Event::LaneStarted {
        run_id: run_id(),
        lane_name: "a".to_string(),
        start_index: 0,
        timestamp_epoch_ms: 1,
    };
    assert_eq!(event.category(), EventCategory::Lane);
}

#[test]
fn category_maps_agent_message_to_agent_category() {
    let event = Event::AgentMessage {
        run_id: run_id(),
        lane_name: "a".to_string(),
        message: ParsedMessage::raw_line("hi", 5),
    };
    assert_eq!(event.category(), EventCategory::Agent);
    assert_eq!(event.timestamp_epoch_ms(), 5);
}

#[test]
fn lane_name_is_none_for_run_scoped_events() {
    let event = Event::RunStarted {
        run_id: run_id(),
        lane_count: 2,
        concurrency: 2,
        timestamp_epoch_ms: 0,
    };
    assert_eq!(event.lane_name(), None);
    assert_eq!(event.category(), EventCategory::Orchestration);
}

#[test]
fn lane_name_is_some_for_lane_scoped_events() {
    let event = Event::LaneFailed {
        run_id: run_id(),
        lane_name: "backend".to_string(),
        reason: "exit 1".to_string(),
        timestamp_epoch_ms: 9,
    };
    assert_eq!(event.lane_name(), Some("backend"));
}

#[test]
fn event_serializes_with_tagged_type_field() {
    let event = Event::TaskCompleted {
        run_id: run_id(),
        lane_name: "a".to_string(),
        task_name: "build".to_string(),
        task_index: 0,
        timestamp_epoch_ms: 3,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "task:completed");
    assert_eq!(json["task_name"], "build");
}

#[test]
fn event_round_trips_through_json() {
    let event = Event::Deadlock {
        run_id: run_id(),
        lane_names: vec!["a".to_string(), "b".to_string()],
        timestamp_epoch_ms: 7,
    };
    let json = serde_json::to_string(&event).unwrap();
    let parsed: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, event);
}

#[test]
fn log_summary_includes_lane_name_when_present() {
    let event = Event::LaneNudged { run_id: run_id(), lane_name: "a".to_string(), timestamp_epoch_ms: 0 };
    assert_eq!(event.log_summary(), "recovery lane=a");
}

#[test]
fn log_summary_omits_lane_name_when_absent() {
    let event = Event::Shutdown { run_id: run_id(), timestamp_epoch_ms: 0 };
    assert_eq!(event.log_summary(), "system");
}
