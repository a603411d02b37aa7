// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use lanes_core::test_support::simple_lane;
use lanes_core::LaneStatus;

#[test]
fn round_trip_preserves_equality() {
    let dir = tempfile::tempdir().unwrap();
    let lane = simple_lane("alpha");
    let mut state = LaneRunState::pending(&lane);
    state.status = LaneStatus::Running;
    state.mark_task_completed("t1");
    state.advance_to(1);

    let path = dir.path().join("state.json");
    LaneStateStore::save(&path, &state).unwrap();
    let loaded = LaneStateStore::load(&path).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn load_or_pending_falls_back_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let lane = simple_lane("alpha");
    let path = dir.path().join("missing").join("state.json");
    let loaded = LaneStateStore::load_or_pending(&path, &lane).unwrap();
    assert_eq!(loaded, LaneRunState::pending(&lane));
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let lane = simple_lane("alpha");
    let state = LaneRunState::pending(&lane);
    let path = dir.path().join("lanes").join("alpha").join("state.json");
    LaneStateStore::save(&path, &state).unwrap();
    assert!(path.exists());
}

#[test]
fn save_overwrites_without_leaving_tmp_file() {
    let dir = tempfile::tempdir().unwrap();
    let lane = simple_lane("alpha");
    let mut state = LaneRunState::pending(&lane);
    let path = dir.path().join("state.json");
    LaneStateStore::save(&path, &state).unwrap();
    state.advance_to(1);
    LaneStateStore::save(&path, &state).unwrap();

    let loaded = LaneStateStore::load(&path).unwrap();
    assert_eq!(loaded.current_task_index, 1);
    assert!(!path.with_extension("json.tmp").exists());
}
