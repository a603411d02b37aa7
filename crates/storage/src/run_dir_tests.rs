// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use lanes_core::test_support::test_run_id;

#[test]
fn lane_paths_nest_under_run_root() {
    let dir = RunDir::new("/var/log/lanes", test_run_id());
    assert_eq!(dir.state_path("alpha"), dir.lane_dir("alpha").join("state.json"));
    assert_eq!(dir.intervention_path("alpha").file_name().unwrap(), "intervention.txt");
    assert!(dir.root().starts_with("/var/log/lanes/runs"));
}

#[test]
fn resolution_worktree_is_a_sibling_of_lanes() {
    let dir = RunDir::new("/var/log/lanes", test_run_id());
    assert_eq!(dir.resolution_worktree(), dir.root().join("resolution-worktree"));
}

#[test]
fn dependency_request_path_is_worktree_relative() {
    let path = RunDir::dependency_request_path(Path::new("/repo/lane-a"));
    assert_eq!(path, Path::new("/repo/lane-a/_cursorflow/dependency-request.json"));
}
