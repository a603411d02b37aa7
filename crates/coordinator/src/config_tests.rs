// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use std::io::Write;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lanes.toml");
    let mut file = std::fs::File::create(&path).expect("create config file");
    file.write_all(contents.as_bytes()).expect("write config file");
    (dir, path)
}

#[test]
fn loads_a_minimal_single_lane_config_with_defaults() {
    let (_dir, path) = write_config(
        r#"
        [[lane]]
        name = "alpha"
        worktree_root = "/tmp/alpha"
        base_branch = "main"
        pipeline_branch = "pipeline/alpha"

        [[lane.tasks]]
        name = "build"
        prompt = "build the thing"
        "#,
    );

    let run_config = RunConfig::load(&path).expect("valid config");
    assert_eq!(run_config.lane_set.len(), 1);
    assert_eq!(run_config.coordinator.concurrency, CoordinatorConfig::default().concurrency);
}

#[test]
fn overrides_coordinator_settings_from_the_file() {
    let (_dir, path) = write_config(
        r#"
        concurrency = 8
        auto_resolve = false
        tick_interval_secs = 30
        continue_threshold_secs = 120
        restart_threshold_secs = 240
        max_restarts = 5
        executable = "custom-agent"
        executor = "codex"
        no_git = true

        [[lane]]
        name = "alpha"
        worktree_root = "/tmp/alpha"
        base_branch = "main"
        pipeline_branch = "pipeline/alpha"

        [[lane.tasks]]
        name = "build"
        prompt = "build the thing"
        "#,
    );

    let run_config = RunConfig::load(&path).expect("valid config");
    assert_eq!(run_config.coordinator.concurrency, 8);
    assert!(!run_config.coordinator.auto_resolve_enabled);
    assert_eq!(run_config.coordinator.tick_interval, Duration::from_secs(30));
    assert_eq!(run_config.coordinator.stall_thresholds.continue_threshold, Duration::from_secs(120));
    assert_eq!(run_config.coordinator.stall_thresholds.restart_threshold, Duration::from_secs(240));
    assert_eq!(run_config.coordinator.stall_thresholds.max_restarts, 5);
    assert_eq!(run_config.coordinator.executable, "custom-agent");
    assert_eq!(run_config.coordinator.executor, "codex");
    assert!(run_config.coordinator.no_git);
}

#[test]
fn rejects_a_lane_set_with_an_unknown_dependency_reference() {
    let (_dir, path) = write_config(
        r#"
        [[lane]]
        name = "alpha"
        worktree_root = "/tmp/alpha"
        base_branch = "main"
        pipeline_branch = "pipeline/alpha"
        depends_on = ["ghost"]

        [[lane.tasks]]
        name = "build"
        prompt = "build the thing"
        "#,
    );

    let err = RunConfig::load(&path).expect_err("unknown lane reference should fail validation");
    assert!(matches!(err, ConfigError::Lanes(LaneSetError::UnknownLaneReference(..))));
}

#[test]
fn missing_file_surfaces_a_read_error() {
    let missing = PathBuf::from("/nonexistent/lanes.toml");
    let err = RunConfig::load(&missing).expect_err("missing file should fail");
    assert!(matches!(err, ConfigError::Read { .. }));
}
