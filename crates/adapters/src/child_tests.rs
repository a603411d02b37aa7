// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use crate::child::{ChildSignal, SpawnRequest};
use crate::test_support::FakeChildSpawner;
use crate::ChildSpawner;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

fn request() -> SpawnRequest {
    SpawnRequest {
        executable: "fake-executor".to_string(),
        tasks_file: PathBuf::from("tasks.toml"),
        run_dir: PathBuf::from("/tmp/run"),
        executor: "claude".to_string(),
        start_index: 0,
        pipeline_branch: Some("pipeline".to_string()),
        worktree_dir: Some(PathBuf::from("/tmp/wt")),
        no_git: false,
        env: HashMap::new(),
    }
}

#[test]
fn argv_includes_conditional_flags_in_order() {
    let argv = request().argv();
    assert_eq!(
        argv,
        vec![
            "tasks.toml",
            "--run-dir",
            "/tmp/run",
            "--executor",
            "claude",
            "--start-index",
            "0",
            "--pipeline-branch",
            "pipeline",
            "--worktree-dir",
            "/tmp/wt",
        ]
    );
}

#[test]
fn full_env_sets_pythonunbuffered() {
    let env = request().full_env();
    assert_eq!(env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
}

#[test]
fn lane_env_override_wins_over_coordinator_env() {
    let mut req = request();
    req.env.insert("PYTHONUNBUFFERED".to_string(), "0".to_string());
    assert_eq!(req.full_env().get("PYTHONUNBUFFERED").map(String::as_str), Some("0"));
}

#[tokio::test]
async fn fake_spawner_reports_scripted_exit_code_and_stdout() {
    let spawner = FakeChildSpawner::new("hello\nworld\n", 2);
    let mut child = spawner.spawn(&request()).await.unwrap();
    let mut out = String::new();
    child.take_stdout().unwrap().read_to_string(&mut out).await.unwrap();
    assert_eq!(out, "hello\nworld\n");
    assert_eq!(child.wait().await, 2);
}

#[tokio::test]
async fn fake_spawner_records_signals() {
    let spawner = FakeChildSpawner::new("", 0);
    let child = spawner.spawn(&request()).await.unwrap();
    child.signal(ChildSignal::Term).unwrap();
    child.signal(ChildSignal::Kill).unwrap();
    assert_eq!(spawner.signals_received(), vec![ChildSignal::Term, ChildSignal::Kill]);
}
