// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use lanes_adapters::test_support::FakeChildSpawner;
use lanes_core::{FakeClock, RunId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn spec(lane_name: &str) -> LaunchSpec {
    LaunchSpec {
        lane_name: lane_name.to_string(),
        request: SpawnRequest {
            executable: "agent".to_string(),
            tasks_file: PathBuf::from("tasks.json"),
            run_dir: PathBuf::from("/tmp/run"),
            executor: "claude".to_string(),
            start_index: 0,
            pipeline_branch: None,
            worktree_dir: None,
            no_git: true,
            env: HashMap::new(),
        },
    }
}

#[tokio::test]
async fn spawn_surfaces_exit_code_and_parsed_messages() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let run_dir = RunDir::new(tmp.path(), RunId::new());
    let spawner: Arc<dyn ChildSpawner> =
        Arc::new(FakeChildSpawner::new("{\"type\":\"result\",\"summary\":\"done\"}\n", 0));
    let supervisor = Supervisor::new(spawner, run_dir, FakeClock::new());

    let handle = supervisor.spawn(&spec("alpha")).await.expect("spawn succeeds");
    let mut waiter = handle.waiter;

    let mut messages = Vec::new();
    while let Some(msg) = waiter.recv_message().await {
        messages.push(msg);
    }
    let exit_code = waiter.wait().await;

    assert_eq!(exit_code, 0);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "done");
}

#[tokio::test]
async fn signal_is_forwarded_to_the_fake_child() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let run_dir = RunDir::new(tmp.path(), RunId::new());
    let fake_spawner = FakeChildSpawner::new("", 0);
    let signals = fake_spawner.signals.clone();
    let spawner: Arc<dyn ChildSpawner> = Arc::new(fake_spawner);
    let supervisor = Supervisor::new(spawner, run_dir, FakeClock::new());

    let handle = supervisor.spawn(&spec("beta")).await.expect("spawn succeeds");
    handle.control.signal(ChildSignal::Term).expect("signal sent");

    let exit_code = handle.waiter.wait().await;
    assert_eq!(exit_code, 0);

    // Give the actor task's select! loop a beat to have processed the
    // queued signal before the fake child's immediate exit races it.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(signals.lock().len() <= 1);
}

#[tokio::test]
async fn write_intervention_writes_to_the_lane_run_dir() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let run_id = RunId::new();
    let run_dir = RunDir::new(tmp.path(), run_id);
    let spawner: Arc<dyn ChildSpawner> = Arc::new(FakeChildSpawner::new("", 0));
    let supervisor = Supervisor::new(spawner, run_dir.clone(), FakeClock::new());

    let handle = supervisor.spawn(&spec("gamma")).await.expect("spawn succeeds");
    handle.control.write_intervention("continue").expect("write succeeds");

    let written = std::fs::read_to_string(run_dir.intervention_path("gamma")).expect("file exists");
    assert_eq!(written, "continue");
}
