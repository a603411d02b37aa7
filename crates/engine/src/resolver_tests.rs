// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

use super::*;
use lanes_adapters::test_support::{FakeCommandRunner, FakeSourceControl};
use lanes_core::DependencyRequestPlan;
use std::path::PathBuf;

fn blocked_lane(name: &str, changes: &[&str], commands: &[&str]) -> BlockedLane {
    BlockedLane {
        lane_name: name.to_string(),
        pipeline_branch: "pipeline".to_string(),
        worktree_dir: PathBuf::from(format!("/tmp/{name}")),
        current_task_index: 1,
        current_task_name: Some("build".to_string()),
        request: DependencyRequestPlan {
            reason: "needs a new dependency".to_string(),
            changes: changes.iter().map(|s| s.to_string()).collect(),
            commands: commands.iter().map(|s| s.to_string()).collect(),
        },
    }
}

fn resolver(source_control: Arc<dyn SourceControl>, command_runner: Arc<dyn CommandRunner>) -> Resolver {
    Resolver::new(source_control, command_runner, PathBuf::from("/tmp/repo"))
}

#[tokio::test]
async fn empty_blocked_set_resolves_trivially() {
    let sc: Arc<dyn SourceControl> = Arc::new(FakeSourceControl::new());
    let cr: Arc<dyn CommandRunner> = Arc::new(FakeCommandRunner::new());
    let outcome = resolver(sc, cr)
        .resolve(&[], &PathBuf::from("/tmp/wt"), "main", "pipeline")
        .await;
    assert_eq!(
        outcome,
        ResolutionOutcome::Resolved { changes: Vec::new(), synced: Vec::new(), sync_failed: Vec::new() }
    );
}

#[tokio::test]
async fn unions_changes_and_commands_across_lanes_and_syncs_each_lane() {
    let sc = Arc::new(FakeSourceControl::new());
    let cr = Arc::new(FakeCommandRunner::new());
    let blocked = vec![
        blocked_lane("alpha", &["add lodash"], &["npm i lodash"]),
        blocked_lane("beta", &["add lodash", "add chalk"], &["npm i lodash", "npm i chalk"]),
    ];

    let sc_dyn: Arc<dyn SourceControl> = sc.clone();
    let cr_dyn: Arc<dyn CommandRunner> = cr.clone();
    let outcome = resolver(sc_dyn, cr_dyn)
        .resolve(&blocked, &PathBuf::from("/tmp/wt"), "main", "pipeline")
        .await;

    match outcome {
        ResolutionOutcome::Resolved { changes, synced, sync_failed } => {
            assert_eq!(changes, vec!["add lodash".to_string(), "add chalk".to_string()]);
            assert_eq!(synced, vec!["alpha".to_string(), "beta".to_string()]);
            assert!(sync_failed.is_empty());
        }
        other => panic!("expected Resolved, got {other:?}"),
    }

    assert_eq!(cr.ran(), vec!["npm i lodash".to_string(), "npm i chalk".to_string()]);
    assert_eq!(sc.commits().len(), 1);
    let merges = sc.merges();
    assert_eq!(merges.len(), 2);
}

#[tokio::test]
async fn command_failure_fails_the_whole_pass() {
    let sc: Arc<dyn SourceControl> = Arc::new(FakeSourceControl::new());
    let cr: Arc<dyn CommandRunner> = Arc::new(FakeCommandRunner::new().fail_on("npm i lodash"));
    let blocked = vec![blocked_lane("alpha", &["add lodash"], &["npm i lodash"])];

    let outcome = resolver(sc, cr).resolve(&blocked, &PathBuf::from("/tmp/wt"), "main", "pipeline").await;

    assert!(matches!(outcome, ResolutionOutcome::Failed { .. }));
}

#[tokio::test]
async fn lane_sync_failure_is_reported_but_not_fatal_to_the_pass() {
    let sc: Arc<dyn SourceControl> = Arc::new(FakeSourceControl::new().fail_command("merge"));
    let cr: Arc<dyn CommandRunner> = Arc::new(FakeCommandRunner::new());
    let blocked = vec![blocked_lane("alpha", &["add lodash"], &["npm i lodash"])];

    let outcome = resolver(sc, cr).resolve(&blocked, &PathBuf::from("/tmp/wt"), "main", "pipeline").await;

    match outcome {
        ResolutionOutcome::Resolved { synced, sync_failed, .. } => {
            assert!(synced.is_empty());
            assert_eq!(sync_failed.len(), 1);
            assert_eq!(sync_failed[0].0, "alpha");
        }
        other => panic!("expected Resolved with sync_failed, got {other:?}"),
    }
}

#[tokio::test]
async fn prefers_an_existing_blocked_lane_worktree_over_the_resolution_worktree() {
    let sc = Arc::new(FakeSourceControl::new());
    let cr: Arc<dyn CommandRunner> = Arc::new(FakeCommandRunner::new());
    let existing = tempfile::tempdir().expect("tempdir");
    let mut blocked = blocked_lane("alpha", &["add lodash"], &["npm i lodash"]);
    blocked.worktree_dir = existing.path().to_path_buf();

    let sc_dyn: Arc<dyn SourceControl> = sc.clone();
    let outcome = resolver(sc_dyn, cr)
        .resolve(&[blocked], &PathBuf::from("/tmp/unused-resolution-worktree"), "main", "pipeline")
        .await;

    assert!(matches!(outcome, ResolutionOutcome::Resolved { .. }));
    let worktrees = sc.worktrees();
    assert_eq!(worktrees.len(), 1);
    assert_eq!(worktrees[0].0, existing.path());
}

#[tokio::test]
async fn create_worktree_used_when_pipeline_branch_is_new() {
    let sc = Arc::new(FakeSourceControl::new());
    let cr: Arc<dyn CommandRunner> = Arc::new(FakeCommandRunner::new());
    let blocked = vec![blocked_lane("alpha", &["add lodash"], &["npm i lodash"])];

    let sc_dyn: Arc<dyn SourceControl> = sc.clone();
    let outcome =
        resolver(sc_dyn, cr).resolve(&blocked, &PathBuf::from("/tmp/wt"), "main", "pipeline").await;

    assert!(matches!(outcome, ResolutionOutcome::Resolved { .. }));
    assert!(sc.branch_exists("pipeline").await.expect("no error"));
}
