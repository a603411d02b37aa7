// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Dependency Resolver (spec.md §4.4): when one or more lanes block on an
//! environment change, unions their requests, applies the change once on a
//! shared resolution worktree, commits and pushes it, then merges the
//! result back into each blocked lane's own branch.

use lanes_adapters::command_runner::CommandRunner;
use lanes_adapters::source_control::SourceControl;
use lanes_core::DependencyRequestPlan;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One blocked lane's contribution to a resolution pass.
#[derive(Debug, Clone)]
pub struct BlockedLane {
    pub lane_name: String,
    pub pipeline_branch: String,
    pub worktree_dir: PathBuf,
    pub current_task_index: usize,
    pub current_task_name: Option<String>,
    pub request: DependencyRequestPlan,
}

/// Result of a resolution pass against the whole current `blocked` set
/// (spec.md §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// Steps 1-4 (union, resolve worktree, apply, commit+push) succeeded.
    /// Per-lane branch sync (step 5) may still have partially failed —
    /// those lanes are not fatal, listed separately in `sync_failed`
    /// (spec.md §4.4: "a lane whose branch sync fails is not itself
    /// failed; it stays blocked and is retried on the next resolution
    /// pass").
    Resolved { changes: Vec<String>, synced: Vec<String>, sync_failed: Vec<(String, String)> },
    /// Steps 1-4 failed; every currently blocked lane should move to
    /// `failed` (spec.md §4.4 "If resolution fails at step 4...").
    Failed { reason: String },
}

/// Applies the union-and-merge algorithm in spec.md §4.4 against a shared
/// resolution worktree.
pub struct Resolver {
    source_control: Arc<dyn SourceControl>,
    command_runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
}

impl Resolver {
    pub fn new(
        source_control: Arc<dyn SourceControl>,
        command_runner: Arc<dyn CommandRunner>,
        repo_root: PathBuf,
    ) -> Self {
        Self { source_control, command_runner, repo_root }
    }

    /// Runs one resolution pass over every currently blocked lane.
    ///
    /// `resolution_worktree` is the shared scratch worktree (spec.md §6
    /// `<logsDir>/runs/<runId>/resolution-worktree/`); `base_branch` and
    /// `pipeline_branch` name the branches the resolution commit is based
    /// on and pushed to, respectively.
    pub async fn resolve(
        &self,
        blocked: &[BlockedLane],
        resolution_worktree: &Path,
        base_branch: &str,
        pipeline_branch: &str,
    ) -> ResolutionOutcome {
        if blocked.is_empty() {
            return ResolutionOutcome::Resolved { changes: Vec::new(), synced: Vec::new(), sync_failed: Vec::new() };
        }

        // Step 1: union + dedup of changes and commands, in first-seen
        // order so execution order is deterministic.
        let (changes, commands) = self.union_requests(blocked);

        // Step 2: prefer a blocked lane's own worktree if one is already
        // checked out; else stand up the shared resolution worktree on the
        // pipeline branch (spec.md §4.4 step 2).
        let worktree = blocked
            .iter()
            .map(|lane| lane.worktree_dir.as_path())
            .find(|dir| dir.exists())
            .unwrap_or(resolution_worktree);

        let branch_exists = match self.source_control.branch_exists(pipeline_branch).await {
            Ok(exists) => exists,
            Err(e) => return ResolutionOutcome::Failed { reason: format!("branch_exists failed: {e}") },
        };
        let checkout_result = if branch_exists {
            self.source_control.checkout(worktree, pipeline_branch).await
        } else {
            self.source_control.create_worktree(worktree, pipeline_branch, base_branch).await
        };
        if let Err(e) = checkout_result {
            return ResolutionOutcome::Failed { reason: format!("failed to prepare resolution worktree: {e}") };
        }

        // Step 3: run every unioned command in order, abort-all on first
        // failure (spec.md §4.4 step 4).
        for command in &commands {
            if let Err(e) = self.command_runner.run(worktree, command).await {
                return ResolutionOutcome::Failed {
                    reason: format!("resolution command `{command}` failed: {e}"),
                };
            }
        }

        // Step 4: stage, commit, push the pipeline branch.
        let message = format!("resolve dependency: {}", changes.join(", "));
        let pushed_branch =
            match self.source_control.stage_commit_push(worktree, &message, pipeline_branch).await {
                Ok(branch) => branch,
                Err(e) => {
                    return ResolutionOutcome::Failed {
                        reason: format!("failed to commit+push resolution: {e}"),
                    }
                }
            };

        // Step 5: merge the resolved branch back into each blocked lane's
        // own worktree/branch and push. Failures here are non-fatal per
        // lane (spec.md §4.4 step 6).
        let mut synced = Vec::new();
        let mut sync_failed = Vec::new();
        for lane in blocked {
            match self.sync_lane(lane, &pushed_branch).await {
                Ok(()) => synced.push(lane.lane_name.clone()),
                Err(reason) => sync_failed.push((lane.lane_name.clone(), reason)),
            }
        }

        // Step 6: the coordinator is responsible for deleting each lane's
        // dependency-request file once it observes this outcome; the
        // resolver itself only reports which lanes are clear to retry.

        ResolutionOutcome::Resolved { changes, synced, sync_failed }
    }

    async fn sync_lane(&self, lane: &BlockedLane, resolved_branch: &str) -> Result<(), String> {
        let task_branch = task_branch_name(&lane.pipeline_branch, &lane.lane_name, lane.current_task_index, lane.current_task_name.as_deref());
        self.source_control
            .merge_no_edit(&lane.worktree_dir, resolved_branch)
            .await
            .map_err(|e| format!("merge failed: {e}"))?;
        self.source_control
            .push(&lane.worktree_dir, &task_branch)
            .await
            .map_err(|e| format!("push failed: {e}"))
    }

    /// Union + dedup of `changes`/`commands` across every blocked lane,
    /// logging at `warn` when two lanes contributed differing command
    /// lists (spec.md §9 Open Question, resolved in favor of a naive
    /// union that is at least observable in logs — SPEC_FULL.md §4.4).
    fn union_requests(&self, blocked: &[BlockedLane]) -> (Vec<String>, Vec<String>) {
        let mut changes = Vec::new();
        let mut seen_changes = HashSet::new();
        let mut commands = Vec::new();
        let mut seen_commands = HashSet::new();
        let mut first_commands: Option<&[String]> = None;

        for lane in blocked {
            if let Some(first) = first_commands {
                if first != lane.request.commands.as_slice() {
                    tracing::warn!(
                        lane = %lane.lane_name,
                        "dependency resolution: blocked lane contributed a command list \
                         that differs from an earlier blocked lane's; unioning both naively"
                    );
                }
            } else {
                first_commands = Some(&lane.request.commands);
            }
            for change in &lane.request.changes {
                if seen_changes.insert(change.clone()) {
                    changes.push(change.clone());
                }
            }
            for command in &lane.request.commands {
                if seen_commands.insert(command.clone()) {
                    commands.push(command.clone());
                }
            }
        }
        (changes, commands)
    }
}

/// The per-lane task branch name a resolved change is synced onto (spec.md
/// §4.4 step 5): `<pipelineBranch>/<lane>--<NN>-<taskName>`, `NN` the
/// current task's 1-based, zero-padded index.
fn task_branch_name(
    pipeline_branch: &str,
    lane_name: &str,
    current_task_index: usize,
    current_task_name: Option<&str>,
) -> String {
    let ordinal = current_task_index + 1;
    let task_name = current_task_name.unwrap_or("task");
    format!("{pipeline_branch}/{lane_name}--{ordinal:02}-{task_name}")
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
