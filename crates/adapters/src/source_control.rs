// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Source-control capability consumed by the Dependency Resolver
//! (spec.md §6 "Source-control capability (consumed, not implemented by the
//! core)"): create worktree, checkout, branch existence, merge (no-edit),
//! stage+commit+push, and remote-origin detection.
//!
//! The real implementation shells out to `git`; tests drive the engine
//! against [`test_support::FakeSourceControl`] instead so resolver behavior
//! is deterministic without a real repository on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SourceControlError {
    #[error("git {args} failed (exit {code:?}): {stderr}")]
    CommandFailed { args: String, code: Option<i32>, stderr: String },

    #[error("io error running git: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceControlError {
    /// Whether this failure looks like a non-fast-forward push rejection
    /// (spec.md §6: "the core retries push with a fallback branch name
    /// ... once when push is rejected as non-fast-forward").
    pub fn is_non_fast_forward(&self) -> bool {
        match self {
            SourceControlError::CommandFailed { stderr, .. } => {
                let s = stderr.to_lowercase();
                s.contains("non-fast-forward") || s.contains("fetch first") || s.contains("rejected")
            }
            SourceControlError::Io(_) => false,
        }
    }
}

/// Source-control porcelain the core consumes (spec.md §6).
///
/// All operations are scoped to a working tree path except
/// [`SourceControl::branch_exists`] and [`SourceControl::has_remote_origin`],
/// which operate on the shared repository the worktrees were created from.
#[async_trait]
pub trait SourceControl: Send + Sync {
    async fn create_worktree(
        &self,
        worktree: &Path,
        branch: &str,
        base_branch: &str,
    ) -> Result<(), SourceControlError>;

    async fn checkout(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError>;

    async fn branch_exists(&self, branch: &str) -> Result<bool, SourceControlError>;

    async fn merge_no_edit(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError>;

    /// Stage every change in `worktree`, commit with `message`, push
    /// `branch`. Returns the branch name actually pushed, which may be the
    /// fallback name if the first push was rejected as non-fast-forward.
    async fn stage_commit_push(
        &self,
        worktree: &Path,
        message: &str,
        branch: &str,
    ) -> Result<String, SourceControlError>;

    async fn push(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError>;

    async fn has_remote_origin(&self, worktree: &Path) -> Result<bool, SourceControlError>;
}

/// Shells out to the system `git` binary.
pub struct GitSourceControl {
    repo_root: PathBuf,
}

impl GitSourceControl {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }

    async fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, SourceControlError> {
        let output = Command::new("git").current_dir(cwd).args(args).output().await?;
        if !output.status.success() {
            return Err(SourceControlError::CommandFailed {
                args: args.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl SourceControl for GitSourceControl {
    async fn create_worktree(
        &self,
        worktree: &Path,
        branch: &str,
        base_branch: &str,
    ) -> Result<(), SourceControlError> {
        let worktree_str = worktree.to_string_lossy().into_owned();
        let exists = self.branch_exists(branch).await?;
        let args: Vec<&str> = if exists {
            vec!["worktree", "add", &worktree_str, branch]
        } else {
            vec!["worktree", "add", "-b", branch, &worktree_str, base_branch]
        };
        self.run(&self.repo_root, &args).await?;
        Ok(())
    }

    async fn checkout(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError> {
        self.run(worktree, &["checkout", branch]).await?;
        Ok(())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool, SourceControlError> {
        let ref_name = format!("refs/heads/{branch}");
        let output =
            Command::new("git").current_dir(&self.repo_root).args(["show-ref", "--verify", "--quiet", &ref_name]).output().await?;
        Ok(output.status.success())
    }

    async fn merge_no_edit(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError> {
        self.run(worktree, &["merge", "--no-edit", branch]).await?;
        Ok(())
    }

    async fn stage_commit_push(
        &self,
        worktree: &Path,
        message: &str,
        branch: &str,
    ) -> Result<String, SourceControlError> {
        self.run(worktree, &["add", "-A"]).await?;
        self.run(worktree, &["commit", "-m", message]).await?;
        match self.push(worktree, branch).await {
            Ok(()) => Ok(branch.to_string()),
            Err(e) if e.is_non_fast_forward() => {
                let ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis();
                let fallback = format!("{branch}-merged-{ts}");
                self.run(worktree, &["checkout", "-b", &fallback]).await?;
                self.push(worktree, &fallback).await?;
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    async fn push(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError> {
        self.run(worktree, &["push", "origin", branch]).await?;
        Ok(())
    }

    async fn has_remote_origin(&self, worktree: &Path) -> Result<bool, SourceControlError> {
        let output = Command::new("git").current_dir(worktree).args(["remote", "get-url", "origin"]).output().await?;
        Ok(output.status.success())
    }
}

#[cfg(test)]
#[path = "source_control_tests.rs"]
mod tests;
