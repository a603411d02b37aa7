// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Fakes for [`SourceControl`] and [`ChildSpawner`], gated behind
//! `#[cfg(any(test, feature = "test-support"))]` so the engine crate can
//! drive its scheduler/resolver/supervisor tests without a real git
//! checkout or a real agent binary.

use crate::child::{ChildProcessError, ChildSignal, ChildSpawner, LaneChild, SpawnRequest};
use crate::command_runner::{CommandError, CommandRunner};
use crate::source_control::{SourceControl, SourceControlError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Records every call made against it so tests can assert on call order
/// and arguments without inspecting a real `.git` directory.
#[derive(Default)]
pub struct FakeSourceControl {
    inner: Arc<Mutex<FakeSourceControlState>>,
}

#[derive(Default)]
struct FakeSourceControlState {
    branches: HashSet<String>,
    worktrees: Vec<(PathBuf, String)>,
    merges: Vec<(PathBuf, String)>,
    pushes: Vec<String>,
    commits: Vec<String>,
    has_origin: bool,
    fail_commands: HashSet<String>,
    reject_push_once: HashSet<String>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        let state = FakeSourceControlState { has_origin: true, ..Default::default() };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    pub fn with_branch(self, branch: impl Into<String>) -> Self {
        self.inner.lock().branches.insert(branch.into());
        self
    }

    pub fn without_origin(self) -> Self {
        self.inner.lock().has_origin = false;
        self
    }

    /// Makes the named branch's first push fail as non-fast-forward so
    /// tests can exercise the fallback-branch retry (spec.md §6).
    pub fn reject_push_once(self, branch: impl Into<String>) -> Self {
        self.inner.lock().reject_push_once.insert(branch.into());
        self
    }

    pub fn fail_command(self, verb: impl Into<String>) -> Self {
        self.inner.lock().fail_commands.insert(verb.into());
        self
    }

    pub fn commits(&self) -> Vec<String> {
        self.inner.lock().commits.clone()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.inner.lock().pushes.clone()
    }

    pub fn merges(&self) -> Vec<(PathBuf, String)> {
        self.inner.lock().merges.clone()
    }

    /// Every worktree created via `create_worktree`, in call order, as
    /// `(worktree_dir, branch)`.
    pub fn worktrees(&self) -> Vec<(PathBuf, String)> {
        self.inner.lock().worktrees.clone()
    }

    fn fail_if(&self, verb: &str) -> Result<(), SourceControlError> {
        if self.inner.lock().fail_commands.contains(verb) {
            return Err(SourceControlError::CommandFailed {
                args: verb.to_string(),
                code: Some(1),
                stderr: format!("fake failure injected for {verb}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn create_worktree(
        &self,
        worktree: &Path,
        branch: &str,
        _base_branch: &str,
    ) -> Result<(), SourceControlError> {
        self.fail_if("worktree")?;
        let mut state = self.inner.lock();
        state.branches.insert(branch.to_string());
        state.worktrees.push((worktree.to_path_buf(), branch.to_string()));
        Ok(())
    }

    async fn checkout(&self, _worktree: &Path, _branch: &str) -> Result<(), SourceControlError> {
        self.fail_if("checkout")
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool, SourceControlError> {
        self.fail_if("branch_exists")?;
        Ok(self.inner.lock().branches.contains(branch))
    }

    async fn merge_no_edit(&self, worktree: &Path, branch: &str) -> Result<(), SourceControlError> {
        self.fail_if("merge")?;
        self.inner.lock().merges.push((worktree.to_path_buf(), branch.to_string()));
        Ok(())
    }

    async fn stage_commit_push(
        &self,
        worktree: &Path,
        message: &str,
        branch: &str,
    ) -> Result<String, SourceControlError> {
        self.fail_if("commit")?;
        self.inner.lock().commits.push(message.to_string());
        match self.push(worktree, branch).await {
            Ok(()) => Ok(branch.to_string()),
            Err(e) if e.is_non_fast_forward() => {
                let fallback = format!("{branch}-merged-0");
                self.push(worktree, &fallback).await?;
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    async fn push(&self, _worktree: &Path, branch: &str) -> Result<(), SourceControlError> {
        self.fail_if("push")?;
        let mut state = self.inner.lock();
        if state.reject_push_once.remove(branch) {
            return Err(SourceControlError::CommandFailed {
                args: "push".to_string(),
                code: Some(1),
                stderr: "! [rejected] non-fast-forward".to_string(),
            });
        }
        state.pushes.push(branch.to_string());
        Ok(())
    }

    async fn has_remote_origin(&self, _worktree: &Path) -> Result<bool, SourceControlError> {
        Ok(self.inner.lock().has_origin)
    }
}

/// A scripted lane child: emits fixed stdout/stderr content, then reports a
/// fixed exit code. Signals sent to it are recorded rather than acted on.
pub struct FakeChildSpawner {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub signals: Arc<Mutex<Vec<ChildSignal>>>,
}

impl FakeChildSpawner {
    pub fn new(stdout: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code,
            signals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn signals_received(&self) -> Vec<ChildSignal> {
        self.signals.lock().clone()
    }
}

#[async_trait]
impl ChildSpawner for FakeChildSpawner {
    async fn spawn(&self, _request: &SpawnRequest) -> Result<Box<dyn LaneChild>, ChildProcessError> {
        Ok(Box::new(FakeLaneChild {
            stdout: Some(self.stdout.clone()),
            stderr: Some(self.stderr.clone()),
            exit_code: self.exit_code,
            signals: self.signals.clone(),
        }))
    }
}

/// Feeds `content` through an in-memory pipe so callers read it through a
/// genuine `AsyncRead` rather than a synchronous stand-in, matching how the
/// real child's piped stdout/stderr behaves.
fn spawn_fake_reader(content: String) -> Box<dyn AsyncRead + Send + Unpin> {
    let (mut writer, reader) = tokio::io::duplex(8192);
    tokio::spawn(async move {
        use tokio::io::AsyncWriteExt;
        let _ = writer.write_all(content.as_bytes()).await;
        let _ = writer.shutdown().await;
    });
    Box::new(reader)
}

struct FakeLaneChild {
    stdout: Option<String>,
    stderr: Option<String>,
    exit_code: i32,
    signals: Arc<Mutex<Vec<ChildSignal>>>,
}

#[async_trait]
impl LaneChild for FakeLaneChild {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.stdout.take().map(|s| spawn_fake_reader(s))
    }

    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.stderr.take().map(|s| spawn_fake_reader(s))
    }

    async fn wait(&mut self) -> i32 {
        self.exit_code
    }

    fn signal(&self, kind: ChildSignal) -> Result<(), ChildProcessError> {
        self.signals.lock().push(kind);
        Ok(())
    }
}

/// Records every command it is asked to run; a configured subset fail.
#[derive(Default)]
pub struct FakeCommandRunner {
    inner: Arc<Mutex<FakeCommandRunnerState>>,
}

#[derive(Default)]
struct FakeCommandRunnerState {
    ran: Vec<String>,
    fail: HashSet<String>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(self, command: impl Into<String>) -> Self {
        self.inner.lock().fail.insert(command.into());
        self
    }

    pub fn ran(&self) -> Vec<String> {
        self.inner.lock().ran.clone()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, _cwd: &Path, command: &str) -> Result<(), CommandError> {
        let mut state = self.inner.lock();
        state.ran.push(command.to_string());
        if state.fail.contains(command) {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: Some(1),
                stderr: format!("fake failure injected for `{command}`"),
            });
        }
        Ok(())
    }
}
