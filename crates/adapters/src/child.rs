// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Child-process capability consumed by the Lane Supervisor (spec.md §4.1,
//! §6): spawn the lane's executor, stream its stdout/stderr, signal it
//! (term/kill), and observe its exit code. Stdin is always closed — the
//! coordinator talks to a running child exclusively through the
//! `intervention.txt` side channel (spec.md §9).

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ChildProcessError {
    #[error("failed to spawn child: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to signal child: {0}")]
    Signal(#[source] std::io::Error),

    #[error("child stdout/stderr already taken")]
    PipesTaken,
}

/// The exit-code contract observed from the executor (spec.md §4.1, §6).
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_BLOCKED: i32 = 2;

/// `signal(handle, kind)` kinds (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSignal {
    Term,
    Kill,
}

/// The argument vector and environment for one lane invocation (spec.md §6
/// "Child process contract").
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub executable: String,
    pub tasks_file: PathBuf,
    pub run_dir: PathBuf,
    pub executor: String,
    pub start_index: usize,
    pub pipeline_branch: Option<String>,
    pub worktree_dir: Option<PathBuf>,
    pub no_git: bool,
    pub env: HashMap<String, String>,
}

impl SpawnRequest {
    /// Builds the argument vector in the order spec.md §6 names: tasks
    /// file, `--run-dir`, `--executor`, `--start-index`, then the
    /// conditional flags.
    pub fn argv(&self) -> Vec<String> {
        let mut args = vec![
            self.tasks_file.to_string_lossy().into_owned(),
            "--run-dir".to_string(),
            self.run_dir.to_string_lossy().into_owned(),
            "--executor".to_string(),
            self.executor.clone(),
            "--start-index".to_string(),
            self.start_index.to_string(),
        ];
        if let Some(branch) = &self.pipeline_branch {
            args.push("--pipeline-branch".to_string());
            args.push(branch.clone());
        }
        if let Some(dir) = &self.worktree_dir {
            args.push("--worktree-dir".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }
        if self.no_git {
            args.push("--no-git".to_string());
        }
        args
    }

    /// The coordinator's own environment, augmented per spec.md §6
    /// ("forwards its environment to each child, augmenting with
    /// `PYTHONUNBUFFERED=1`"), layered under any lane-specific overrides.
    pub fn full_env(&self) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
        env.extend(self.env.clone());
        env
    }
}

/// A running lane child process: its two output streams plus lifecycle
/// control. Streams are taken once; a second call to either `take_*`
/// returns `None`.
#[async_trait]
pub trait LaneChild: Send {
    fn id(&self) -> Option<u32>;

    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    /// Resolves when the child exits; never rejects (spec.md §4.1 `wait`).
    /// A child killed by signal without a reportable exit status is mapped
    /// to exit code 137 (128 + SIGKILL), matching shell convention.
    async fn wait(&mut self) -> i32;

    fn signal(&self, kind: ChildSignal) -> Result<(), ChildProcessError>;
}

/// Spawns executor child processes over `tokio::process::Command`.
#[async_trait]
pub trait ChildSpawner: Send + Sync {
    async fn spawn(&self, request: &SpawnRequest) -> Result<Box<dyn LaneChild>, ChildProcessError>;
}

pub struct TokioChildSpawner;

#[async_trait]
impl ChildSpawner for TokioChildSpawner {
    async fn spawn(&self, request: &SpawnRequest) -> Result<Box<dyn LaneChild>, ChildProcessError> {
        let mut cmd = Command::new(&request.executable);
        cmd.args(request.argv());
        cmd.env_clear();
        cmd.envs(request.full_env());
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        if let Some(dir) = &request.worktree_dir {
            cmd.current_dir(dir);
        }
        let child = cmd.spawn().map_err(ChildProcessError::Spawn)?;
        Ok(Box::new(TokioLaneChild { child }))
    }
}

struct TokioLaneChild {
    child: tokio::process::Child,
}

#[async_trait]
impl LaneChild for TokioLaneChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.child.stdout.take().map(|s| Box::new(s) as Box<dyn AsyncRead + Send + Unpin>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        self.child.stderr.take().map(|s| Box::new(s) as Box<dyn AsyncRead + Send + Unpin>)
    }

    async fn wait(&mut self) -> i32 {
        match self.child.wait().await {
            Ok(status) => status.code().unwrap_or(137),
            Err(e) => {
                tracing::warn!(error = %e, "failed to wait on child");
                1
            }
        }
    }

    fn signal(&self, kind: ChildSignal) -> Result<(), ChildProcessError> {
        let Some(pid) = self.child.id() else {
            // Already reaped; nothing to signal.
            return Ok(());
        };
        let signal = match kind {
            ChildSignal::Term => nix::sys::signal::Signal::SIGTERM,
            ChildSignal::Kill => nix::sys::signal::Signal::SIGKILL,
        };
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), signal)
            .map_err(|e| ChildProcessError::Signal(std::io::Error::from(e)))
    }
}

#[cfg(test)]
#[path = "child_tests.rs"]
mod tests;
