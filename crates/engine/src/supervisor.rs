// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Lane Supervisor (spec.md §4.1): owns one lane's child process for the
//! lifetime of one process epoch — spawning it, streaming its stdout/stderr
//! through the [`crate::log_parser::LogParser`], and exposing a narrow
//! `signal`/`wait` surface to the coordinator.
//!
//! `LaneChild::wait` takes `&mut self` while `signal` takes `&self`, so a
//! stall-triggered kill needs to reach the child concurrently with an
//! in-flight wait. Rather than share the child behind a lock that `wait`
//! would hold for the child's entire lifetime, each spawned child is handed
//! to a dedicated actor task that owns it exclusively; the coordinator talks
//! to that task only through an unbounded signal channel and a oneshot exit
//! channel.

use crate::log_parser::{LogParser, Stream};
use lanes_adapters::child::{ChildProcessError, ChildSignal, ChildSpawner, SpawnRequest};
use lanes_core::{Clock, ParsedMessage};
use lanes_storage::RunDir;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Spawn(#[from] ChildProcessError),

    #[error("failed to create log parser for lane `{lane}`: {source}")]
    LogParser { lane: String, #[source] source: std::io::Error },

    #[error("failed to write intervention file for lane `{lane}`: {source}")]
    Intervention { lane: String, #[source] source: std::io::Error },

    #[error("lane `{0}` is not tracked by this supervisor")]
    UnknownLane(String),
}

/// Everything [`Supervisor::spawn`] needs beyond the lane name itself.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub lane_name: String,
    pub request: SpawnRequest,
}

const CHUNK_SIZE: usize = 8192;

/// The cloneable, non-exclusive half of a running lane: sending signals and
/// writing the intervention side channel never needs to fight the drain
/// loop for access, so it lives separately from [`LaneWaiter`].
#[derive(Clone)]
pub struct LaneControl {
    run_dir: RunDir,
    lane_name: String,
    signal_tx: mpsc::UnboundedSender<ChildSignal>,
}

impl LaneControl {
    /// Requests the child be terminated or killed. Non-blocking: the
    /// signal is delivered to the actor task's mailbox, not the OS call
    /// itself (spec.md §4.1 `signal` is fire-and-forget from the caller's
    /// perspective).
    pub fn signal(&self, kind: ChildSignal) -> Result<(), SupervisorError> {
        self.signal_tx
            .send(kind)
            .map_err(|_| SupervisorError::UnknownLane(self.lane_name.clone()))
    }

    /// Writes `content` to the lane's `intervention.txt` side channel
    /// (spec.md §4.1, §9: the only way the coordinator talks to a running
    /// child is this file, never stdin).
    pub fn write_intervention(&self, content: &str) -> Result<(), SupervisorError> {
        let path = self.run_dir.intervention_path(&self.lane_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SupervisorError::Intervention {
                lane: self.lane_name.clone(),
                source,
            })?;
        }
        std::fs::write(&path, content).map_err(|source| SupervisorError::Intervention {
            lane: self.lane_name.clone(),
            source,
        })
    }
}

/// The exclusive, consuming half of a running lane: drains parsed messages
/// until the actor task finishes, then resolves to the child's exit code.
/// Owned by whichever task drains it — typically a dedicated tokio task the
/// coordinator spawns per lane, never the coordinator's own select loop.
pub struct LaneWaiter {
    exit_rx: oneshot::Receiver<i32>,
    messages_rx: mpsc::UnboundedReceiver<ParsedMessage>,
}

impl LaneWaiter {
    /// Next parsed message emitted from the child's output, or `None` once
    /// the actor task has finished flushing and exited.
    pub async fn recv_message(&mut self) -> Option<ParsedMessage> {
        self.messages_rx.recv().await
    }

    /// Resolves with the child's exit code once the actor task observes
    /// `wait()` complete. Consumes the waiter; only call once per lane
    /// epoch, after message draining has finished.
    pub async fn wait(mut self) -> i32 {
        (&mut self.exit_rx).await.unwrap_or(1)
    }
}

/// A spawned lane's two access surfaces: [`LaneControl`] for signals and
/// interventions, [`LaneWaiter`] for draining output and observing exit.
pub struct LaneHandle {
    pub control: LaneControl,
    pub waiter: LaneWaiter,
}

/// Spawns and supervises lane child processes (spec.md §4.1).
pub struct Supervisor<C: Clock> {
    spawner: Arc<dyn ChildSpawner>,
    run_dir: RunDir,
    clock: C,
}

impl<C: Clock + 'static> Supervisor<C> {
    pub fn new(spawner: Arc<dyn ChildSpawner>, run_dir: RunDir, clock: C) -> Self {
        Self { spawner, run_dir, clock }
    }

    /// Spawns the lane's child and starts its actor task. Returns a
    /// [`LaneHandle`] the coordinator drives for the remainder of the
    /// process epoch.
    pub async fn spawn(&self, spec: &LaunchSpec) -> Result<LaneHandle, SupervisorError> {
        let mut child = self.spawner.spawn(&spec.request).await?;
        let stdout = child.take_stdout();
        let stderr = child.take_stderr();

        let mut parser = LogParser::new(&self.run_dir, &spec.lane_name, self.clock.clone())
            .map_err(|source| SupervisorError::LogParser { lane: spec.lane_name.clone(), source })?;

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<ChildSignal>();
        let (exit_tx, exit_rx) = oneshot::channel();
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();

        let lane_name = spec.lane_name.clone();
        tokio::spawn(async move {
            let mut stdout_reader = stdout;
            let mut stderr_reader = stderr;
            let mut stdout_buf = [0u8; CHUNK_SIZE];
            let mut stderr_buf = [0u8; CHUNK_SIZE];
            let mut stdout_done = stdout_reader.is_none();
            let mut stderr_done = stderr_reader.is_none();

            let exit_code = loop {
                if stdout_done && stderr_done {
                    break child.wait().await;
                }
                tokio::select! {
                    biased;

                    n = async {
                        match stdout_reader.as_mut() {
                            Some(r) => r.read(&mut stdout_buf).await,
                            None => std::future::pending::<std::io::Result<usize>>().await,
                        }
                    }, if !stdout_done => {
                        match n {
                            Ok(0) | Err(_) => stdout_done = true,
                            Ok(n) => {
                                for msg in parser.process_chunk(Stream::Stdout, &stdout_buf[..n]) {
                                    let _ = messages_tx.send(msg);
                                }
                            }
                        }
                    }

                    n = async {
                        match stderr_reader.as_mut() {
                            Some(r) => r.read(&mut stderr_buf).await,
                            None => std::future::pending::<std::io::Result<usize>>().await,
                        }
                    }, if !stderr_done => {
                        match n {
                            Ok(0) | Err(_) => stderr_done = true,
                            Ok(n) => {
                                for msg in parser.process_chunk(Stream::Stderr, &stderr_buf[..n]) {
                                    let _ = messages_tx.send(msg);
                                }
                            }
                        }
                    }

                    Some(kind) = signal_rx.recv() => {
                        if let Err(e) = child.signal(kind) {
                            tracing::warn!(lane = %lane_name, error = %e, "failed to signal child");
                        }
                    }
                }
            };

            for msg in parser.finish() {
                let _ = messages_tx.send(msg);
            }
            let _ = exit_tx.send(exit_code);
        });

        Ok(LaneHandle {
            control: LaneControl {
                run_dir: self.run_dir.clone(),
                lane_name: spec.lane_name.clone(),
                signal_tx,
            },
            waiter: LaneWaiter { exit_rx, messages_rx },
        })
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
