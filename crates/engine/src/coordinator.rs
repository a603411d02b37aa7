// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! The coordinator loop (spec.md §5): ties the Scheduler, Stall Controller,
//! Supervisor, Resolver, and event bus into the single run loop. Mirrors
//! the teacher's daemon main loop shape — a `tokio::select!` over a tick
//! timer, lane completions, and external shutdown — simplified to a single
//! in-process loop since there is no socket listener in this design.

use crate::events::EventBus;
use crate::resolver::{BlockedLane, ResolutionOutcome, Resolver};
use crate::scheduler::{ExitOutcome, Scheduler};
use crate::stall::{StallAction, StallController, StallThresholds};
use crate::supervisor::{LaneControl, LaunchSpec, Supervisor};
use lanes_adapters::child::{ChildSignal, ChildSpawner, SpawnRequest};
use lanes_adapters::command_runner::CommandRunner;
use lanes_adapters::source_control::SourceControl;
use lanes_core::{Clock, DependencyRequestPlan, Event, Lane, LaneRunState, LaneSet, LaneStatus, RunId};
use lanes_storage::{LaneStateStore, RunDir};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything [`Coordinator::new`] needs beyond the `LaneSet` itself
/// (spec.md §6 ambient configuration, expanded by SPEC_FULL.md §6).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub concurrency: usize,
    pub auto_resolve_enabled: bool,
    pub tick_interval: Duration,
    pub stall_thresholds: StallThresholds,
    pub logs_dir: PathBuf,
    pub repo_root: PathBuf,
    pub executable: String,
    pub executor: String,
    pub no_git: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            auto_resolve_enabled: true,
            tick_interval: Duration::from_secs(10),
            stall_thresholds: StallThresholds::default(),
            logs_dir: PathBuf::from("logs"),
            repo_root: PathBuf::from("."),
            executable: "lane-agent".to_string(),
            executor: "claude".to_string(),
            no_git: false,
        }
    }
}

/// How long the coordinator waits after `signal(term)` before escalating to
/// `signal(kill)` on shutdown (spec.md §5 "wait briefly").
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// One message from a lane's draining task: either a parsed-output arrival
/// (activity) or the child's terminal exit code.
enum LaneEvent {
    Activity,
    Exited(i32),
}

struct RunningLane {
    control: LaneControl,
    restarting: bool,
}

/// Drives one orchestrator run end to end (spec.md §5).
pub struct Coordinator<C: Clock + 'static> {
    scheduler: Scheduler,
    stall: StallController<C>,
    supervisor: Supervisor<C>,
    resolver: Resolver,
    events: EventBus,
    run_dir: RunDir,
    run_id: RunId,
    config: CoordinatorConfig,
    clock: C,
    running: HashMap<String, RunningLane>,
}

impl<C: Clock + 'static> Coordinator<C> {
    pub fn new(
        lane_set: LaneSet,
        config: CoordinatorConfig,
        spawner: Arc<dyn ChildSpawner>,
        source_control: Arc<dyn SourceControl>,
        command_runner: Arc<dyn CommandRunner>,
        events: EventBus,
        clock: C,
    ) -> Self {
        let run_id = RunId::new();
        let run_dir = RunDir::new(&config.logs_dir, run_id);
        let scheduler = Scheduler::new(lane_set, config.concurrency, config.auto_resolve_enabled);
        let stall = StallController::new(clock.clone(), config.stall_thresholds);
        let supervisor = Supervisor::new(spawner, run_dir.clone(), clock.clone());
        let resolver = Resolver::new(source_control, command_runner, config.repo_root.clone());
        Self {
            scheduler,
            stall,
            supervisor,
            resolver,
            events,
            run_dir,
            run_id,
            config,
            clock,
            running: HashMap::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Runs the orchestration loop to completion, returning the process
    /// exit code spec.md §7 defines. `shutdown` is cancelled by the caller
    /// (e.g. on SIGINT/SIGTERM) to request a graceful stop; in-flight lanes
    /// are left running for the caller to deal with.
    pub async fn run(&mut self, shutdown: CancellationToken) -> i32 {
        self.publish(Event::RunStarted {
            run_id: self.run_id,
            lane_count: self.scheduler.lane_set().len(),
            concurrency: self.config.concurrency,
            timestamp_epoch_ms: self.clock.epoch_ms(),
        });

        let (lane_events_tx, mut lane_events_rx) = mpsc::unbounded_channel::<(String, LaneEvent)>();
        let mut tick = tokio::time::interval(self.config.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(run_id = %self.run_id, "shutdown requested; terminating running lanes");
                    self.terminate_running_lanes().await;
                    self.publish(Event::Shutdown {
                        run_id: self.run_id,
                        timestamp_epoch_ms: self.clock.epoch_ms(),
                    });
                    return 1;
                }
                _ = tick.tick() => {
                    if self.on_tick(&lane_events_tx).await {
                        break;
                    }
                }
                Some((lane, event)) = lane_events_rx.recv() => {
                    self.on_lane_event(lane, event).await;
                }
            }
        }

        self.publish(Event::Shutdown { run_id: self.run_id, timestamp_epoch_ms: self.clock.epoch_ms() });
        self.scheduler.exit_code()
    }

    /// Issues `signal(term)` to every still-running lane, waits briefly,
    /// then `signal(kill)` (spec.md §5, §7 "User interrupt"). In-flight
    /// lanes are left for their drain tasks to report exit; the caller
    /// returns `1` regardless of how they finish.
    async fn terminate_running_lanes(&mut self) {
        for (lane, running) in &self.running {
            if let Err(e) = running.control.signal(ChildSignal::Term) {
                tracing::warn!(lane, error = %e, "failed to signal term on shutdown");
            }
        }
        if !self.running.is_empty() {
            tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;
        }
        for (lane, running) in &self.running {
            if let Err(e) = running.control.signal(ChildSignal::Kill) {
                tracing::warn!(lane, error = %e, "failed to signal kill on shutdown");
            }
        }
    }

    async fn on_lane_event(&mut self, lane: String, event: LaneEvent) {
        match event {
            LaneEvent::Activity => {
                self.stall.record_activity(&lane);
            }
            LaneEvent::Exited(exit_code) => {
                self.handle_exit(&lane, exit_code).await;
            }
        }
    }

    /// One scheduling tick (spec.md §4.2, §4.3): poll every running lane's
    /// stall state, run the Scheduler's tick, spawn newly-ready lanes.
    /// Returns `true` once the run is finished and the loop should exit.
    async fn on_tick(&mut self, lane_events_tx: &mpsc::UnboundedSender<(String, LaneEvent)>) -> bool {
        let running_lanes: Vec<String> = self.running.keys().cloned().collect();
        for lane in running_lanes {
            self.refresh_running_state(&lane);
            self.poll_stall(&lane);
        }

        let outcome = self.scheduler.tick();
        for (lane, reason) in &outcome.newly_failed {
            self.publish(Event::LaneFailed {
                run_id: self.run_id,
                lane_name: lane.clone(),
                reason: reason.clone(),
                timestamp_epoch_ms: self.clock.epoch_ms(),
            });
        }
        if outcome.deadlocked {
            self.publish(Event::Deadlock {
                run_id: self.run_id,
                lane_names: outcome.newly_failed.iter().map(|(l, _)| l.clone()).collect(),
                timestamp_epoch_ms: self.clock.epoch_ms(),
            });
        }

        for lane in &outcome.to_start {
            self.start_lane(lane, lane_events_tx.clone()).await;
        }

        if outcome.done {
            if !self.scheduler.blocked().is_empty() && self.config.auto_resolve_enabled {
                self.run_resolution().await;
                return false;
            }
            return true;
        }
        false
    }

    /// Re-reads a still-running lane's `state.json` and feeds it to the
    /// Scheduler, so dependency edges on its in-progress task list (spec.md
    /// §4.2, §8 Scenario 3) can become ready before the lane exits. The
    /// child owns this file and may rewrite it at any point during its run
    /// (spec.md §3 "Ownership"); a missing or unparsable file just means
    /// nothing new has been written yet and is not an error.
    fn refresh_running_state(&mut self, lane: &str) {
        if let Ok(state) = LaneStateStore::load(&self.run_dir.state_path(lane)) {
            self.scheduler.sync_state(lane, state);
        }
    }

    fn poll_stall(&mut self, lane: &str) {
        match self.stall.poll(lane) {
            StallAction::None => {}
            StallAction::Nudge => {
                if let Some(running) = self.running.get(lane) {
                    if let Err(e) = running.control.write_intervention("continue") {
                        tracing::warn!(lane, error = %e, "failed to write stall nudge");
                    }
                }
                self.publish(Event::LaneNudged {
                    run_id: self.run_id,
                    lane_name: lane.to_string(),
                    timestamp_epoch_ms: self.clock.epoch_ms(),
                });
            }
            StallAction::Restart => {
                if let Some(running) = self.running.get_mut(lane) {
                    running.restarting = true;
                    if let Err(e) = running.control.signal(ChildSignal::Kill) {
                        tracing::warn!(lane, error = %e, "failed to signal restart");
                    }
                }
                self.publish(Event::LaneRestarted {
                    run_id: self.run_id,
                    lane_name: lane.to_string(),
                    restart_count: self.stall.restart_count(lane),
                    timestamp_epoch_ms: self.clock.epoch_ms(),
                });
            }
            StallAction::Abort => {
                if let Some(running) = self.running.get(lane) {
                    if let Err(e) = running.control.signal(ChildSignal::Kill) {
                        tracing::warn!(lane, error = %e, "failed to signal abort");
                    }
                }
                self.publish(Event::LaneAborted {
                    run_id: self.run_id,
                    lane_name: lane.to_string(),
                    timestamp_epoch_ms: self.clock.epoch_ms(),
                });
            }
        }
    }

    async fn start_lane(&mut self, lane_name: &str, lane_events_tx: mpsc::UnboundedSender<(String, LaneEvent)>) {
        let Some(lane) = self.scheduler.lane_set().get(lane_name).cloned() else {
            return;
        };
        let start_index = self.scheduler.start_index(lane_name);

        let mut state = LaneStateStore::load_or_pending(&self.run_dir.state_path(lane_name), &lane)
            .unwrap_or_else(|_| LaneRunState::pending(&lane));
        state.status = LaneStatus::Running;
        state.current_task_index = start_index;
        if state.start_time_epoch_ms.is_none() {
            state.start_time_epoch_ms = Some(self.clock.epoch_ms());
        }
        let _ = LaneStateStore::save(&self.run_dir.state_path(lane_name), &state);
        self.scheduler.sync_state(lane_name, state);

        let request = match self.build_spawn_request(&lane, start_index) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(lane = lane_name, error = %e, "failed to prepare spawn request");
                self.scheduler.mark_spawn_failed(lane_name);
                return;
            }
        };

        let spec = LaunchSpec { lane_name: lane_name.to_string(), request };
        match self.supervisor.spawn(&spec).await {
            Ok(handle) => {
                self.scheduler.mark_started(lane_name);
                self.stall.track(lane_name);
                spawn_drain_task(lane_name.to_string(), handle.waiter, lane_events_tx);
                self.running.insert(
                    lane_name.to_string(),
                    RunningLane { control: handle.control, restarting: false },
                );
                self.publish(Event::LaneStarted {
                    run_id: self.run_id,
                    lane_name: lane_name.to_string(),
                    start_index,
                    timestamp_epoch_ms: self.clock.epoch_ms(),
                });
            }
            Err(e) => {
                tracing::error!(lane = lane_name, error = %e, "failed to spawn lane child");
                self.scheduler.mark_spawn_failed(lane_name);
            }
        }
    }

    /// Writes the lane's task list to `<laneDir>/tasks.json` and builds the
    /// argument vector contract spec.md §6 names.
    fn build_spawn_request(&self, lane: &Lane, start_index: usize) -> std::io::Result<SpawnRequest> {
        let lane_dir = self.run_dir.lane_dir(&lane.name);
        std::fs::create_dir_all(&lane_dir)?;
        let tasks_file = lane_dir.join("tasks.json");
        std::fs::write(&tasks_file, serde_json::to_vec_pretty(&lane.tasks)?)?;

        Ok(SpawnRequest {
            executable: self.config.executable.clone(),
            tasks_file,
            run_dir: lane_dir,
            executor: self.config.executor.clone(),
            start_index,
            pipeline_branch: Some(lane.pipeline_branch.clone()),
            worktree_dir: Some(lane.worktree_root.clone()),
            no_git: self.config.no_git,
            env: HashMap::new(),
        })
    }

    async fn handle_exit(&mut self, lane: &str, exit_code: i32) {
        let Some(running) = self.running.remove(lane) else { return };
        let restarting = running.restarting;
        let current_task_index = self.scheduler.start_index(lane);

        let request = self.read_dependency_request(lane);
        let outcome =
            self.scheduler.observe_exit(lane, exit_code, request, restarting, current_task_index);

        // Only stop tracking a lane's stall state on a terminal outcome.
        // `RestartPending` means the lane is about to be re-spawned by
        // `start_lane`, which must see this lane's prior `restart_count`
        // still present so the restart bound (spec.md §4.3) accumulates
        // across restarts instead of resetting on every cycle.
        if !matches!(outcome, ExitOutcome::RestartPending) {
            self.stall.untrack(lane);
        }
        self.apply_exit_outcome(lane, &outcome);
    }

    fn read_dependency_request(&self, lane_name: &str) -> Option<DependencyRequestPlan> {
        let lane = self.scheduler.lane_set().get(lane_name)?;
        let path = RunDir::dependency_request_path(&lane.worktree_root);
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn apply_exit_outcome(&mut self, lane: &str, outcome: &ExitOutcome) {
        let ts = self.clock.epoch_ms();
        match outcome {
            ExitOutcome::Completed => {
                self.publish(Event::LaneCompleted { run_id: self.run_id, lane_name: lane.to_string(), timestamp_epoch_ms: ts });
            }
            ExitOutcome::Blocked(plan) => {
                self.publish(Event::LaneBlocked {
                    run_id: self.run_id,
                    lane_name: lane.to_string(),
                    request: plan.clone(),
                    timestamp_epoch_ms: ts,
                });
            }
            ExitOutcome::MalformedBlock => {
                self.publish(Event::LaneFailed {
                    run_id: self.run_id,
                    lane_name: lane.to_string(),
                    reason: "exit code 2 without a well-formed dependency request".to_string(),
                    timestamp_epoch_ms: ts,
                });
            }
            ExitOutcome::RestartPending => {}
            ExitOutcome::Failed(reason) => {
                self.publish(Event::LaneFailed {
                    run_id: self.run_id,
                    lane_name: lane.to_string(),
                    reason: reason.clone(),
                    timestamp_epoch_ms: ts,
                });
            }
        }
    }

    /// Runs one Dependency Resolver pass over every currently blocked lane
    /// (spec.md §4.4).
    async fn run_resolution(&mut self) {
        let blocked_names: Vec<String> = self.scheduler.blocked().iter().cloned().collect();
        let mut blocked = Vec::with_capacity(blocked_names.len());
        for name in &blocked_names {
            let Some(lane) = self.scheduler.lane_set().get(name) else { continue };
            let Some(request) = self.read_dependency_request(name) else { continue };
            if !request.is_actionable() {
                continue;
            }
            let current_task_index = self.scheduler.start_index(name);
            blocked.push(BlockedLane {
                lane_name: name.clone(),
                pipeline_branch: lane.pipeline_branch.clone(),
                worktree_dir: lane.worktree_root.clone(),
                current_task_index,
                current_task_name: lane.task_name_at(current_task_index).map(str::to_string),
                request,
            });
        }
        if blocked.is_empty() {
            return;
        }

        let base_branch = blocked[0].pipeline_branch.clone();
        let outcome = self
            .resolver
            .resolve(&blocked, &self.run_dir.resolution_worktree(), &base_branch, &base_branch)
            .await;

        match outcome {
            ResolutionOutcome::Resolved { changes, synced, sync_failed } => {
                self.publish(Event::ResolutionCommitted {
                    run_id: self.run_id,
                    changes,
                    timestamp_epoch_ms: self.clock.epoch_ms(),
                });
                for lane in &synced {
                    if let Some(def) = self.scheduler.lane_set().get(lane) {
                        let _ = std::fs::remove_file(RunDir::dependency_request_path(&def.worktree_root));
                    }
                    self.publish(Event::BranchSynced {
                        run_id: self.run_id,
                        lane_name: lane.clone(),
                        timestamp_epoch_ms: self.clock.epoch_ms(),
                    });
                }
                for (lane, reason) in &sync_failed {
                    self.publish(Event::BranchSyncFailed {
                        run_id: self.run_id,
                        lane_name: lane.clone(),
                        reason: reason.clone(),
                        timestamp_epoch_ms: self.clock.epoch_ms(),
                    });
                }
                self.scheduler.clear_resolved(&synced);
            }
            ResolutionOutcome::Failed { reason } => {
                let failed = self.scheduler.fail_all_blocked(&reason);
                for (lane, reason) in failed {
                    self.publish(Event::LaneFailed {
                        run_id: self.run_id,
                        lane_name: lane,
                        reason,
                        timestamp_epoch_ms: self.clock.epoch_ms(),
                    });
                }
            }
        }
    }

    fn publish(&self, event: Event) {
        self.events.publish(event);
    }
}

/// Drains a spawned lane's [`crate::supervisor::LaneWaiter`] to completion,
/// reporting each parsed-message arrival as activity and the final exit
/// code once draining finishes. Runs as its own task so the coordinator's
/// main select loop only ever holds the cloneable [`LaneControl`] half.
fn spawn_drain_task(
    lane_name: String,
    mut waiter: crate::supervisor::LaneWaiter,
    tx: mpsc::UnboundedSender<(String, LaneEvent)>,
) {
    tokio::spawn(async move {
        while waiter.recv_message().await.is_some() {
            let _ = tx.send((lane_name.clone(), LaneEvent::Activity));
        }
        let exit_code = waiter.wait().await;
        let _ = tx.send((lane_name, LaneEvent::Exited(exit_code)));
    });
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
