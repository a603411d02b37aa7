// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Dependency-aware admission scheduler (spec.md §4.2).
//!
//! Owns the `{running, completed, failed, blocked}` live sets — the single
//! authoritative bookkeeping for lane membership (spec.md §5 "the only
//! shared mutable resource in the coordinator is the Scheduler's live set
//! bookkeeping, mutated only by the coordinator loop"). Everything else
//! (the Supervisor, the Resolver) only reads lane state; this type is the
//! sole writer.

use lanes_core::{DependencyEdge, DependencyRequestPlan, Lane, LaneRunState, LaneSet};
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Per-lane readiness as defined by the predicate in spec.md §4.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Already running/completed/failed/blocked — not a scheduling
    /// candidate at all.
    NotApplicable,
    Ready,
    Waiting,
    /// A dependency failed; fail-fast propagation marks this lane failed
    /// too (spec.md §4.2 rule 2).
    ShouldFail(String),
}

/// Outcome of a lane's child process exiting, as interpreted by
/// [`Scheduler::observe_exit`] (spec.md §4.2 "Exit handling", §7).
#[derive(Debug, Clone, PartialEq)]
pub enum ExitOutcome {
    Completed,
    Blocked(DependencyRequestPlan),
    /// Exit code 2 without a well-formed request file — data integrity
    /// failure (spec.md §4.1, §7).
    MalformedBlock,
    /// Non-zero, non-2 exit while the Stall Controller was mid-restart —
    /// not a failure; the lane is eligible to restart next tick.
    RestartPending,
    Failed(String),
}

/// What the coordinator should do as a result of one scheduling tick.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Lanes to start this tick, in the lexicographic tie-break order
    /// spec.md §4.2 requires, already capped to free concurrency slots.
    pub to_start: Vec<String>,
    /// Lanes newly marked failed this tick (by propagation or deadlock),
    /// with a human-readable reason.
    pub newly_failed: Vec<(String, String)>,
    pub deadlocked: bool,
    /// The run has nothing left to do (spec.md §4.2 "Termination").
    pub done: bool,
}

pub struct Scheduler {
    lane_set: LaneSet,
    concurrency: usize,
    auto_resolve_enabled: bool,
    states: HashMap<String, LaneRunState>,
    start_index: HashMap<String, usize>,
    running: BTreeSet<String>,
    completed: BTreeSet<String>,
    failed: BTreeSet<String>,
    blocked: BTreeSet<String>,
}

impl Scheduler {
    pub fn new(lane_set: LaneSet, concurrency: usize, auto_resolve_enabled: bool) -> Self {
        let states =
            lane_set.iter().map(|l: &Lane| (l.name.clone(), LaneRunState::pending(l))).collect();
        Self {
            lane_set,
            concurrency: concurrency.max(1),
            auto_resolve_enabled,
            states,
            start_index: HashMap::new(),
            running: BTreeSet::new(),
            completed: BTreeSet::new(),
            failed: BTreeSet::new(),
            blocked: BTreeSet::new(),
        }
    }

    pub fn lane_set(&self) -> &LaneSet {
        &self.lane_set
    }

    pub fn running(&self) -> &BTreeSet<String> {
        &self.running
    }

    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn failed(&self) -> &BTreeSet<String> {
        &self.failed
    }

    pub fn blocked(&self) -> &BTreeSet<String> {
        &self.blocked
    }

    /// The start index the next spawn of this lane should use (spec.md
    /// §4.2 "Exit handling"): 0 until the lane has blocked or needed a
    /// restart.
    pub fn start_index(&self, lane: &str) -> usize {
        self.start_index.get(lane).copied().unwrap_or(0)
    }

    /// Refresh the Scheduler's view of a lane's run state. The Supervisor
    /// calls this whenever it persists new `LaneRunState` so task-level
    /// dependency edges referencing a still-running lane (spec.md §4.2
    /// rule 2, `X:T` case) observe up-to-date progress.
    pub fn sync_state(&mut self, lane: &str, state: LaneRunState) {
        self.states.insert(lane.to_string(), state);
    }

    fn in_any_set(&self, lane: &str) -> bool {
        self.running.contains(lane)
            || self.completed.contains(lane)
            || self.failed.contains(lane)
            || self.blocked.contains(lane)
    }

    fn edge_outcome(&self, edge: &DependencyEdge) -> Readiness {
        let target = edge.lane_name();
        if self.completed.contains(target) {
            return Readiness::Ready;
        }
        if self.failed.contains(target) {
            return Readiness::ShouldFail(format!("dependency lane `{target}` failed"));
        }
        match edge {
            DependencyEdge::Lane(_) => Readiness::Waiting,
            DependencyEdge::Task(_, task_ref) => {
                let satisfied = self
                    .states
                    .get(target)
                    .map(|state| state.has_completed_task(task_ref))
                    .unwrap_or(false);
                if satisfied {
                    Readiness::Ready
                } else {
                    Readiness::Waiting
                }
            }
        }
    }

    /// The readiness predicate in spec.md §4.2, including rule 3's
    /// first-task pre-gate when the lane's next start index is 0.
    pub fn readiness(&self, lane: &str) -> Readiness {
        if self.in_any_set(lane) {
            return Readiness::NotApplicable;
        }
        let Some(lane_def) = self.lane_set.get(lane) else {
            return Readiness::NotApplicable;
        };

        let mut edges: Vec<&DependencyEdge> = lane_def.depends_on.iter().collect();
        if self.start_index(lane) == 0 {
            if let Some(first) = lane_def.first_task() {
                edges.extend(first.depends_on.iter());
            }
        }

        let mut waiting = false;
        for edge in edges {
            match self.edge_outcome(edge) {
                Readiness::Ready | Readiness::NotApplicable => {}
                Readiness::Waiting => waiting = true,
                fail @ Readiness::ShouldFail(_) => return fail,
            }
        }
        if waiting {
            Readiness::Waiting
        } else {
            Readiness::Ready
        }
    }

    fn lane_names(&self) -> Vec<String> {
        self.lane_set.names().map(str::to_string).collect()
    }

    /// Runs one scheduling tick: fail-fast propagation to a fixed point,
    /// deadlock detection, then selection of lanes to start (spec.md §4.2).
    pub fn tick(&mut self) -> TickOutcome {
        let mut newly_failed = Vec::new();

        loop {
            let mut changed = false;
            for name in self.lane_names() {
                if self.in_any_set(&name) {
                    continue;
                }
                if let Readiness::ShouldFail(reason) = self.readiness(&name) {
                    self.failed.insert(name.clone());
                    newly_failed.push((name, reason));
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut ready: Vec<String> = self
            .lane_names()
            .into_iter()
            .filter(|n| !self.in_any_set(n) && self.readiness(n) == Readiness::Ready)
            .collect();
        ready.sort();

        let mut deadlocked = false;
        let total = self.lane_set.len();
        let settled = || self.completed.len() + self.failed.len() + self.blocked.len();

        if self.running.is_empty() && ready.is_empty() && settled() < total {
            deadlocked = true;
            for name in self.lane_names() {
                if !self.in_any_set(&name) {
                    self.failed.insert(name.clone());
                    newly_failed.push((name, "deadlock".to_string()));
                }
            }
        }

        let free_slots = self.concurrency.saturating_sub(self.running.len());
        let to_start: Vec<String> = ready.into_iter().take(free_slots).collect();

        let done = settled() == total && (self.blocked.is_empty() || !self.auto_resolve_enabled);

        TickOutcome { to_start, newly_failed, deadlocked, done }
    }

    /// Commits a lane that the coordinator is actually spawning this tick.
    pub fn mark_started(&mut self, lane: &str) {
        self.running.insert(lane.to_string());
    }

    /// Spawn itself failed at the OS level (spec.md §4.1, §7): immediate
    /// failure, exit code 1.
    pub fn mark_spawn_failed(&mut self, lane: &str) {
        self.running.remove(lane);
        self.failed.insert(lane.to_string());
    }

    /// Interprets one lane's child process exit (spec.md §4.2 "Exit
    /// handling").
    pub fn observe_exit(
        &mut self,
        lane: &str,
        exit_code: i32,
        request: Option<DependencyRequestPlan>,
        restarting: bool,
        current_task_index: usize,
    ) -> ExitOutcome {
        self.running.remove(lane);
        match exit_code {
            lanes_adapters::child::EXIT_SUCCESS => {
                self.completed.insert(lane.to_string());
                self.start_index.remove(lane);
                ExitOutcome::Completed
            }
            lanes_adapters::child::EXIT_BLOCKED => match request {
                Some(plan) => {
                    self.blocked.insert(lane.to_string());
                    self.start_index.insert(lane.to_string(), current_task_index.saturating_sub(1));
                    ExitOutcome::Blocked(plan)
                }
                None => {
                    self.failed.insert(lane.to_string());
                    ExitOutcome::MalformedBlock
                }
            },
            other => {
                if restarting {
                    self.start_index.insert(lane.to_string(), current_task_index);
                    ExitOutcome::RestartPending
                } else {
                    self.failed.insert(lane.to_string());
                    ExitOutcome::Failed(format!("exit code {other}"))
                }
            }
        }
    }

    /// Clears `blocked` after a successful dependency resolution (spec.md
    /// §4.4 step 7). Blocked lanes stay queued at their pre-block start
    /// index, ready to retry next tick.
    pub fn clear_resolved(&mut self, lanes: &[String]) {
        for lane in lanes {
            self.blocked.remove(lane);
        }
    }

    /// Moves every currently blocked lane to failed (spec.md §4.4
    /// "If resolution fails at step 4, all lanes in `blocked` move to
    /// `failed`").
    pub fn fail_all_blocked(&mut self, reason: &str) -> Vec<(String, String)> {
        let lanes: Vec<String> = self.blocked.iter().cloned().collect();
        let mut failed = Vec::with_capacity(lanes.len());
        for lane in lanes {
            self.blocked.remove(&lane);
            self.failed.insert(lane.clone());
            failed.push((lane, reason.to_string()));
        }
        failed
    }

    /// The run's overall exit code (spec.md §7): 1 if any lane failed, 2
    /// if none failed but lanes remained blocked with auto-resolve
    /// disabled, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if !self.failed.is_empty() {
            1
        } else if !self.blocked.is_empty() {
            2
        } else {
            0
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
