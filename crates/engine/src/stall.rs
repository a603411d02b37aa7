// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Stall & Recovery Controller (spec.md §4.3): per-running-lane idle-time
//! state machine deciding between a soft nudge, a hard restart, and abort.
//!
//! Polled every tick by the coordinator (spec.md §5: the 10s tick bounds
//! worst-case reaction latency). Takes a [`lanes_core::Clock`] so its
//! transitions are unit-testable with [`lanes_core::FakeClock`] instead of
//! real sleeps (spec.md §9 design note).

use lanes_core::Clock;
use std::collections::HashMap;
use std::time::Duration;

/// The controller's ordinal state per lane (spec.md §4.3, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallPhase {
    Normal,
    Nudged,
    Restarting,
    Aborting,
}

/// Action the coordinator should take as a result of a poll
/// (spec.md §4.3 transitions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StallAction {
    None,
    /// Write `"continue"` to the lane's `intervention.txt`.
    Nudge,
    /// Send a kill signal; on exit the Scheduler should not mark the lane
    /// failed and should re-enqueue it at its current task index.
    Restart,
    /// Restart bound exceeded; send kill and let the Scheduler mark failed
    /// on exit.
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct StallThresholds {
    pub continue_threshold: Duration,
    pub restart_threshold: Duration,
    pub max_restarts: u32,
}

impl Default for StallThresholds {
    fn default() -> Self {
        Self {
            continue_threshold: Duration::from_secs(3 * 60),
            restart_threshold: Duration::from_secs(5 * 60),
            max_restarts: 2,
        }
    }
}

struct LaneStallState {
    phase: StallPhase,
    last_activity: std::time::Instant,
    /// When the nudge fired, so `restart_threshold` is measured from the
    /// nudge rather than from the original activity timestamp (spec.md
    /// §4.3: "(1) if idle > RESTART_THRESHOLD ... measured from the
    /// nudge").
    nudged_at: Option<std::time::Instant>,
    restart_count: u32,
}

/// Per-lane idle-time state machine (spec.md §4.3).
pub struct StallController<C: Clock> {
    clock: C,
    thresholds: StallThresholds,
    lanes: HashMap<String, LaneStallState>,
}

impl<C: Clock> StallController<C> {
    pub fn new(clock: C, thresholds: StallThresholds) -> Self {
        Self { clock, thresholds, lanes: HashMap::new() }
    }

    /// Begins tracking a lane's stall clock for a new process epoch
    /// (spec.md §4.3: "once (1) has taken effect it is only cleared by a
    /// new process epoch"). `restart_count` survives across epochs of the
    /// same lane — it bounds total restarts over the lane's whole run, not
    /// per-epoch — and only resets when the lane is tracked for the first
    /// time.
    pub fn track(&mut self, lane: &str) {
        let restart_count = self.lanes.get(lane).map(|s| s.restart_count).unwrap_or(0);
        self.lanes.insert(
            lane.to_string(),
            LaneStallState {
                phase: StallPhase::Normal,
                last_activity: self.clock.now(),
                nudged_at: None,
                restart_count,
            },
        );
    }

    pub fn untrack(&mut self, lane: &str) {
        self.lanes.remove(lane);
    }

    pub fn phase(&self, lane: &str) -> Option<StallPhase> {
        self.lanes.get(lane).map(|s| s.phase)
    }

    pub fn restart_count(&self, lane: &str) -> u32 {
        self.lanes.get(lane).map(|s| s.restart_count).unwrap_or(0)
    }

    /// The parser emitted a non-noise message for this lane: resets the
    /// activity clock (spec.md §4.3 "Any parsed-message arrival resets the
    /// activity timestamp").
    pub fn record_activity(&mut self, lane: &str) {
        if let Some(state) = self.lanes.get_mut(lane) {
            state.last_activity = self.clock.now();
            if state.phase == StallPhase::Nudged {
                // "drops stallPhase back toward 0 on the *next* tick" —
                // recorded here, applied by poll().
                state.phase = StallPhase::Normal;
                state.nudged_at = None;
            }
        }
    }

    /// One state-machine step for `lane` (spec.md §4.3 transitions).
    pub fn poll(&mut self, lane: &str) -> StallAction {
        let now = self.clock.now();
        let Some(state) = self.lanes.get_mut(lane) else {
            return StallAction::None;
        };

        match state.phase {
            StallPhase::Normal => {
                let idle = now.saturating_duration_since(state.last_activity);
                if idle > self.thresholds.continue_threshold {
                    state.phase = StallPhase::Nudged;
                    state.nudged_at = Some(now);
                    StallAction::Nudge
                } else {
                    StallAction::None
                }
            }
            StallPhase::Nudged => {
                let since_nudge = state.nudged_at.map(|t| now.saturating_duration_since(t)).unwrap_or_default();
                if since_nudge > self.thresholds.restart_threshold {
                    state.phase = StallPhase::Restarting;
                    state.restart_count += 1;
                    StallAction::Restart
                } else {
                    StallAction::None
                }
            }
            StallPhase::Restarting => {
                if state.restart_count > self.thresholds.max_restarts {
                    state.phase = StallPhase::Aborting;
                    StallAction::Abort
                } else {
                    StallAction::None
                }
            }
            StallPhase::Aborting => StallAction::None,
        }
    }
}

#[cfg(test)]
#[path = "stall_tests.rs"]
mod tests;
