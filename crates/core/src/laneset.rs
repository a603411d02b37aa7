// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! The validated, load-time collection of [`Lane`]s that make up one run.
//!
//! A `LaneSet` is constructed once (from TOML configuration, typically) and
//! never mutated afterwards; the Scheduler and Supervisor only ever read it.
//! Construction performs the structural checks spec.md §4.1/§8 require so
//! that nothing downstream has to re-check them at runtime.

use crate::errors::LaneSetError;
use crate::lane::{DependencyEdge, Lane, TaskRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A validated, order-preserving collection of lanes for one run.
///
/// Lane iteration order follows declaration order, which the tie-break rule
/// in spec.md §4.2 uses as its last resort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLaneSet", into = "RawLaneSet")]
pub struct LaneSet {
    lanes: IndexMap<String, Lane>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLaneSet {
    #[serde(default)]
    lane: Vec<Lane>,
}

impl TryFrom<RawLaneSet> for LaneSet {
    type Error = LaneSetError;

    fn try_from(raw: RawLaneSet) -> Result<Self, Self::Error> {
        LaneSet::new(raw.lane)
    }
}

impl From<LaneSet> for RawLaneSet {
    fn from(set: LaneSet) -> Self {
        RawLaneSet { lane: set.lanes.into_values().collect() }
    }
}

impl LaneSet {
    /// Build a `LaneSet` from an unordered list of lanes, running every
    /// structural check spec.md §4.1/§8 names: duplicate lane/task names,
    /// empty lanes, unknown lane/task references, self-dependencies, and
    /// dependency cycles.
    pub fn new(lanes: Vec<Lane>) -> Result<Self, LaneSetError> {
        let mut map = IndexMap::with_capacity(lanes.len());
        for lane in lanes {
            if lane.tasks.is_empty() {
                return Err(LaneSetError::EmptyLane(lane.name.clone()));
            }
            let mut seen_tasks = std::collections::HashSet::new();
            for task in &lane.tasks {
                if !seen_tasks.insert(task.name.clone()) {
                    return Err(LaneSetError::DuplicateTaskName(
                        lane.name.clone(),
                        task.name.clone(),
                    ));
                }
            }
            if map.insert(lane.name.clone(), lane).is_some() {
                let name = map.last().map(|(k, _)| k.clone()).unwrap_or_default();
                return Err(LaneSetError::DuplicateLaneName(name));
            }
        }

        let set = LaneSet { lanes: map };
        set.validate_references()?;
        set.validate_acyclic()?;
        Ok(set)
    }

    /// Validates that every edge names a lane that exists (spec.md §3: "a
    /// dependency references an existing lane; referencing an unknown lane
    /// is a configuration error detected at load time"). An edge naming an
    /// unknown *task* within a known lane is deliberately left unvalidated
    /// here: spec.md §3 permits it ("Task-level references to unknown task
    /// names are permitted but never satisfied") — the scheduler's
    /// readiness predicate (spec.md §4.2) simply never sees that edge
    /// satisfied unless the lane completes.
    fn validate_references(&self) -> Result<(), LaneSetError> {
        for lane in self.lanes.values() {
            for edge in all_edges(lane) {
                if edge.lane_name() == lane.name {
                    return Err(LaneSetError::SelfDependency(lane.name.clone()));
                }
                if !self.lanes.contains_key(edge.lane_name()) {
                    return Err(LaneSetError::UnknownLaneReference(
                        lane.name.clone(),
                        edge.lane_name().to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_acyclic(&self) -> Result<(), LaneSetError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: IndexMap<&str, Mark> = IndexMap::new();

        fn visit<'a>(
            set: &'a LaneSet,
            name: &'a str,
            marks: &mut IndexMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
        ) -> Result<(), LaneSetError> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    stack.push(name);
                    let cycle_start = stack.iter().position(|n| *n == name).unwrap_or(0);
                    return Err(LaneSetError::Cycle(stack[cycle_start..].join(" -> ")));
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            stack.push(name);
            if let Some(lane) = set.lanes.get(name) {
                for edge in all_edges(lane) {
                    visit(set, edge.lane_name(), marks, stack)?;
                }
            }
            stack.pop();
            marks.insert(name, Mark::Done);
            Ok(())
        }

        for name in self.lanes.keys() {
            let mut stack = Vec::new();
            visit(self, name.as_str(), &mut marks, &mut stack)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Lane> {
        self.lanes.get(name)
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lanes.keys().map(|s| s.as_str())
    }
}

/// All dependency edges a lane carries: its own `depends_on` plus its first
/// task's `depends_on` (spec.md §3: a lane's first task may declare
/// additional task-level edges beyond the lane-level ones).
fn all_edges(lane: &Lane) -> impl Iterator<Item = &DependencyEdge> {
    let task_edges = lane.first_task().map(|t| t.depends_on.iter()).into_iter().flatten();
    lane.depends_on.iter().chain(task_edges)
}

#[cfg(test)]
#[path = "laneset_tests.rs"]
mod tests;
