// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Dependency Request Plan — the structured payload a lane writes before
//! exiting with the "blocked" exit code (spec.md §3, §6).

use serde::{Deserialize, Serialize};

/// A blocked lane's request for an environment change.
///
/// Read from `<worktree>/_cursorflow/dependency-request.json` on exit code 2
/// (spec.md §6). `commands` and `changes` are both non-empty when the plan
/// is intended to trigger auto-resolution (spec.md §3); a plan with either
/// list empty is treated as malformed (spec.md §4.1, §7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequestPlan {
    pub reason: String,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl DependencyRequestPlan {
    /// Whether this plan is well-formed enough to drive auto-resolution
    /// (spec.md §3: "commands and changes are both non-empty").
    pub fn is_actionable(&self) -> bool {
        !self.changes.is_empty() && !self.commands.is_empty()
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
