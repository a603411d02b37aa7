// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Paths within one run's on-disk layout (spec.md §6):
//!
//! ```text
//! <logsDir>/runs/<runId>/
//!   lanes/<laneName>/state.json
//!   lanes/<laneName>/terminal-raw.log(.N)
//!   lanes/<laneName>/terminal-readable.log(.N)
//!   lanes/<laneName>/intervention.txt
//!   resolution-worktree/
//! ```

use lanes_core::RunId;
use std::path::{Path, PathBuf};

/// Resolves the well-known paths under `<logsDir>/runs/<runId>/`.
#[derive(Debug, Clone)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    pub fn new(logs_dir: impl AsRef<Path>, run_id: RunId) -> Self {
        Self { root: logs_dir.as_ref().join("runs").join(run_id.as_str()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lane_dir(&self, lane_name: &str) -> PathBuf {
        self.root.join("lanes").join(lane_name)
    }

    pub fn state_path(&self, lane_name: &str) -> PathBuf {
        self.lane_dir(lane_name).join("state.json")
    }

    pub fn intervention_path(&self, lane_name: &str) -> PathBuf {
        self.lane_dir(lane_name).join("intervention.txt")
    }

    pub fn raw_log_path(&self, lane_name: &str) -> PathBuf {
        self.lane_dir(lane_name).join("terminal-raw.log")
    }

    pub fn readable_log_path(&self, lane_name: &str) -> PathBuf {
        self.lane_dir(lane_name).join("terminal-readable.log")
    }

    pub fn resolution_worktree(&self) -> PathBuf {
        self.root.join("resolution-worktree")
    }

    /// The worktree-relative path a blocked lane writes its
    /// [`lanes_core::DependencyRequestPlan`] to (spec.md §6).
    pub fn dependency_request_path(worktree_dir: &Path) -> PathBuf {
        worktree_dir.join("_cursorflow").join("dependency-request.json")
    }
}

#[cfg(test)]
#[path = "run_dir_tests.rs"]
mod tests;
