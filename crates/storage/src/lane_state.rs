// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Reads and writes [`LaneRunState`] under a lane's run directory.
//!
//! Writes are atomic (write to a sibling temp file, then rename) so a
//! reader never observes a half-written `state.json`; spec.md §8 requires
//! that writing then reading a `LaneRunState` yields an equal value, which
//! a torn write would violate.

use lanes_core::{Lane, LaneRunState};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaneStateError {
    #[error("failed to read lane state at {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to write lane state at {path}: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse lane state at {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
}

/// Single-writer-per-lane store for [`LaneRunState`] (spec.md §3
/// "Ownership").
pub struct LaneStateStore;

impl LaneStateStore {
    /// Loads the lane's persisted state, or its `pending` default if no
    /// `state.json` exists yet (spec.md §9: "resume is best-effort").
    pub fn load_or_pending(path: &Path, lane: &Lane) -> Result<LaneRunState, LaneStateError> {
        match Self::load(path) {
            Ok(state) => Ok(state),
            Err(LaneStateError::Read { .. }) => Ok(LaneRunState::pending(lane)),
            Err(e) => Err(e),
        }
    }

    pub fn load(path: &Path) -> Result<LaneRunState, LaneStateError> {
        let bytes = std::fs::read(path)
            .map_err(|source| LaneStateError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_slice(&bytes)
            .map_err(|source| LaneStateError::Parse { path: path.to_path_buf(), source })
    }

    /// Writes `state` atomically under `path`, creating parent directories
    /// as needed.
    pub fn save(path: &Path, state: &LaneRunState) -> Result<(), LaneStateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| LaneStateError::Write { path: path.to_path_buf(), source })?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(state)
            .map_err(|source| LaneStateError::Parse { path: path.to_path_buf(), source })?;
        std::fs::write(&tmp_path, &body)
            .map_err(|source| LaneStateError::Write { path: tmp_path.clone(), source })?;
        std::fs::rename(&tmp_path, path)
            .map_err(|source| LaneStateError::Write { path: path.to_path_buf(), source })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "lane_state_tests.rs"]
mod tests;
