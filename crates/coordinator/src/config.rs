// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Loads a run's configuration: the coordinator's own knobs plus the
//! `LaneSet` it drives, from a single TOML file (spec.md §1, §6 — no
//! subcommands, no flags beyond `--config <path>`, since the full CLI
//! surface is out of scope).

use lanes_core::{Lane, LaneSet, LaneSetError};
use lanes_engine::CoordinatorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse config file at {path}: {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },

    #[error(transparent)]
    Lanes(#[from] LaneSetError),
}

/// The on-disk shape of a run's TOML configuration file. Every field but
/// `lane` is optional; an absent field falls back to
/// [`CoordinatorConfig::default`].
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    concurrency: Option<usize>,
    #[serde(default)]
    auto_resolve: Option<bool>,
    #[serde(default)]
    tick_interval_secs: Option<u64>,
    #[serde(default)]
    continue_threshold_secs: Option<u64>,
    #[serde(default)]
    restart_threshold_secs: Option<u64>,
    #[serde(default)]
    max_restarts: Option<u32>,
    #[serde(default)]
    logs_dir: Option<PathBuf>,
    #[serde(default)]
    repo_root: Option<PathBuf>,
    #[serde(default)]
    executable: Option<String>,
    #[serde(default)]
    executor: Option<String>,
    #[serde(default)]
    no_git: Option<bool>,
    #[serde(default)]
    lane: Vec<Lane>,
}

/// Everything one orchestrator run needs: the coordinator's own settings
/// plus the validated lane set it drives.
pub struct RunConfig {
    pub coordinator: CoordinatorConfig,
    pub lane_set: LaneSet,
}

impl RunConfig {
    /// Loads and validates a run's TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let raw: RawConfig = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

        let defaults = CoordinatorConfig::default();
        let mut thresholds = defaults.stall_thresholds;
        if let Some(secs) = raw.continue_threshold_secs {
            thresholds.continue_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) = raw.restart_threshold_secs {
            thresholds.restart_threshold = Duration::from_secs(secs);
        }
        if let Some(max) = raw.max_restarts {
            thresholds.max_restarts = max;
        }

        let coordinator = CoordinatorConfig {
            concurrency: raw.concurrency.unwrap_or(defaults.concurrency),
            auto_resolve_enabled: raw.auto_resolve.unwrap_or(defaults.auto_resolve_enabled),
            tick_interval: raw
                .tick_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.tick_interval),
            stall_thresholds: thresholds,
            logs_dir: raw.logs_dir.unwrap_or(defaults.logs_dir),
            repo_root: raw.repo_root.unwrap_or(defaults.repo_root),
            executable: raw.executable.unwrap_or(defaults.executable),
            executor: raw.executor.unwrap_or(defaults.executor),
            no_git: raw.no_git.unwrap_or(defaults.no_git),
        };

        let lane_set = LaneSet::new(raw.lane)?;

        Ok(Self { coordinator, lane_set })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
