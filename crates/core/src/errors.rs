// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Load-time error types for [`crate::laneset::LaneSet`].

use thiserror::Error;

/// A `LaneSet` fails to load for one of these reasons (spec.md §4.1, §8).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaneSetError {
    #[error("lane `{0}` depends on unknown lane `{1}`")]
    UnknownLaneReference(String, String),

    #[error("lane `{0}` has no tasks")]
    EmptyLane(String),

    #[error("duplicate lane name `{0}`")]
    DuplicateLaneName(String),

    #[error("lane `{0}` has duplicate task name `{1}`")]
    DuplicateTaskName(String, String),

    #[error("lane `{0}` depends on itself")]
    SelfDependency(String),

    #[error("dependency cycle: {0}")]
    Cycle(String),

    #[error("failed to parse lane set: {0}")]
    Parse(String),

    #[error("failed to read lane set from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::sync::Arc<std::io::Error>,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
