// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Lane and Task definitions — the static, immutable work description for a
//! run. A [`Lane`] is loaded once from configuration and never mutated;
//! runtime progress lives in [`crate::run_state::LaneRunState`] instead.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Either a task name or its stable, zero-based index within a lane.
///
/// Both forms are accepted in a task-level dependency edge (`L:T`); the
/// scheduler tries a name match first, falling back to parsing `T` as an
/// index (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Name(String),
    Index(u32),
}

impl TaskRef {
    fn parse(s: &str) -> Self {
        match s.parse::<u32>() {
            Ok(n) => TaskRef::Index(n),
            Err(_) => TaskRef::Name(s.to_string()),
        }
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskRef::Name(n) => f.write_str(n),
            TaskRef::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A dependency edge declared by a lane or by a lane's first task.
///
/// Parses from the two string forms spec.md §3 defines:
/// - `L` — lane-level, satisfied when lane `L` has completed its last task.
/// - `L:T` — task-level, satisfied when lane `L` has completed task `T`
///   (a task name or a non-negative index).
///
/// Serializes back to the same string form, so a `LaneSet` round-trips
/// through TOML/JSON without losing the edge's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DependencyEdge {
    Lane(String),
    Task(String, TaskRef),
}

impl DependencyEdge {
    /// The lane name this edge depends on, regardless of edge kind.
    pub fn lane_name(&self) -> &str {
        match self {
            DependencyEdge::Lane(l) => l,
            DependencyEdge::Task(l, _) => l,
        }
    }
}

impl std::str::FromStr for DependencyEdge {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((lane, task)) => Ok(DependencyEdge::Task(lane.to_string(), TaskRef::parse(task))),
            None => Ok(DependencyEdge::Lane(s.to_string())),
        }
    }
}

impl TryFrom<String> for DependencyEdge {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DependencyEdge> for String {
    fn from(edge: DependencyEdge) -> String {
        edge.to_string()
    }
}

impl std::fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyEdge::Lane(l) => f.write_str(l),
            DependencyEdge::Task(l, t) => write!(f, "{l}:{t}"),
        }
    }
}

impl From<&str> for DependencyEdge {
    fn from(s: &str) -> Self {
        // Infallible per FromStr above.
        s.parse().unwrap_or_else(|_: std::convert::Infallible| unreachable!())
    }
}

/// An ordered element of a lane's task sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within the owning lane.
    pub name: String,
    pub prompt: String,
    #[serde(default)]
    pub depends_on: Vec<DependencyEdge>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, with = "duration_secs_opt")]
    pub timeout: Option<Duration>,
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_secs()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

/// Output format the agent child process is expected to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentOutputFormat {
    /// Newline-delimited JSON records (the default; see spec.md §4.5).
    Ndjson,
    /// Plain text only — every line is treated as a raw line.
    PlainText,
}

impl Default for AgentOutputFormat {
    fn default() -> Self {
        AgentOutputFormat::Ndjson
    }
}

/// Per-lane policy flags (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanePolicy {
    #[serde(default)]
    pub auto_resolve: bool,
    #[serde(default)]
    pub review: bool,
    #[serde(default)]
    pub output_format: AgentOutputFormat,
}

impl Default for LanePolicy {
    fn default() -> Self {
        Self { auto_resolve: true, review: false, output_format: AgentOutputFormat::Ndjson }
    }
}

/// The static unit of work: an ordered task sequence run by one lane on its
/// own worktree/branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Unique across the run's `LaneSet`.
    pub name: String,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub depends_on: Vec<DependencyEdge>,
    pub worktree_root: PathBuf,
    pub base_branch: String,
    pub pipeline_branch: String,
    #[serde(default)]
    pub policy: LanePolicy,
}

impl Lane {
    /// The lane's first task, if any. A lane with zero tasks is rejected at
    /// `LaneSet` construction time (spec.md §8 boundary behavior).
    pub fn first_task(&self) -> Option<&Task> {
        self.tasks.first()
    }

    /// Look up a task's stable index by name or numeric-index string.
    pub fn task_index(&self, reference: &TaskRef) -> Option<usize> {
        match reference {
            TaskRef::Name(name) => self.tasks.iter().position(|t| &t.name == name),
            TaskRef::Index(i) => {
                let i = *i as usize;
                (i < self.tasks.len()).then_some(i)
            }
        }
    }

    pub fn task_name_at(&self, index: usize) -> Option<&str> {
        self.tasks.get(index).map(|t| t.name.as_str())
    }
}

crate::builder! {
    pub struct LaneBuilder => Lane {
        into {
            name: String = "lane-a",
            base_branch: String = "main",
            pipeline_branch: String = "pipeline",
        }
        set {
            tasks: Vec<Task> = vec![Task {
                name: "t1".to_string(),
                prompt: "do the thing".to_string(),
                depends_on: Vec::new(),
                model: None,
                timeout: None,
            }],
            depends_on: Vec<DependencyEdge> = Vec::new(),
            worktree_root: PathBuf = PathBuf::from("/tmp/lane-a"),
            policy: LanePolicy = LanePolicy::default(),
        }
    }
}

impl Task {
    pub fn simple(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            depends_on: Vec::new(),
            model: None,
            timeout: None,
        }
    }
}

#[cfg(test)]
#[path = "lane_tests.rs"]
mod tests;
