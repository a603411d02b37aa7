// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lanes-adapters: the two external capabilities the engine consumes but
//! does not implement itself (spec.md §1 "Out of scope") — source-control
//! porcelain and child-process spawning. Both are small `async_trait`
//! interfaces so the engine can be driven by fakes in tests without a real
//! git checkout or a real agent binary.

pub mod child;
pub mod command_runner;
pub mod source_control;

pub use child::{ChildProcessError, ChildSignal, ChildSpawner, LaneChild, SpawnRequest};
pub use command_runner::{CommandError, CommandRunner, ShellCommandRunner};
pub use source_control::{SourceControl, SourceControlError};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
