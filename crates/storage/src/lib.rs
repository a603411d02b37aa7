// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lanes-storage: on-disk persistence for [`lanes_core::LaneRunState`]
//! (spec.md §3, §6). Single-writer per lane (the Lane Supervisor that owns
//! the lane's child), read by the Scheduler and Resolver.

pub mod lane_state;
pub mod run_dir;

pub use lane_state::{LaneStateError, LaneStateStore};
pub use run_dir::RunDir;
