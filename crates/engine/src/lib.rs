// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lanes-engine: the orchestration engine proper (spec.md §2) — the
//! Dependency Scheduler, the Stall & Recovery Controller, the Lane
//! Supervisor, the Dependency Resolver, the Log Parser & Multiplexer, and
//! the event bus that fans their lifecycle records out to subscribers. The
//! [`coordinator`] module wires all five together into the single run loop
//! spec.md §5 describes.

pub mod coordinator;
pub mod events;
pub mod log_parser;
pub mod resolver;
pub mod rotation;
pub mod scheduler;
pub mod stall;
pub mod supervisor;
pub mod time_fmt;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use events::{EventBus, Subscription};
pub use log_parser::LogParser;
pub use resolver::{BlockedLane, Resolver, ResolutionOutcome};
pub use rotation::RotatingSink;
pub use scheduler::{ExitOutcome, Readiness, Scheduler, TickOutcome};
pub use stall::{StallAction, StallController, StallPhase, StallThresholds};
pub use supervisor::{LaneControl, LaneHandle, LaneWaiter, LaunchSpec, Supervisor, SupervisorError};
