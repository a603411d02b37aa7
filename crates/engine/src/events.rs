// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Event bus (spec.md §6 "Event delivery"): fans every [`Event`] out to
//! subscribers registered by exact type, by category, or unfiltered. Keeps a
//! bounded in-memory history so a subscriber that connects mid-run can
//! still be handed recent events, and supports NDJSON export/import for
//! offline inspection of a run.

use lanes_core::{Event, EventCategory};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What a subscriber wants to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    All,
    Category(EventCategory),
    /// Exact `type` tag, e.g. `"lane:started"` ([`Event::type_tag`]).
    Type(String),
}

impl Subscription {
    fn matches(&self, event: &Event) -> bool {
        match self {
            Subscription::All => true,
            Subscription::Category(category) => event.category() == *category,
            Subscription::Type(type_tag) => event.type_tag() == type_tag,
        }
    }
}

struct Subscriber {
    filter: Subscription,
    tx: mpsc::UnboundedSender<Event>,
}

/// History retention window (spec.md §6: "bounded (default 1000 events,
/// 30-minute TTL)"), measured against each newly published event's own
/// `timestamp_epoch_ms`.
const HISTORY_TTL_MS: u64 = 30 * 60 * 1000;

struct BusState {
    subscribers: Vec<Subscriber>,
    history: VecDeque<Event>,
    history_capacity: usize,
}

/// In-process pub/sub fan-out for orchestration [`Event`]s.
///
/// Cheaply cloneable (an `Arc` handle); every clone shares the same
/// subscriber list and history (spec.md §6: "event delivery is best-effort
/// and non-blocking — a slow or absent subscriber never delays the
/// orchestrator").
#[derive(Clone)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
}

impl EventBus {
    /// `history_capacity` bounds how many past events a new subscriber can
    /// be replayed (spec.md §6); 0 disables history retention.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                subscribers: Vec::new(),
                history: VecDeque::new(),
                history_capacity,
            })),
        }
    }

    /// Registers a new subscriber and returns its receiver. Does not replay
    /// history; call [`EventBus::history`] first if the caller wants it.
    pub fn subscribe(&self, filter: Subscription) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push(Subscriber { filter, tx });
        rx
    }

    /// Publishes `event` to every matching subscriber and appends it to
    /// history. A subscriber whose receiver has been dropped is pruned on
    /// its next delivery attempt rather than eagerly, since publish must
    /// never block on subscriber liveness.
    pub fn publish(&self, event: Event) {
        let mut state = self.state.lock();
        state.subscribers.retain(|s| !s.tx.is_closed());
        for subscriber in &state.subscribers {
            if subscriber.filter.matches(&event) {
                let _ = subscriber.tx.send(event.clone());
            }
        }
        if state.history_capacity > 0 {
            let now = event.timestamp_epoch_ms();
            state.history.push_back(event);
            while state.history.len() > state.history_capacity {
                state.history.pop_front();
            }
            while state
                .history
                .front()
                .is_some_and(|oldest| now.saturating_sub(oldest.timestamp_epoch_ms()) > HISTORY_TTL_MS)
            {
                state.history.pop_front();
            }
        }
    }

    /// Snapshot of retained history, oldest first.
    pub fn history(&self) -> Vec<Event> {
        self.state.lock().history.iter().cloned().collect()
    }

    /// Serializes the retained history as newline-delimited JSON (spec.md
    /// §6 "a run's full event history can be exported as NDJSON").
    pub fn export_ndjson(&self) -> Result<String, serde_json::Error> {
        let history = self.history();
        let mut out = String::new();
        for event in &history {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parses an NDJSON export back into a `Vec<Event>`, one per non-blank
    /// line. Does not publish the events or mutate this bus's history.
    pub fn import_ndjson(text: &str) -> Result<Vec<Event>, serde_json::Error> {
        text.lines().filter(|l| !l.trim().is_empty()).map(serde_json::from_str).collect()
    }
}

impl Default for EventBus {
    /// 1000 events of retained history, matching the teacher's default
    /// job-log retention window.
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
