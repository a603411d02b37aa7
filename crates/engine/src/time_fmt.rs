// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Timestamp formatting for the readable log sink (spec.md §4.5: "a short
//! timestamp and a short lane/task label").

use chrono::{DateTime, Utc};

/// Formats an epoch-millisecond timestamp as `HH:MM:SS`, UTC.
pub fn format_short(epoch_ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .format("%H:%M:%S")
        .to_string()
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
