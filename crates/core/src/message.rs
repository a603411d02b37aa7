// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Parsed Message — the typed record the Log Parser emits from a lane's
//! stdout/stderr byte stream (spec.md §3, §4.5).

use serde::{Deserialize, Serialize};

/// The classified shape of one line (or JSON record) of agent output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    System,
    User,
    Assistant,
    ToolCallStarted,
    ToolCallCompleted,
    Thinking,
    Result,
    RawLine,
}

crate::simple_display! {
    MessageKind {
        System => "system",
        User => "user",
        Assistant => "assistant",
        ToolCallStarted => "tool_call_started",
        ToolCallCompleted => "tool_call_completed",
        Thinking => "thinking",
        Result => "result",
        RawLine => "raw_line",
    }
}

/// Metadata that only some message kinds carry (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// One parsed unit of agent output.
///
/// The parser is a pure function of the byte stream plus its one-line
/// rollover buffer (spec.md §3): for every line of child stdout, at most one
/// `ParsedMessage` is emitted (spec.md §8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub kind: MessageKind,
    pub content: String,
    pub timestamp_epoch_ms: u64,
    #[serde(default, skip_serializing_if = "is_default_meta")]
    pub meta: MessageMeta,
}

fn is_default_meta(meta: &MessageMeta) -> bool {
    meta == &MessageMeta::default()
}

impl ParsedMessage {
    pub fn raw_line(content: impl Into<String>, timestamp_epoch_ms: u64) -> Self {
        Self {
            kind: MessageKind::RawLine,
            content: content.into(),
            timestamp_epoch_ms,
            meta: MessageMeta::default(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
