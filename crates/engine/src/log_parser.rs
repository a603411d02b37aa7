// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Lanes Authors

//! Log Parser & Multiplexer (spec.md §4.5): turns a lane's raw stdout/stderr
//! byte stream into two on-disk sinks (raw, readable) and a stream of typed
//! [`ParsedMessage`]s the Stall Controller and event bus consume.

use crate::rotation::RotatingSink;
use crate::time_fmt;
use lanes_core::{Clock, MessageKind, MessageMeta, ParsedMessage};
use lanes_storage::RunDir;
use serde_json::Value;

/// Which of the child's two output streams a chunk came from. Both streams
/// share one raw sink and one readable sink (spec.md §4.5); only the
/// carryover buffer is kept separate per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Parses and multiplexes one lane's child output (spec.md §4.5).
pub struct LogParser<C: Clock> {
    clock: C,
    lane_name: String,
    raw: RotatingSink,
    readable: RotatingSink,
    raw_failed: bool,
    readable_failed: bool,
    stdout_carryover: String,
    stderr_carryover: String,
}

impl<C: Clock> LogParser<C> {
    pub fn new(run_dir: &RunDir, lane_name: &str, clock: C) -> std::io::Result<Self> {
        Ok(Self {
            clock,
            lane_name: lane_name.to_string(),
            raw: RotatingSink::with_defaults(run_dir.raw_log_path(lane_name))?,
            readable: RotatingSink::with_defaults(run_dir.readable_log_path(lane_name))?,
            raw_failed: false,
            readable_failed: false,
            stdout_carryover: String::new(),
            stderr_carryover: String::new(),
        })
    }

    fn append_raw(&mut self, bytes: &[u8]) {
        if self.raw_failed {
            return;
        }
        if let Err(e) = self.raw.append(bytes) {
            tracing::warn!(lane = %self.lane_name, error = %e, "failed to write raw log; disabling sink for remainder of run");
            self.raw_failed = true;
        }
    }

    fn append_readable(&mut self, line: &str) {
        if self.readable_failed {
            return;
        }
        let mut entry = line.to_string();
        if !entry.ends_with('\n') {
            entry.push('\n');
        }
        if let Err(e) = self.readable.append(entry.as_bytes()) {
            tracing::warn!(lane = %self.lane_name, error = %e, "failed to write readable log; disabling sink for remainder of run");
            self.readable_failed = true;
        }
    }

    fn format_readable(&self, msg: &ParsedMessage) -> String {
        let ts = time_fmt::format_short(msg.timestamp_epoch_ms);
        let content = msg.content.replace('\n', " ");
        format!("{ts} [{}] {}: {content}", self.lane_name, msg.kind)
    }

    /// Processes one chunk of bytes from `stream`: appends to the raw sink,
    /// splits complete lines off the stream's carryover buffer, classifies
    /// each, writes readable entries for non-noise lines, and returns the
    /// messages emitted (the caller treats a non-empty result as activity,
    /// resetting the Stall Controller's idle clock — spec.md §4.3).
    pub fn process_chunk(&mut self, stream: Stream, bytes: &[u8]) -> Vec<ParsedMessage> {
        self.append_raw(bytes);

        let carryover = match stream {
            Stream::Stdout => &mut self.stdout_carryover,
            Stream::Stderr => &mut self.stderr_carryover,
        };
        carryover.push_str(&String::from_utf8_lossy(bytes));
        let mut lines: Vec<String> = carryover.split('\n').map(String::from).collect();
        let new_carryover = lines.pop().unwrap_or_default();
        *carryover = new_carryover;

        let mut messages = Vec::new();
        for line in lines {
            if let Some(msg) = self.classify_and_emit(&line) {
                messages.push(msg);
            }
        }
        messages
    }

    fn classify_and_emit(&mut self, line: &str) -> Option<ParsedMessage> {
        let stripped = strip_ansi(line);
        let trimmed = stripped.trim();
        let ts = self.clock.epoch_ms();

        let msg = if trimmed.starts_with('{') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => classify_record(&value, ts),
                Err(_) => plain_line_message(trimmed, &stripped, ts),
            }
        } else {
            plain_line_message(trimmed, &stripped, ts)
        }?;

        self.append_readable(&self.format_readable(&msg));
        Some(msg)
    }

    /// Flushes any trailing partial line on child exit, writes a session
    /// footer, and returns whatever message the flushed carryover produced
    /// (spec.md §4.5 "On child exit").
    pub fn finish(&mut self) -> Vec<ParsedMessage> {
        let mut messages = Vec::new();
        for stream in [Stream::Stdout, Stream::Stderr] {
            let carryover = match stream {
                Stream::Stdout => std::mem::take(&mut self.stdout_carryover),
                Stream::Stderr => std::mem::take(&mut self.stderr_carryover),
            };
            if !carryover.is_empty() {
                if let Some(msg) = self.classify_and_emit(&carryover) {
                    messages.push(msg);
                }
            }
        }
        let footer = format!("{} [{}] -- session ended --", time_fmt::format_short(self.clock.epoch_ms()), self.lane_name);
        self.append_readable(&footer);
        messages
    }
}

fn plain_line_message(trimmed: &str, stripped: &str, ts: u64) -> Option<ParsedMessage> {
    if is_noise_line(trimmed) {
        None
    } else {
        Some(ParsedMessage::raw_line(stripped.to_string(), ts))
    }
}

/// Strips ANSI CSI sequences (`\x1b[...<terminator>`) from `line`, leaving a
/// plain-text string for classification and the readable sink (spec.md
/// §4.5, SPEC_FULL.md §4.5 "ground truth" note).
fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        if chars.as_str().starts_with('[') {
            chars.next();
            for c2 in chars.by_ref() {
                if c2.is_ascii_alphabetic() {
                    break;
                }
            }
        }
    }
    out
}

const SPINNER_GLYPHS: &[char] =
    &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏', '|', '/', '-', '\\'];

/// Noise lines are dropped without writing a sink entry or counting as
/// activity, so a spinner-only child doesn't mask a real stall (spec.md
/// §4.5).
fn is_noise_line(trimmed: &str) -> bool {
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.chars().all(is_box_drawing_char) {
        return true;
    }
    if trimmed.chars().all(|c| c == '.') {
        return true;
    }
    if is_percentage_only(trimmed) {
        return true;
    }
    is_single_spinner_glyph(trimmed)
}

fn is_box_drawing_char(c: char) -> bool {
    matches!(c as u32, 0x2500..=0x257F)
}

fn is_percentage_only(s: &str) -> bool {
    match s.strip_suffix('%') {
        Some(digits) if !digits.is_empty() => digits.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn is_single_spinner_glyph(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if SPINNER_GLYPHS.contains(&c))
}

/// Classifies one JSON record into a [`ParsedMessage`], or `None` for an
/// unrecognized `type` (spec.md §4.5 "Record classifier").
fn classify_record(value: &Value, ts: u64) -> Option<ParsedMessage> {
    let msg_type = value.get("type")?.as_str()?;
    match msg_type {
        "system" => {
            let model = value.get("model").and_then(Value::as_str).unwrap_or("unknown");
            let mode = value.get("mode").and_then(Value::as_str).unwrap_or("unknown");
            Some(ParsedMessage {
                kind: MessageKind::System,
                content: format!("model={model} mode={mode}"),
                timestamp_epoch_ms: ts,
                meta: MessageMeta::default(),
            })
        }
        "user" | "assistant" => {
            let kind = if msg_type == "user" { MessageKind::User } else { MessageKind::Assistant };
            let content = extract_message_text(value)?;
            Some(ParsedMessage { kind, content, timestamp_epoch_ms: ts, meta: MessageMeta::default() })
        }
        "thinking" => {
            let text = value.get("text")?.as_str()?.to_string();
            Some(ParsedMessage {
                kind: MessageKind::Thinking,
                content: text,
                timestamp_epoch_ms: ts,
                meta: MessageMeta::default(),
            })
        }
        "tool_call" => {
            let subtype = value.get("subtype").and_then(Value::as_str)?;
            let name = value.get("name").and_then(Value::as_str).unwrap_or("unknown").to_string();
            match subtype {
                "started" => {
                    let args = value.get("arguments").cloned().unwrap_or(Value::Null);
                    let content = format!("{name} {}", serde_json::to_string(&args).unwrap_or_default());
                    Some(ParsedMessage {
                        kind: MessageKind::ToolCallStarted,
                        content,
                        timestamp_epoch_ms: ts,
                        meta: MessageMeta { tool_name: Some(name), ..MessageMeta::default() },
                    })
                }
                "completed" => Some(ParsedMessage {
                    kind: MessageKind::ToolCallCompleted,
                    content: name.clone(),
                    timestamp_epoch_ms: ts,
                    meta: MessageMeta { tool_name: Some(name), ..MessageMeta::default() },
                }),
                _ => None,
            }
        }
        "result" => {
            let duration_ms = value.get("duration_ms").and_then(Value::as_u64);
            let is_error = value.get("is_error").and_then(Value::as_bool);
            let content = value.get("summary").and_then(Value::as_str).unwrap_or("").to_string();
            Some(ParsedMessage {
                kind: MessageKind::Result,
                content,
                timestamp_epoch_ms: ts,
                meta: MessageMeta { tool_name: None, duration_ms, is_error },
            })
        }
        _ => None,
    }
}

fn extract_message_text(value: &Value) -> Option<String> {
    let items = value.get("message")?.get("content")?.as_array()?;
    let mut out = String::new();
    for item in items {
        let text = item.get("text").and_then(Value::as_str).or_else(|| item.as_str());
        if let Some(text) = text {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(text);
        }
    }
    Some(out)
}

#[cfg(test)]
#[path = "log_parser_tests.rs"]
mod tests;
