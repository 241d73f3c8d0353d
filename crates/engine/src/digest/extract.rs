// SPDX-License-Identifier: MIT

//! Tail reading and text extraction for the two JSONL log dialects.
//!
//! Lines are parsed tolerantly: anything that is not valid JSON, or not a
//! message-bearing record, is dropped. Only plain text survives — tool
//! calls, thinking blocks, images, and the known noise tags never reach a
//! digest entry.

use super::discover::LogSource;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Initial tail window; doubled up to the cap while no line parses.
const TAIL_BYTES: u64 = 100 * 1024;
const TAIL_MAX_BYTES: u64 = 1024 * 1024;

/// Consecutive tool calls after the last text before a session counts as
/// possibly stuck.
const STUCK_TOOL_CALL_THRESHOLD: u32 = 5;

/// How stale the last text entry must be for the stuck signal to fire.
const STUCK_TEXT_STALE_MS: u64 = 30_000;

/// Who produced a digest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Assistant,
    User,
}

/// One text entry of a digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestEntry {
    pub kind: EntryKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_ms: Option<u64>,
}

/// Stuck signal: the agent keeps calling tools without saying anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StuckInfo {
    pub tool_calls_since_last_text: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_text_at_ms: Option<u64>,
    pub warning: String,
}

/// Parsed classification of one log line.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum RawRecord {
    AssistantText { text: String, at_ms: Option<u64> },
    AssistantToolUse { at_ms: Option<u64> },
    UserPrompt { text: String, at_ms: Option<u64> },
}

/// Read the tail of the log and classify its lines.
///
/// Starts with a 100 KB window; when that window yields no parseable JSONL
/// line at all, it doubles up to 1 MB. The first line of a mid-file window
/// is dropped as presumably truncated.
pub(super) fn read_tail_records(
    path: &Path,
    source: LogSource,
) -> std::io::Result<Vec<RawRecord>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut window = TAIL_BYTES;

    loop {
        let start = len.saturating_sub(window);
        file.seek(SeekFrom::Start(start))?;
        let mut buf = Vec::with_capacity((len - start) as usize);
        file.read_to_end(&mut buf)?;
        let text = String::from_utf8_lossy(&buf);

        let mut lines: Vec<&str> = text.split('\n').collect();
        if start > 0 && !lines.is_empty() {
            lines.remove(0);
        }

        let mut parsed_any = false;
        let mut records = Vec::new();
        for line in &lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            parsed_any = true;
            let record = match source {
                LogSource::Claude => classify_claude(&value),
                LogSource::Codex => classify_codex(&value),
            };
            if let Some(record) = record {
                records.push(record);
            }
        }

        if !parsed_any && start > 0 && window < TAIL_MAX_BYTES {
            window = (window * 2).min(TAIL_MAX_BYTES);
            continue;
        }
        return Ok(records);
    }
}

fn timestamp_ms(value: &Value) -> Option<u64> {
    match value.get("timestamp") {
        Some(Value::String(s)) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis().max(0) as u64),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    }
}

/// Claude dialect: `assistant`/`user` records with string-or-block content.
fn classify_claude(value: &Value) -> Option<RawRecord> {
    let at_ms = timestamp_ms(value);
    match value.get("type").and_then(Value::as_str)? {
        "assistant" => {
            let blocks = value.get("message")?.get("content")?.as_array()?;
            let mut texts: Vec<&str> = Vec::new();
            let mut saw_tool_use = false;
            for block in blocks {
                match block.get("type").and_then(Value::as_str) {
                    Some("text") => {
                        if let Some(text) = block.get("text").and_then(Value::as_str) {
                            texts.push(text);
                        }
                    }
                    Some("tool_use") => saw_tool_use = true,
                    // thinking, tool_result, image: dropped.
                    _ => {}
                }
            }
            if !texts.is_empty() {
                Some(RawRecord::AssistantText { text: texts.join("\n"), at_ms })
            } else if saw_tool_use {
                Some(RawRecord::AssistantToolUse { at_ms })
            } else {
                None
            }
        }
        "user" => {
            if value.get("isMeta").and_then(Value::as_bool) == Some(true) {
                return None;
            }
            // Only plain string content is a real human prompt.
            let text = value.get("message")?.get("content")?.as_str()?;
            if is_noise_message(text) {
                return None;
            }
            Some(RawRecord::UserPrompt { text: text.to_string(), at_ms })
        }
        _ => None,
    }
}

/// Codex `event_msg` payload types that never carry digest-worthy text.
const CODEX_EVENT_NOISE: &[&str] =
    &["agent_reasoning", "token_count", "task_started", "turn_context", "user_message"];

/// Content block types kept from Codex messages.
const CODEX_TEXT_BLOCKS: &[&str] = &["output_text", "input_text", "text", "summary_text"];

/// Codex dialect: `response_item` envelopes, bare messages, event_msg.
fn classify_codex(value: &Value) -> Option<RawRecord> {
    let at_ms = timestamp_ms(value);
    match value.get("type").and_then(Value::as_str)? {
        "response_item" => classify_codex_payload(value.get("payload")?, at_ms),
        "message" => classify_codex_message(value, at_ms),
        "event_msg" => {
            let payload = value.get("payload")?;
            let event_type = payload.get("type").and_then(Value::as_str).unwrap_or_default();
            if CODEX_EVENT_NOISE.contains(&event_type) {
                return None;
            }
            let message = payload.get("message").and_then(Value::as_str)?;
            Some(RawRecord::AssistantText { text: message.to_string(), at_ms })
        }
        "function_call" => Some(RawRecord::AssistantToolUse { at_ms }),
        // session_meta, function_call_output, reasoning: dropped.
        _ => None,
    }
}

fn classify_codex_payload(payload: &Value, at_ms: Option<u64>) -> Option<RawRecord> {
    match payload.get("type").and_then(Value::as_str)? {
        "message" => classify_codex_message(payload, at_ms),
        "function_call" => Some(RawRecord::AssistantToolUse { at_ms }),
        _ => None,
    }
}

fn classify_codex_message(message: &Value, at_ms: Option<u64>) -> Option<RawRecord> {
    let blocks = message.get("content")?.as_array()?;
    let texts: Vec<&str> = blocks
        .iter()
        .filter(|block| {
            block
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| CODEX_TEXT_BLOCKS.contains(&t))
        })
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        return None;
    }
    let text = texts.join("\n");
    let is_user = message.get("role").and_then(Value::as_str) == Some("user");
    if is_user {
        if is_noise_message(&text) {
            return None;
        }
        Some(RawRecord::UserPrompt { text, at_ms })
    } else {
        Some(RawRecord::AssistantText { text, at_ms })
    }
}

/// Turn classified records into the final entry list: strip noise,
/// prefix prompts, truncate, and collapse immediate duplicates.
pub(super) fn to_entries(records: Vec<RawRecord>, max_length: usize) -> Vec<DigestEntry> {
    let mut entries: Vec<DigestEntry> = Vec::new();
    for record in records {
        let (kind, raw, at_ms) = match record {
            RawRecord::AssistantText { text, at_ms } => (EntryKind::Assistant, text, at_ms),
            RawRecord::UserPrompt { text, at_ms } => {
                (EntryKind::User, format!("[PROMPT] {text}"), at_ms)
            }
            RawRecord::AssistantToolUse { .. } => continue,
        };
        let text = truncate_entry(&strip_noise(&raw), max_length);
        if text.is_empty() {
            continue;
        }
        if let Some(prev) = entries.last() {
            let close_in_time = match (prev.at_ms, at_ms) {
                (Some(a), Some(b)) => a.abs_diff(b) <= 1_000,
                _ => true,
            };
            if prev.kind == kind && prev.text == text && close_in_time {
                continue;
            }
        }
        entries.push(DigestEntry { kind, text, at_ms });
    }
    entries
}

/// Scan backwards for consecutive tool calls since the last text entry.
pub(super) fn detect_stuck(records: &[RawRecord], now_ms: u64) -> Option<StuckInfo> {
    let mut tool_calls = 0u32;
    let mut last_text_at_ms = None;
    let mut found_text = false;
    for record in records.iter().rev() {
        match record {
            RawRecord::AssistantToolUse { .. } => tool_calls += 1,
            RawRecord::AssistantText { at_ms, .. } | RawRecord::UserPrompt { at_ms, .. } => {
                found_text = true;
                last_text_at_ms = *at_ms;
                break;
            }
        }
    }

    if tool_calls <= STUCK_TOOL_CALL_THRESHOLD {
        return None;
    }
    let text_is_stale = match (found_text, last_text_at_ms) {
        (false, _) => true,
        (true, Some(at_ms)) => now_ms.saturating_sub(at_ms) > STUCK_TEXT_STALE_MS,
        // A text entry without a timestamp cannot be judged stale.
        (true, None) => false,
    };
    if !text_is_stale {
        return None;
    }
    Some(StuckInfo {
        tool_calls_since_last_text: tool_calls,
        last_text_at_ms,
        warning: format!("{tool_calls} tool calls since the last text output"),
    })
}

/// Tags whose content is infrastructure chatter, not conversation.
const NOISE_TAG_PREFIXES: &[&str] = &["system-reminder", "local-command", "teammate-message"];

/// A message that is nothing but a noise tag from its first character.
fn is_noise_message(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed
        .strip_prefix('<')
        .is_some_and(|rest| NOISE_TAG_PREFIXES.iter().any(|tag| rest.starts_with(tag)))
}

/// Remove embedded noise-tag spans from kept text.
fn strip_noise(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let open = NOISE_TAG_PREFIXES
            .iter()
            .filter_map(|tag| rest.find(&format!("<{tag}")).map(|at| (at, *tag)))
            .min_by_key(|(at, _)| *at);
        let Some((at, tag)) = open else {
            break;
        };
        out.push_str(&rest[..at]);
        let after_open = &rest[at..];
        let close = after_open.find(&format!("</{tag}"));
        match close.and_then(|c| after_open[c..].find('>').map(|gt| c + gt + 1)) {
            Some(end) => rest = &after_open[end..],
            // Unterminated tag: everything after it is noise.
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// First sentence, capped at `max_length` characters; `0` keeps the full
/// (noise-stripped) text.
fn truncate_entry(text: &str, max_length: usize) -> String {
    let text = text.trim();
    if max_length == 0 {
        return text.to_string();
    }

    let mut cut = false;
    let mut kept = match sentence_end(text) {
        Some(end) if end < text.len() => {
            cut = true;
            &text[..end]
        }
        _ => text,
    };

    let mut char_count = 0;
    for (offset, _) in kept.char_indices() {
        if char_count == max_length {
            kept = &kept[..offset];
            cut = true;
            break;
        }
        char_count += 1;
    }

    let mut out = kept.trim_end().to_string();
    if cut {
        out.push('…');
    }
    out
}

/// Byte offset just past the first sentence terminator, if one exists
/// before the end of the text.
fn sentence_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'\n' => return Some(i),
            b'.' | b'!' | b'?' => {
                if bytes.get(i + 1).is_none_or(|next| next.is_ascii_whitespace()) {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
