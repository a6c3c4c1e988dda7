//! Gemini CLI output parsing
//!
//! Both parsers degrade to literal text instead of failing: whatever the
//! CLI prints, the caller gets a string back.

use serde_json::{Map, Value};

/// Keys checked, in order, on a `--output-format json` object
const ANSWER_KEYS: [&str; 3] = ["response", "text", "content"];

/// `type` values of stream events that carry answer text
const TEXT_EVENT_KINDS: [&str; 4] = ["content", "text", "chunk", "message"];

/// Keys checked, in order, on a text-bearing stream event
const EVENT_TEXT_KEYS: [&str; 3] = ["value", "text", "content"];

/// Keys that may hold the native session id on an `init` event
const SESSION_ID_KEYS: [&str; 2] = ["session_id", "sessionId"];

/// Answer text and native session id recovered from a `stream-json` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamReply {
    pub text: String,
    pub session_id: Option<String>,
}

/// Extract the answer from single-object JSON output.
///
/// Non-JSON output, non-object JSON, and objects without a usable answer
/// key all come back as the trimmed raw output.
pub fn parse_json_output(output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(output) {
        Ok(Value::Object(map)) => {
            first_non_empty(&map, &ANSWER_KEYS).unwrap_or_else(|| output.to_string())
        }
        _ => output.to_string(),
    }
}

/// Parse JSONL `stream-json` output.
///
/// Lines are handled independently. A line that is not JSON and does not
/// start with `{` is kept as literal text; other malformed lines are
/// dropped.
pub fn parse_stream_json(output: &str) -> StreamReply {
    let mut reply = StreamReply::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(event)) => event,
            Ok(_) => continue,
            Err(_) => {
                if !line.starts_with('{') {
                    reply.text.push_str(line);
                }
                continue;
            }
        };

        let kind = event.get("type").and_then(Value::as_str).unwrap_or("");
        if kind == "init" {
            if let Some(id) = first_non_empty(&event, &SESSION_ID_KEYS) {
                reply.session_id = Some(id);
            }
        } else if TEXT_EVENT_KINDS.contains(&kind) && !is_prompt_echo(&event) {
            if let Some(text) = first_non_empty(&event, &EVENT_TEXT_KEYS) {
                reply.text.push_str(&text);
            }
        }
    }

    reply
}

// The CLI replays the submitted prompt as a `message` event with role `user`.
fn is_prompt_echo(event: &Map<String, Value>) -> bool {
    event.get("role").and_then(Value::as_str) == Some("user")
}

fn first_non_empty(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
