//! Recovery of a JSON object from a free-text language-model completion.
//!
//! Recovery runs in two stages. [`extract_json_candidates`] strips reasoning segments and
//! proposes candidate spans (a fenced block first, then the outermost brace span);
//! [`parse_json_object`] accepts the first candidate that parses as a JSON object and otherwise
//! yields an empty object.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

const FENCE: &str = "```";

static REASONING_BLOCK: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").ok());

/// Outcome of recovering a JSON object from a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovered {
	Object(Map<String, Value>),
	/// No candidate span parsed as a JSON object. Carries the empty fallback.
	Fallback(Map<String, Value>),
}
impl Recovered {
	pub fn is_fallback(&self) -> bool {
		matches!(self, Self::Fallback(_))
	}

	pub fn into_map(self) -> Map<String, Value> {
		match self {
			Self::Object(map) | Self::Fallback(map) => map,
		}
	}
}

/// Removes `<think>…</think>` segments. A completion whose opening tag was cut off by the server
/// template loses everything up to the dangling `</think>`.
pub fn strip_reasoning(text: &str) -> String {
	let stripped = match REASONING_BLOCK.as_ref() {
		Some(re) => re.replace_all(text, ""),
		None => text.into(),
	};

	match stripped.rfind("</think>") {
		Some(end) => stripped[end + "</think>".len()..].to_string(),
		None => stripped.into_owned(),
	}
}

/// Candidate spans in priority order: fenced block contents, then the first `{` to the last `}`.
pub fn extract_json_candidates(completion: &str) -> Vec<String> {
	let cleaned = strip_reasoning(completion);
	let mut candidates = Vec::new();

	if let Some(fenced) = fenced_block(&cleaned) {
		candidates.push(fenced.to_string());
	}
	if let Some(span) = brace_span(&cleaned)
		&& !candidates.iter().any(|candidate| candidate == span)
	{
		candidates.push(span.to_string());
	}

	candidates
}

pub fn parse_json_object(completion: &str) -> Recovered {
	for candidate in extract_json_candidates(completion) {
		if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&candidate) {
			return Recovered::Object(map);
		}
	}

	Recovered::Fallback(Map::new())
}

fn fenced_block(text: &str) -> Option<&str> {
	let open = text.find(FENCE)?;
	let after_fence = &text[open + FENCE.len()..];
	// The info string ("json", "JSON", ...) runs to the end of the opening line.
	let body_start = match after_fence.find('\n') {
		Some(newline) if !after_fence[..newline].contains('{') => newline + 1,
		_ => {
			let info = after_fence.trim_start_matches(|c: char| c.is_ascii_alphabetic());

			after_fence.len() - info.len()
		},
	};
	let body = &after_fence[body_start..];
	let body = match body.find(FENCE) {
		Some(close) => &body[..close],
		None => body,
	};
	let trimmed = body.trim();

	if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn brace_span(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	if end < start {
		return None;
	}

	Some(&text[start..=end])
}
