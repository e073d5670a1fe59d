use serde_json::Value;

use crate::{Error, Result};

/// Runs one chat completion and returns the assistant message text.
pub async fn complete(
	cfg: &toolscout_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = build_request_body(cfg, messages);
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let content = parse_completion_response(json)?;

	tracing::debug!(
		provider_id = %cfg.provider_id,
		model = %cfg.model,
		content = %content,
		"Chat completion received."
	);

	Ok(content)
}

pub fn build_request_body(cfg: &toolscout_config::LlmProviderConfig, messages: &[Value]) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	if cfg.json_mode
		&& let Some(map) = body.as_object_mut()
	{
		map.insert("response_format".to_string(), serde_json::json!({ "type": "json_object" }));
	}

	body
}

pub fn parse_completion_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})?;

	if content.trim().is_empty() {
		return Err(Error::InvalidResponse {
			message: "Chat response content is empty.".to_string(),
		});
	}

	Ok(content.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_first_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "{\"intent\": \"search\"}" } },
				{ "message": { "role": "assistant", "content": "ignored" } }
			]
		});

		let content = parse_completion_response(json).expect("parse failed");

		assert_eq!(content, "{\"intent\": \"search\"}");
	}

	#[test]
	fn empty_content_is_an_error() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": "  " } }] });

		assert!(matches!(parse_completion_response(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn missing_choices_is_an_error() {
		assert!(parse_completion_response(serde_json::json!({ "error": "boom" })).is_err());
	}
}
