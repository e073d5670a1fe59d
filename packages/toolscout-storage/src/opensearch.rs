//! Lexical tool index over the OpenSearch REST API.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Value, json};

use crate::{
	Error, Result,
	models::{KeywordHit, Tool},
};

/// Boosted fields for `multi_match`. Order matters only for readability.
pub const SEARCH_FIELDS: [&str; 4] = ["name^3", "description^2", "category", "tags"];
pub const TIE_BREAKER: f64 = 0.3;
pub const TOTAL_FIELDS_LIMIT: u32 = 2_000;

/// Fields a usable index must map.
const REQUIRED_FIELDS: [&str; 5] = ["name", "description", "category", "tags", "id"];

pub struct OpenSearchIndex {
	client: Client,
	base_url: Url,
	index: String,
	username: Option<String>,
	password: Option<String>,
	max_result_window: u32,
}
impl OpenSearchIndex {
	pub fn new(cfg: &toolscout_config::OpenSearch) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let base_url = Url::parse(&cfg.url).map_err(|err| {
			Error::InvalidArgument(format!("storage.opensearch.url is invalid: {err}."))
		})?;

		Ok(Self {
			client,
			base_url,
			index: cfg.index.clone(),
			username: cfg.username.clone(),
			password: cfg.password.clone(),
			max_result_window: cfg.max_result_window,
		})
	}

	pub fn index_name(&self) -> &str {
		&self.index
	}

	/// Weighted multi-field match, most relevant first. At most `max_result_window` hits are
	/// requested whatever `limit` says.
	pub async fn search(&self, text: &str, limit: u32) -> Result<Vec<KeywordHit>> {
		if limit > self.max_result_window {
			tracing::debug!(
				limit,
				max_result_window = self.max_result_window,
				"Clamping keyword search size."
			);
		}

		let body = build_search_body(text, limit, self.max_result_window);
		let res = self.request(Method::POST, &["_search"])?.json(&body).send().await?;
		let json: Value = check(res).await?.json().await?;

		parse_search_response(json)
	}

	pub async fn index_tool(&self, tool: &Tool) -> Result<()> {
		if tool.id.trim().is_empty() {
			return Err(Error::InvalidArgument("Tool id must be non-empty.".to_string()));
		}

		let res = self
			.request(Method::PUT, &["_doc", tool.id.as_str()])?
			.query(&[("refresh", "wait_for")])
			.json(tool)
			.send()
			.await?;

		check(res).await?;

		Ok(())
	}

	/// Returns whether a document was removed. A missing document is not an error.
	pub async fn delete_tool(&self, id: &str) -> Result<bool> {
		let res = self
			.request(Method::DELETE, &["_doc", id])?
			.query(&[("refresh", "wait_for")])
			.send()
			.await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(false);
		}

		check(res).await?;

		Ok(true)
	}

	/// Creates the index with the tool mapping, or pushes settings and mapping onto an existing
	/// one.
	pub async fn ensure_settings(&self) -> Result<()> {
		let res = self.request(Method::HEAD, &[])?.send().await?;

		if res.status() == StatusCode::NOT_FOUND {
			let body = json!({ "settings": index_settings(), "mappings": index_mappings() });
			let res = self.request(Method::PUT, &[])?.json(&body).send().await?;

			check(res).await?;

			tracing::info!(index = %self.index, "Created keyword index.");

			return Ok(());
		}

		check(res).await?;

		let res = self.request(Method::PUT, &["_settings"])?.json(&index_settings()).send().await?;

		check(res).await?;

		let res = self.request(Method::PUT, &["_mapping"])?.json(&index_mappings()).send().await?;

		check(res).await?;

		tracing::info!(index = %self.index, "Updated keyword index settings.");

		Ok(())
	}

	/// Mapped fields the index is missing. Empty when the index is usable as is.
	pub async fn verify_settings(&self) -> Result<Vec<String>> {
		let res = self.request(Method::GET, &["_mapping"])?.send().await?;
		let json: Value = check(res).await?.json().await?;

		Ok(missing_mapped_fields(&json))
	}

	fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| {
				Error::InvalidArgument("storage.opensearch.url cannot be a base URL.".to_string())
			})?
			.pop_if_empty()
			.push(&self.index)
			.extend(segments);

		let builder = self.client.request(method, url);

		Ok(match self.username.as_deref() {
			Some(username) => builder.basic_auth(username, self.password.as_deref()),
			None => builder,
		})
	}
}

pub fn build_search_body(text: &str, limit: u32, max_result_window: u32) -> Value {
	json!({
		"size": limit.min(max_result_window),
		"query": {
			"multi_match": {
				"query": text,
				"type": "best_fields",
				"fields": SEARCH_FIELDS,
				"tie_breaker": TIE_BREAKER,
			}
		}
	})
}

pub fn parse_search_response(json: Value) -> Result<Vec<KeywordHit>> {
	let hits = json
		.get("hits")
		.and_then(|hits| hits.get("hits"))
		.and_then(Value::as_array)
		.ok_or_else(|| Error::KeywordIndex {
			status: 200,
			message: "Search response is missing hits.hits.".to_string(),
		})?;
	let mut out = Vec::with_capacity(hits.len());

	for hit in hits {
		let doc_id = hit.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
		let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);
		let mut source = hit.get("_source").cloned().ok_or_else(|| Error::Corrupted {
			id: doc_id.clone(),
			message: "Keyword hit has no _source.".to_string(),
		})?;

		if let Some(map) = source.as_object_mut()
			&& !map.contains_key("id")
		{
			map.insert("id".to_string(), Value::String(doc_id.clone()));
		}

		let tool: Tool = serde_json::from_value(source).map_err(|err| Error::Corrupted {
			id: doc_id.clone(),
			message: format!("Keyword document does not describe a tool: {err}."),
		})?;

		out.push(KeywordHit { tool, score });
	}

	Ok(out)
}

pub fn index_settings() -> Value {
	json!({ "index": { "mapping": { "total_fields": { "limit": TOTAL_FIELDS_LIMIT } } } })
}

pub fn index_mappings() -> Value {
	json!({
		"properties": {
			"id": { "type": "keyword" },
			"name": { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
			"description": { "type": "text" },
			"category": { "type": "keyword" },
			"tags": { "type": "keyword" },
			"version": { "type": "keyword" },
			"input_schema": { "type": "object", "enabled": false },
			"output_schema": { "type": "object", "enabled": false },
			"created_at": { "type": "date" },
			"updated_at": { "type": "date" },
		}
	})
}

/// Reads `GET <index>/_mapping`, which is keyed by the concrete index name.
pub fn missing_mapped_fields(json: &Value) -> Vec<String> {
	let properties = json
		.as_object()
		.and_then(|indexes| indexes.values().next())
		.and_then(|index| index.get("mappings"))
		.and_then(|mappings| mappings.get("properties"))
		.and_then(Value::as_object);

	REQUIRED_FIELDS
		.iter()
		.filter(|field| properties.is_none_or(|props| !props.contains_key(**field)))
		.map(|field| field.to_string())
		.collect()
}

async fn check(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let message = res.text().await.unwrap_or_default();

	Err(Error::KeywordIndex { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn search_body_uses_boosted_best_fields() {
		let body = build_search_body("convert pdf", 20, 10_000);
		let multi_match = &body["query"]["multi_match"];

		assert_eq!(body["size"], 20);
		assert_eq!(multi_match["query"], "convert pdf");
		assert_eq!(multi_match["type"], "best_fields");
		assert_eq!(multi_match["fields"][0], "name^3");
		assert_eq!(multi_match["fields"][1], "description^2");
		assert_eq!(multi_match["tie_breaker"], 0.3);
	}

	#[test]
	fn search_size_is_capped_by_the_result_window() {
		let body = build_search_body("find files", 12_000, 10_000);

		assert_eq!(body["size"], 10_000);

		let body = build_search_body("find files", 8, 10_000);

		assert_eq!(body["size"], 8);
	}

	#[test]
	fn parses_hits_and_falls_back_to_document_id() {
		let json = json!({
			"hits": {
				"hits": [
					{
						"_id": "pdf-convert",
						"_score": 7.5,
						"_source": {
							"name": "PDF converter",
							"description": "Converts PDF files.",
							"category": "documents",
							"tags": ["pdf"],
							"created_at": "2024-01-02T03:04:05Z",
							"updated_at": "2024-01-02T03:04:05Z"
						}
					}
				]
			}
		});
		let hits = parse_search_response(json).expect("parse failed");

		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].tool.id, "pdf-convert");
		assert_eq!(hits[0].tool.tags, vec!["pdf".to_string()]);
		assert!((hits[0].score - 7.5).abs() < f64::EPSILON);
		assert!(hits[0].tool.input_schema.is_object());
	}

	#[test]
	fn unusable_source_is_corruption() {
		let json = json!({
			"hits": { "hits": [{ "_id": "x", "_score": 1.0, "_source": { "name": 3 } }] }
		});

		assert!(matches!(parse_search_response(json), Err(Error::Corrupted { .. })));
	}

	#[test]
	fn reports_missing_mapped_fields() {
		let json = json!({
			"tools-v2": {
				"mappings": {
					"properties": {
						"id": { "type": "keyword" },
						"name": { "type": "text" },
						"description": { "type": "text" }
					}
				}
			}
		});

		assert_eq!(missing_mapped_fields(&json), vec!["category".to_string(), "tags".to_string()]);
		assert_eq!(missing_mapped_fields(&json!({})).len(), REQUIRED_FIELDS.len());
	}

	#[test]
	fn full_mapping_passes_verification() {
		let json = json!({ "tools": { "mappings": index_mappings() } });

		assert!(missing_mapped_fields(&json).is_empty());
	}
}
