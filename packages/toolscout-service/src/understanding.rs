use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Result, ToolSearchService};
use toolscout_domain::completion::{self, Recovered};

const UNDERSTANDING_SYSTEM_PROMPT: &str = "You are a query understanding system for a tool \
search service. Respond with a single JSON object only, wrapped in ```json and ``` markers. \
Do not add explanations, comments, or trailing commas. Use double quotes for every string.";

/// What the language model made of a query. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryUnderstanding {
	pub intent: String,
	pub expanded_terms: Vec<String>,
	pub sub_queries: Vec<String>,
	/// Same shape as request filters. Validated leniently by the pipeline.
	pub filters: Map<String, Value>,
}
impl QueryUnderstanding {
	/// Reads fields leniently: a field with the wrong type is treated as absent.
	pub fn from_object(object: &Map<String, Value>) -> Self {
		let parameters = object.get("parameters").and_then(Value::as_object);
		let intent = object
			.get("intent")
			.and_then(Value::as_str)
			.map(|intent| intent.trim().to_string())
			.unwrap_or_default();
		let mut expanded_terms = string_list(object.get("expanded_terms"));

		if expanded_terms.is_empty() {
			expanded_terms = string_list(parameters.and_then(|params| params.get("keywords")));
		}

		let sub_queries = string_list(object.get("sub_queries"));
		let filters = object
			.get("filters")
			.and_then(Value::as_object)
			.or_else(|| {
				parameters.and_then(|params| params.get("filters")).and_then(Value::as_object)
			})
			.cloned()
			.unwrap_or_default();

		Self { intent, expanded_terms, sub_queries, filters }
	}

	pub fn is_empty(&self) -> bool {
		self.intent.is_empty()
			&& self.expanded_terms.is_empty()
			&& self.sub_queries.is_empty()
			&& self.filters.is_empty()
	}

	/// `[query] ++ expanded_terms ++ sub_queries`, duplicates kept.
	pub fn expand(&self, query: &str) -> Vec<String> {
		let mut out = Vec::with_capacity(1 + self.expanded_terms.len() + self.sub_queries.len());

		out.push(query.to_string());
		out.extend(self.expanded_terms.iter().cloned());
		out.extend(self.sub_queries.iter().cloned());

		out
	}
}

impl ToolSearchService {
	/// Fails only when the language model cannot be reached. Unusable completions yield an empty
	/// understanding.
	pub async fn understand_query(&self, query: &str) -> Result<QueryUnderstanding> {
		let messages = build_understanding_messages(query);
		let completion = self.providers.chat.complete(&self.cfg.providers.llm, &messages).await?;

		Ok(parse_understanding(&completion))
	}

	pub async fn expand_query(&self, query: &str) -> Result<Vec<String>> {
		Ok(self.understand_query(query).await?.expand(query))
	}
}

pub fn build_understanding_messages(query: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"intent": "string",
		"expanded_terms": ["string"],
		"sub_queries": ["string"],
		"filters": { "category": "string", "tags": ["string"] }
	});
	let user_prompt = format!(
		"Return JSON matching this schema:\n{schema}\nOnly include filters the query states \
explicitly.\nQuery:\n{query}"
	);

	vec![
		serde_json::json!({ "role": "system", "content": UNDERSTANDING_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

pub fn parse_understanding(completion: &str) -> QueryUnderstanding {
	match completion::parse_json_object(completion) {
		Recovered::Object(object) => QueryUnderstanding::from_object(&object),
		Recovered::Fallback(_) => {
			tracing::warn!(
				completion_len = completion.len(),
				"Query understanding completion has no JSON object. Using an empty understanding."
			);

			QueryUnderstanding::default()
		},
	}
}

fn string_list(value: Option<&Value>) -> Vec<String> {
	let Some(items) = value.and_then(Value::as_array) else {
		return Vec::new();
	};

	items
		.iter()
		.filter_map(Value::as_str)
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}
