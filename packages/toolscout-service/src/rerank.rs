use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{Result, SearchResult, ToolSearchService, search::ranking};
use toolscout_domain::completion::{self, Recovered};

const RERANK_SYSTEM_PROMPT: &str = "You are a search result re-ranking system. Judge how well \
each result serves the query and return a JSON object with a new score between 0 and 1 and a \
one-sentence justification per result id.";

#[derive(Debug, Clone, PartialEq)]
struct Ranking {
	score: f32,
	justification: Option<String>,
	confidence: Option<f32>,
}

impl ToolSearchService {
	/// Rescores `candidates` with the language model and returns them best first.
	///
	/// Candidates the model does not mention keep their scores. An unusable completion leaves
	/// every score unchanged.
	pub async fn rerank(
		&self,
		query: &str,
		candidates: Vec<SearchResult>,
	) -> Result<Vec<SearchResult>> {
		if candidates.is_empty() {
			return Ok(candidates);
		}

		let messages = build_rerank_messages(query, &candidates);
		let completion = self.providers.chat.complete(&self.cfg.providers.llm, &messages).await?;
		let (reranked, applied) = apply_rerank_completion(candidates, &completion);

		tracing::info!(candidates = reranked.len(), applied, "Rerank finished.");

		Ok(reranked)
	}
}

pub fn build_rerank_messages(query: &str, candidates: &[SearchResult]) -> Vec<Value> {
	let docs: Vec<Value> = candidates
		.iter()
		.map(|candidate| {
			serde_json::json!({
				"id": candidate.tool.id,
				"name": candidate.tool.name,
				"description": candidate.tool.description,
				"category": candidate.tool.category,
				"tags": candidate.tool.tags,
				"score": candidate.score,
			})
		})
		.collect();
	let docs_text = Value::Array(docs).to_string();
	let user_prompt = format!(
		"Re-rank these search results for the query: {query:?}\n\nResults:\n{docs_text}\n\n\
Return JSON shaped like:\n\
{{\"rankings\": [{{\"id\": \"tool_id\", \"score\": 0.95, \"justification\": \"why it fits\"}}]}}"
	);

	vec![
		serde_json::json!({ "role": "system", "content": RERANK_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

/// Applies a rerank completion and returns the reordered candidates with the number of
/// candidates that received a new score.
pub fn apply_rerank_completion(
	mut candidates: Vec<SearchResult>,
	completion: &str,
) -> (Vec<SearchResult>, usize) {
	let rankings = match completion::parse_json_object(completion) {
		Recovered::Object(object) => parse_rankings(&object),
		Recovered::Fallback(_) => {
			tracing::warn!(
				completion_len = completion.len(),
				"Rerank completion has no JSON object. Keeping retrieval scores."
			);

			HashMap::new()
		},
	};
	let mut applied = 0;

	for candidate in &mut candidates {
		let Some(entry) = rankings.get(&candidate.tool.id) else {
			continue;
		};

		candidate.reranked_score = entry.score;
		candidate.score = entry.score;
		candidate.justification = entry.justification.clone();

		if let Some(confidence) = entry.confidence {
			candidate.confidence = confidence;
		}

		applied += 1;
	}

	ranking::sort_by_score(&mut candidates);

	(candidates, applied)
}

/// First entry per id wins. Entries without an id or a finite score are skipped.
fn parse_rankings(object: &Map<String, Value>) -> HashMap<String, Ranking> {
	let mut out = HashMap::new();
	let Some(entries) = object.get("rankings").and_then(Value::as_array) else {
		tracing::warn!("Rerank completion has no rankings array. Keeping retrieval scores.");

		return out;
	};

	for entry in entries {
		let Some(id) = entry.get("id").and_then(Value::as_str) else {
			continue;
		};
		let Some(score) = entry.get("score").and_then(Value::as_f64).filter(|s| s.is_finite())
		else {
			continue;
		};
		let justification = entry
			.get("justification")
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|text| !text.is_empty())
			.map(str::to_string);
		let confidence = entry
			.get("confidence")
			.and_then(Value::as_f64)
			.filter(|value| value.is_finite())
			.map(|value| value as f32);

		out.entry(id.to_string()).or_insert(Ranking {
			score: score as f32,
			justification,
			confidence,
		});
	}

	out
}
