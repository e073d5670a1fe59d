pub mod ranking;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::{Error, QueryUnderstanding, Result, ToolSearchService};
use toolscout_domain::filter::ToolFilters;
use toolscout_storage::models::Tool;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub filters: Map<String, Value>,
	/// Non-positive values select `search.default_top_k`.
	#[serde(default)]
	pub top_k: i64,
	/// Non-positive or absent values select `search.default_min_score`.
	#[serde(default)]
	pub min_score: Option<f32>,
}
impl SearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), filters: Map::new(), top_k: 0, min_score: None }
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
	pub tool: Tool,
	/// Ordering score: fused retrieval score, or the rerank score once reranked.
	pub score: f32,
	pub vector_score: f32,
	pub keyword_score: f32,
	pub reranked_score: f32,
	pub confidence: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub justification: Option<String>,
}
impl SearchResult {
	pub fn from_vector(tool: Tool, similarity: f32) -> Self {
		Self {
			tool,
			score: similarity,
			vector_score: similarity,
			keyword_score: 0.0,
			reranked_score: 0.0,
			confidence: 0.0,
			justification: None,
		}
	}

	pub fn from_keyword(tool: Tool, relevance: f32) -> Self {
		Self {
			tool,
			score: relevance,
			vector_score: 0.0,
			keyword_score: relevance,
			reranked_score: 0.0,
			confidence: 0.0,
			justification: None,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub results: Vec<SearchResult>,
	pub total: usize,
	pub time_ms: u64,
}

impl ToolSearchService {
	/// Runs the full pipeline under the configured deadline.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let timeout_ms = self.cfg.search.timeout_ms;

		if timeout_ms == 0 {
			return self.run_pipeline(req).await;
		}

		match tokio::time::timeout(Duration::from_millis(timeout_ms), self.run_pipeline(req)).await
		{
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(timeout_ms, "Search deadline exceeded.");

				Err(Error::Cancelled { message: format!("Search exceeded {timeout_ms} ms.") })
			},
		}
	}

	/// Like [`Self::search`], returning as soon as `cancel` fires. In-flight backend calls are
	/// dropped.
	pub async fn search_with_cancel(
		&self,
		req: SearchRequest,
		cancel: &CancellationToken,
	) -> Result<SearchResponse> {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				tracing::info!("Search cancelled by caller.");

				Err(Error::Cancelled { message: "Search was cancelled by the caller.".to_string() })
			},
			result = self.search(req) => result,
		}
	}

	async fn run_pipeline(&self, req: SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let request_filters = ToolFilters::parse_strict(&req.filters)
			.map_err(|err| Error::InvalidRequest { message: err.to_string() })?;
		let search_cfg = &self.cfg.search;
		let top_k = resolve_top_k(req.top_k, search_cfg.default_top_k);
		let min_score = resolve_min_score(req.min_score, search_cfg.default_min_score);
		let candidate_k = candidate_k(top_k, search_cfg.candidate_multiplier);
		let understanding = if search_cfg.understanding.enabled {
			self.understand_query(query).await?
		} else {
			QueryUnderstanding::default()
		};
		let (understood_filters, skipped) = ToolFilters::parse_lenient(&understanding.filters);

		if !skipped.is_empty() {
			tracing::warn!(keys = ?skipped, "Ignoring unusable filters from query understanding.");
		}

		let filters = understood_filters.overridden_by(request_filters);
		let keyword_text = understanding.expand(query).join(" ");
		let (vector_hits, keyword_hits) = tokio::try_join!(
			self.vector_search(query, candidate_k),
			self.keyword_search(&keyword_text, candidate_k),
		)?;

		tracing::info!(
			vector_hits = vector_hits.len(),
			keyword_hits = keyword_hits.len(),
			candidate_k,
			"Retrieval finished."
		);

		let merged = ranking::merge_results(vector_hits, keyword_hits, &search_cfg.fusion);
		let merged_count = merged.len();
		let filtered = ranking::apply_filters(merged, &filters);
		let filtered_count = filtered.len();
		let reranked = if search_cfg.rerank.enabled {
			self.rerank(query, filtered).await?
		} else {
			filtered
		};
		let thresholded = ranking::apply_score_threshold(reranked, min_score);
		let results = ranking::truncate_top_k(thresholded, top_k as usize);
		let time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

		tracing::info!(
			merged = merged_count,
			filtered = filtered_count,
			returned = results.len(),
			top_k,
			min_score,
			time_ms,
			"Search finished."
		);

		Ok(SearchResponse { total: results.len(), results, time_ms })
	}
}

pub fn resolve_top_k(requested: i64, default_top_k: u32) -> u32 {
	if requested > 0 { u32::try_from(requested).unwrap_or(u32::MAX) } else { default_top_k }
}

pub fn resolve_min_score(requested: Option<f32>, default_min_score: f32) -> f32 {
	match requested {
		Some(value) if value.is_finite() && value > 0.0 => value,
		_ => default_min_score,
	}
}

/// Retrieval depth per source: room for fusion and rerank to reorder before truncation.
pub fn candidate_k(top_k: u32, multiplier: u32) -> u32 {
	top_k.saturating_mul(multiplier).max(1)
}
