use std::collections::HashMap;

use toolscout_config::SearchFusion;
use toolscout_domain::filter::ToolFilters;

use crate::search::SearchResult;

/// Deduplicates by tool id, seeded from vector hits, and returns the set best first.
///
/// A tool found by both sources is scored with the fusion weights. A tool found by one source
/// keeps that source's score.
pub fn merge_results(
	vector: Vec<SearchResult>,
	keyword: Vec<SearchResult>,
	fusion: &SearchFusion,
) -> Vec<SearchResult> {
	let mut merged: Vec<SearchResult> = Vec::with_capacity(vector.len() + keyword.len());
	let mut by_id: HashMap<String, usize> = HashMap::new();
	let mut keyword_applied: Vec<bool> = Vec::new();

	for hit in vector {
		if by_id.contains_key(&hit.tool.id) {
			continue;
		}

		by_id.insert(hit.tool.id.clone(), merged.len());
		merged.push(hit);
		keyword_applied.push(false);
	}

	for hit in keyword {
		match by_id.get(&hit.tool.id).copied() {
			Some(index) => {
				if keyword_applied[index] {
					continue;
				}

				let existing = &mut merged[index];

				existing.keyword_score = hit.keyword_score;
				existing.score = fusion.vector_weight * existing.vector_score
					+ fusion.keyword_weight * existing.keyword_score;
				keyword_applied[index] = true;
			},
			None => {
				by_id.insert(hit.tool.id.clone(), merged.len());
				merged.push(SearchResult { vector_score: 0.0, score: hit.keyword_score, ..hit });
				keyword_applied.push(true);
			},
		}
	}

	sort_by_score(&mut merged);

	merged
}

/// Keeps results that satisfy every filter.
pub fn apply_filters(results: Vec<SearchResult>, filters: &ToolFilters) -> Vec<SearchResult> {
	if filters.is_empty() {
		return results;
	}

	results
		.into_iter()
		.filter(|result| filters.matches(&result.tool.category, &result.tool.tags))
		.collect()
}

pub fn apply_score_threshold(results: Vec<SearchResult>, min_score: f32) -> Vec<SearchResult> {
	results.into_iter().filter(|result| result.score >= min_score).collect()
}

pub fn truncate_top_k(mut results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
	results.truncate(top_k);

	results
}

/// Stable, descending by `score`.
pub fn sort_by_score(results: &mut [SearchResult]) {
	results.sort_by(|a, b| b.score.total_cmp(&a.score));
}
