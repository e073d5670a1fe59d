use crate::{Error, Result, SearchResult, ToolSearchService, search::ranking};
use toolscout_domain::reduction;

impl ToolSearchService {
	/// Embeds `text` and fits it to the configured index width.
	pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let embeddings = self.providers.embedding.embed(cfg, &[text.to_string()]).await?;
		let Some(vec) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vec.is_empty() {
			return Err(Error::Provider {
				message: "Embedding provider returned an empty vector.".to_string(),
			});
		}

		let width = self.cfg.storage.postgres.vector_dim as usize;

		if vec.len() < width {
			return Err(Error::Provider {
				message: format!(
					"Embedding width {} is narrower than storage.postgres.vector_dim {width}.",
					vec.len()
				),
			});
		}
		if vec.len() > width {
			tracing::debug!(from = vec.len(), to = width, "Reducing embedding width.");
		}

		Ok(reduction::reduce_dimensions(vec, width))
	}

	/// Nearest tools by cosine similarity (`1 - distance`), best first.
	pub async fn vector_search(&self, query: &str, k: u32) -> Result<Vec<SearchResult>> {
		let embedding = self.embed_text(query).await?;
		let hits = self.backends.vector.query_nearest(&embedding, k).await?;
		let mut results: Vec<SearchResult> = hits
			.into_iter()
			.map(|hit| SearchResult::from_vector(hit.tool, (1.0 - hit.distance) as f32))
			.collect();

		ranking::sort_by_score(&mut results);

		Ok(results)
	}

	/// Weighted lexical matches, most relevant first.
	pub async fn keyword_search(&self, query: &str, k: u32) -> Result<Vec<SearchResult>> {
		let hits = self.backends.keyword.search(query, k).await?;
		let mut results: Vec<SearchResult> = hits
			.into_iter()
			.map(|hit| SearchResult::from_keyword(hit.tool, hit.score as f32))
			.collect();

		ranking::sort_by_score(&mut results);

		Ok(results)
	}
}
