use serde::Serialize;

use crate::{Error, Result, ToolSearchService};
use toolscout_storage::models::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
	pub vector_removed: bool,
	pub keyword_removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordIndexStatus {
	Ready,
	MissingFields(Vec<String>),
	Unreachable(String),
}

impl ToolSearchService {
	/// Embeds the description, then writes the tool to both indexes.
	pub async fn index_tool(&self, mut tool: Tool) -> Result<Tool> {
		tool.id = tool.id.trim().to_string();

		if tool.id.is_empty() {
			return Err(Error::InvalidRequest { message: "tool.id must be non-empty.".to_string() });
		}
		if tool.name.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "tool.name must be non-empty.".to_string(),
			});
		}
		if tool.description.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "tool.description must be non-empty.".to_string(),
			});
		}

		tool.tags.sort();
		tool.tags.dedup();

		let embedding = self.embed_text(&tool.description).await?;

		self.backends.vector.upsert_tool(&tool, &embedding).await?;
		self.backends.keyword.index_tool(&tool).await?;

		tracing::info!(tool_id = %tool.id, "Indexed tool.");

		Ok(tool)
	}

	/// Removes the tool from both indexes. Missing entries are not an error.
	pub async fn delete_tool(&self, id: &str) -> Result<DeleteReport> {
		let id = id.trim();

		if id.is_empty() {
			return Err(Error::InvalidRequest { message: "id must be non-empty.".to_string() });
		}

		let vector_removed = self.backends.vector.delete_tool(id).await?;
		let keyword_removed = self.backends.keyword.delete_tool(id).await?;

		tracing::info!(tool_id = %id, vector_removed, keyword_removed, "Deleted tool.");

		Ok(DeleteReport { vector_removed, keyword_removed })
	}

	pub async fn ensure_keyword_index(&self) -> Result<()> {
		self.backends.keyword.ensure_settings().await
	}

	/// Probes the keyword index mapping. Problems are logged and reported, never raised.
	pub async fn verify_keyword_index(&self) -> KeywordIndexStatus {
		match self.backends.keyword.verify_settings().await {
			Ok(missing) if missing.is_empty() => KeywordIndexStatus::Ready,
			Ok(missing) => {
				tracing::warn!(
					missing_fields = ?missing,
					"Keyword index mapping is incomplete. Run the keyword index ensure endpoint."
				);

				KeywordIndexStatus::MissingFields(missing)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Keyword index verification failed.");

				KeywordIndexStatus::Unreachable(err.to_string())
			},
		}
	}
}
