pub mod indexing;
pub mod rerank;
pub mod retrieval;
pub mod search;
pub mod understanding;

mod error;

pub use error::{Error, Result};
pub use indexing::{DeleteReport, KeywordIndexStatus};
pub use search::{SearchRequest, SearchResponse, SearchResult};
pub use understanding::QueryUnderstanding;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use toolscout_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use toolscout_providers::{chat, embedding};
use toolscout_storage::{
	db::Db,
	models::{KeywordHit, Tool, VectorHit},
	opensearch::OpenSearchIndex,
	tools,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

/// Dense nearest-neighbour store keyed by tool id.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn query_nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>>;

	fn upsert_tool<'a>(&'a self, tool: &'a Tool, embedding: &'a [f32]) -> BoxFuture<'a, Result<()>>;

	fn delete_tool<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>>;
}

/// Lexical store keyed by tool id.
pub trait KeywordIndex
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, text: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<KeywordHit>>>;

	fn index_tool<'a>(&'a self, tool: &'a Tool) -> BoxFuture<'a, Result<()>>;

	fn delete_tool<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>>;

	fn ensure_settings(&self) -> BoxFuture<'_, Result<()>>;

	fn verify_settings(&self) -> BoxFuture<'_, Result<Vec<String>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), chat: provider }
	}
}

#[derive(Clone)]
pub struct Backends {
	pub vector: Arc<dyn VectorIndex>,
	pub keyword: Arc<dyn KeywordIndex>,
}
impl Backends {
	pub fn new(vector: Arc<dyn VectorIndex>, keyword: Arc<dyn KeywordIndex>) -> Self {
		Self { vector, keyword }
	}
}

pub struct ToolSearchService {
	pub cfg: Config,
	pub providers: Providers,
	pub backends: Backends,
}
impl ToolSearchService {
	pub fn new(cfg: Config, db: Db, keyword: OpenSearchIndex) -> Self {
		Self::with_parts(
			cfg,
			Providers::default(),
			Backends::new(Arc::new(db), Arc::new(keyword)),
		)
	}

	pub fn with_parts(cfg: Config, providers: Providers, backends: Backends) -> Self {
		Self { cfg, providers, backends }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(chat::complete(cfg, messages).await?) })
	}
}

impl VectorIndex for Db {
	fn query_nearest<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(async move { Ok(tools::query_nearest(self, embedding, limit).await?) })
	}

	fn upsert_tool<'a>(
		&'a self,
		tool: &'a Tool,
		embedding: &'a [f32],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(tools::upsert_tool(self, tool, embedding).await?) })
	}

	fn delete_tool<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(tools::delete_tool(self, id).await?) })
	}
}

impl KeywordIndex for OpenSearchIndex {
	fn search<'a>(&'a self, text: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<KeywordHit>>> {
		Box::pin(async move { Ok(OpenSearchIndex::search(self, text, limit).await?) })
	}

	fn index_tool<'a>(&'a self, tool: &'a Tool) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(OpenSearchIndex::index_tool(self, tool).await?) })
	}

	fn delete_tool<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(OpenSearchIndex::delete_tool(self, id).await?) })
	}

	fn ensure_settings(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(OpenSearchIndex::ensure_settings(self).await?) })
	}

	fn verify_settings(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move { Ok(OpenSearchIndex::verify_settings(self).await?) })
	}
}
