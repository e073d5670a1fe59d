use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub opensearch: OpenSearch,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Width of the `tools.embedding` column. Wider query embeddings are reduced to fit.
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpenSearch {
	pub url: String,
	pub index: String,
	pub username: Option<String>,
	pub password: Option<String>,
	pub timeout_ms: u64,
	/// Upper bound on the hits one search asks for. Must not exceed the index's
	/// `index.max_result_window`.
	#[serde(default = "default_max_result_window")]
	pub max_result_window: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	/// Ask the backend for `response_format: json_object`. Not every OpenAI-compatible server
	/// honours it, so completions are still parsed defensively.
	#[serde(default)]
	pub json_mode: bool,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	#[serde(default = "default_min_score")]
	pub default_min_score: f32,
	#[serde(default = "default_candidate_multiplier")]
	pub candidate_multiplier: u32,
	/// Deadline for a whole pipeline run. Zero disables it.
	#[serde(default)]
	pub timeout_ms: u64,
	#[serde(default)]
	pub verify_keyword_index: bool,
	#[serde(default)]
	pub fusion: SearchFusion,
	#[serde(default)]
	pub understanding: SearchUnderstanding,
	#[serde(default)]
	pub rerank: SearchRerank,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_top_k: default_top_k(),
			default_min_score: default_min_score(),
			candidate_multiplier: default_candidate_multiplier(),
			timeout_ms: 0,
			verify_keyword_index: false,
			fusion: SearchFusion::default(),
			understanding: SearchUnderstanding::default(),
			rerank: SearchRerank::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchFusion {
	pub vector_weight: f32,
	pub keyword_weight: f32,
}
impl Default for SearchFusion {
	fn default() -> Self {
		Self { vector_weight: 0.7, keyword_weight: 0.3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchUnderstanding {
	pub enabled: bool,
}
impl Default for SearchUnderstanding {
	fn default() -> Self {
		Self { enabled: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchRerank {
	pub enabled: bool,
}
impl Default for SearchRerank {
	fn default() -> Self {
		Self { enabled: true }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_result_window() -> u32 {
	10_000
}

fn default_top_k() -> u32 {
	10
}

fn default_min_score() -> f32 {
	0.3
}

fn default_candidate_multiplier() -> u32 {
	2
}
