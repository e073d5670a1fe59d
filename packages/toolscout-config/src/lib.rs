mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, OpenSearch, Postgres, Providers, Search,
	SearchFusion, SearchRerank, SearchUnderstanding, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config =
		toml::from_str(&raw).map_err(|err| Error::Parse { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.opensearch.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.opensearch.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.opensearch.index.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.opensearch.index must be non-empty.".to_string(),
		});
	}
	if cfg.storage.opensearch.password.is_some() && cfg.storage.opensearch.username.is_none() {
		return Err(Error::Validation {
			message: "storage.opensearch.password requires storage.opensearch.username."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	if cfg.storage.opensearch.max_result_window == 0 {
		return Err(Error::Validation {
			message: "storage.opensearch.max_result_window must be greater than zero.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("storage.opensearch.timeout_ms", cfg.storage.opensearch.timeout_ms),
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.llm.timeout_ms", cfg.providers.llm.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "search.candidate_multiplier must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.default_min_score.is_finite() {
		return Err(Error::Validation {
			message: "search.default_min_score must be a finite number.".to_string(),
		});
	}

	let fusion = &cfg.search.fusion;

	for (label, weight) in [
		("search.fusion.vector_weight", fusion.vector_weight),
		("search.fusion.keyword_weight", fusion.keyword_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if fusion.vector_weight + fusion.keyword_weight <= 0.0 {
		return Err(Error::Validation {
			message: "search.fusion weights must not both be zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let opensearch = &mut cfg.storage.opensearch;

	if opensearch.username.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
		opensearch.username = None;
	}
	if opensearch.password.as_deref().map(|password| password.is_empty()).unwrap_or(false) {
		opensearch.password = None;
	}

	opensearch.url = opensearch.url.trim_end_matches('/').to_string();
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
	cfg.providers.llm.api_base = cfg.providers.llm.api_base.trim_end_matches('/').to_string();
}
