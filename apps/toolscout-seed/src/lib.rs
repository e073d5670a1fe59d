use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use toolscout_service::ToolSearchService;
use toolscout_storage::{db::Db, models::Tool, opensearch::OpenSearchIndex};

#[derive(Debug, Parser)]
#[command(
	version = toolscout_cli::VERSION,
	rename_all = "kebab",
	styles = toolscout_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub data: PathBuf,
}

/// Seed file layout: `{"tools": [...]}`. Missing timestamps are stamped with the load time.
#[derive(Debug, Deserialize)]
pub struct SeedData {
	pub tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct SeedReport {
	index: String,
	seeded: usize,
	ids: Vec<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = toolscout_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let seed = load_seed(&args.data)?;
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema(config.storage.postgres.vector_dim).await?;

	let keyword = OpenSearchIndex::new(&config.storage.opensearch)?;
	let index = keyword.index_name().to_string();
	let service = ToolSearchService::new(config, db, keyword);

	service.ensure_keyword_index().await?;

	let mut ids = Vec::with_capacity(seed.tools.len());

	for tool in seed.tools {
		let id = tool.id.clone();
		let stored = service
			.index_tool(tool)
			.await
			.map_err(|err| eyre::eyre!("Failed to seed tool {id:?}: {err}"))?;

		ids.push(stored.id);
	}

	tracing::info!(seeded = ids.len(), %index, "Seeding finished.");

	let report = SeedReport { index, seeded: ids.len(), ids };

	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

pub fn load_seed(path: &Path) -> color_eyre::Result<SeedData> {
	let raw = fs::read_to_string(path)?;

	parse_seed(&raw)
}

pub fn parse_seed(raw: &str) -> color_eyre::Result<SeedData> {
	let seed: SeedData = serde_json::from_str(raw)?;
	let mut seen = HashSet::new();

	for tool in &seed.tools {
		if !seen.insert(tool.id.trim()) {
			return Err(eyre::eyre!("Seed data repeats tool id {:?}.", tool.id.trim()));
		}
	}

	Ok(seed)
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE_SEED: &str = include_str!("../data/tools.json");

	#[test]
	fn sample_seed_parses_with_defaults() {
		let seed = parse_seed(SAMPLE_SEED).expect("Failed to parse sample seed.");

		assert!(seed.tools.len() >= 3);
		assert!(seed.tools.iter().all(|tool| !tool.description.is_empty()));
		assert!(seed.tools.iter().all(|tool| tool.input_schema.is_object()));
	}

	#[test]
	fn repeated_ids_are_rejected() {
		let raw = r#"{"tools": [
			{"id": "a", "name": "A", "description": "First."},
			{"id": " a ", "name": "A2", "description": "Second."}
		]}"#;

		assert!(parse_seed(raw).is_err());
	}

	#[test]
	fn missing_tools_key_is_rejected() {
		assert!(parse_seed(r#"{"items": []}"#).is_err());
	}
}
