use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use toolscout_service::{KeywordIndexStatus, ToolSearchService};
use toolscout_storage::{db::Db, opensearch::OpenSearchIndex};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ToolSearchService>,
	/// Fired on shutdown. In-flight searches observe it and end as cancelled.
	pub shutdown: CancellationToken,
}
impl AppState {
	pub async fn new(config: toolscout_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.postgres.vector_dim).await?;

		let keyword = OpenSearchIndex::new(&config.storage.opensearch)?;
		let verify = config.search.verify_keyword_index;
		let service = ToolSearchService::new(config, db, keyword);

		if verify && service.verify_keyword_index().await == KeywordIndexStatus::Ready {
			tracing::info!("Keyword index mapping verified.");
		}

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ToolSearchService) -> Self {
		Self { service: Arc::new(service), shutdown: CancellationToken::new() }
	}
}
