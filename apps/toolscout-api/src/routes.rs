use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use toolscout_service::{DeleteReport, Error as ServiceError, SearchRequest, SearchResponse};
use toolscout_storage::models::Tool;

#[derive(Debug, Deserialize)]
pub struct DeleteToolRequest {
	pub id: String,
}

#[derive(Debug, Serialize)]
pub struct EnsureKeywordIndexResponse {
	pub index: String,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/tools/search", post(search))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/tools/index", post(index_tool))
		.route("/v1/admin/tools/delete", post(delete_tool))
		.route("/v1/admin/keyword_index/ensure", post(ensure_keyword_index))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search_with_cancel(payload, &state.shutdown).await?;

	Ok(Json(response))
}

async fn index_tool(
	State(state): State<AppState>,
	Json(payload): Json<Tool>,
) -> Result<Json<Tool>, ApiError> {
	let tool = state.service.index_tool(payload).await?;

	Ok(Json(tool))
}

async fn delete_tool(
	State(state): State<AppState>,
	Json(payload): Json<DeleteToolRequest>,
) -> Result<Json<DeleteReport>, ApiError> {
	let report = state.service.delete_tool(&payload.id).await?;

	Ok(Json(report))
}

async fn ensure_keyword_index(
	State(state): State<AppState>,
) -> Result<Json<EnsureKeywordIndexResponse>, ApiError> {
	state.service.ensure_keyword_index().await?;

	let index = state.service.cfg.storage.opensearch.index.clone();

	Ok(Json(EnsureKeywordIndexResponse { index }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				let fields = request_field(&message).map(|field| vec![field]);

				ApiError::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, fields)
			},
			ServiceError::Provider { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None),
			ServiceError::Storage { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "STORAGE_ERROR", message, None),
			ServiceError::KeywordIndex { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "KEYWORD_INDEX_ERROR", message, None),
			ServiceError::DataCorruption { message } => ApiError::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"DATA_CORRUPTION",
				message,
				None,
			),
			ServiceError::Cancelled { message } =>
				ApiError::new(StatusCode::GATEWAY_TIMEOUT, "CANCELLED", message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

/// Search validation messages lead with the offending key, e.g. `filters.tags: ...`.
fn request_field(message: &str) -> Option<String> {
	let (head, _) = message.split_once(' ')?;
	let field = head.strip_suffix(':').unwrap_or(head);

	(field == "query" || field.starts_with("filters.")).then(|| format!("$.{field}"))
}
