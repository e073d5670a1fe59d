#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error("Keyword index returned {status}: {message}")]
	KeywordIndex { status: u16, message: String },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Corrupted tool {id}: {message}")]
	Corrupted { id: String, message: String },
}
