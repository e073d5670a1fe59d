pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Keyword index error: {message}")]
	KeywordIndex { message: String },
	#[error("Data corruption: {message}")]
	DataCorruption { message: String },
	#[error("Search cancelled: {message}")]
	Cancelled { message: String },
}
impl From<toolscout_providers::Error> for Error {
	fn from(err: toolscout_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<toolscout_storage::Error> for Error {
	fn from(err: toolscout_storage::Error) -> Self {
		use toolscout_storage::Error as StorageError;

		match err {
			StorageError::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			StorageError::SerdeJson(inner) => Self::Storage { message: inner.to_string() },
			StorageError::Reqwest(inner) => Self::KeywordIndex { message: inner.to_string() },
			err @ StorageError::KeywordIndex { .. } =>
				Self::KeywordIndex { message: err.to_string() },
			StorageError::InvalidArgument(message) => Self::InvalidRequest { message },
			err @ StorageError::Corrupted { .. } =>
				Self::DataCorruption { message: err.to_string() },
		}
	}
}
