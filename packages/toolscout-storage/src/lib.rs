pub mod db;
pub mod models;
pub mod opensearch;
pub mod schema;
pub mod time_serde;
pub mod tools;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
