use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A searchable tool descriptor as stored in both indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
	pub id: String,
	pub name: String,
	pub description: String,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default = "empty_object")]
	pub input_schema: Value,
	#[serde(default = "empty_object")]
	pub output_schema: Value,
	#[serde(default)]
	pub version: String,
	#[serde(default = "OffsetDateTime::now_utc", with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(default = "OffsetDateTime::now_utc", with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
	pub tool: Tool,
	/// Cosine distance, `0` for identical direction.
	pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct KeywordHit {
	pub tool: Tool,
	pub score: f64,
}

fn empty_object() -> Value {
	Value::Object(Map::new())
}
