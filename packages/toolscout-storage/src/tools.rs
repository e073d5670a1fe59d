use serde_json::Value;
use time::OffsetDateTime;

use crate::{
	Error, Result,
	db::Db,
	models::{Tool, VectorHit},
};

#[derive(Debug, sqlx::FromRow)]
struct ToolRow {
	id: String,
	name: String,
	description: String,
	category: String,
	tags: Vec<String>,
	input_schema: String,
	output_schema: String,
	version: String,
	created_at: OffsetDateTime,
	updated_at: OffsetDateTime,
	distance: f64,
}
impl ToolRow {
	fn into_hit(self) -> Result<VectorHit> {
		let input_schema = parse_schema(&self.id, "input_schema", &self.input_schema)?;
		let output_schema = parse_schema(&self.id, "output_schema", &self.output_schema)?;

		Ok(VectorHit {
			tool: Tool {
				id: self.id,
				name: self.name,
				description: self.description,
				category: self.category,
				tags: self.tags,
				input_schema,
				output_schema,
				version: self.version,
				created_at: self.created_at,
				updated_at: self.updated_at,
			},
			distance: self.distance,
		})
	}
}

/// Nearest tools by cosine distance, closest first.
pub async fn query_nearest(db: &Db, embedding: &[f32], limit: u32) -> Result<Vec<VectorHit>> {
	if embedding.is_empty() {
		return Err(Error::InvalidArgument("Query embedding must be non-empty.".to_string()));
	}

	let vec_text = vector_to_pg(embedding);
	let rows: Vec<ToolRow> = sqlx::query_as(
		"\
SELECT
	id,
	name,
	description,
	category,
	tags,
	input_schema,
	output_schema,
	version,
	created_at,
	updated_at,
	(embedding <=> $1::text::vector)::float8 AS distance
FROM tools
ORDER BY embedding <=> $1::text::vector ASC
LIMIT $2",
	)
	.bind(vec_text.as_str())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter().map(ToolRow::into_hit).collect()
}

pub async fn upsert_tool(db: &Db, tool: &Tool, embedding: &[f32]) -> Result<()> {
	if tool.id.trim().is_empty() {
		return Err(Error::InvalidArgument("Tool id must be non-empty.".to_string()));
	}
	if embedding.is_empty() {
		return Err(Error::InvalidArgument("Tool embedding must be non-empty.".to_string()));
	}

	let input_schema = serde_json::to_string(&tool.input_schema)?;
	let output_schema = serde_json::to_string(&tool.output_schema)?;
	let vec_text = vector_to_pg(embedding);

	sqlx::query(
		"\
INSERT INTO tools (
	id,
	name,
	description,
	category,
	tags,
	input_schema,
	output_schema,
	version,
	created_at,
	updated_at,
	embedding
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11::text::vector)
ON CONFLICT (id) DO UPDATE
SET
	name = EXCLUDED.name,
	description = EXCLUDED.description,
	category = EXCLUDED.category,
	tags = EXCLUDED.tags,
	input_schema = EXCLUDED.input_schema,
	output_schema = EXCLUDED.output_schema,
	version = EXCLUDED.version,
	updated_at = EXCLUDED.updated_at,
	embedding = EXCLUDED.embedding",
	)
	.bind(tool.id.as_str())
	.bind(tool.name.as_str())
	.bind(tool.description.as_str())
	.bind(tool.category.as_str())
	.bind(tool.tags.as_slice())
	.bind(input_schema)
	.bind(output_schema)
	.bind(tool.version.as_str())
	.bind(tool.created_at)
	.bind(tool.updated_at)
	.bind(vec_text)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Returns whether a row was removed.
pub async fn delete_tool(db: &Db, id: &str) -> Result<bool> {
	let result = sqlx::query("DELETE FROM tools WHERE id = $1").bind(id).execute(&db.pool).await?;

	Ok(result.rows_affected() > 0)
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

fn parse_schema(id: &str, column: &str, raw: &str) -> Result<Value> {
	serde_json::from_str(raw).map_err(|err| Error::Corrupted {
		id: id.to_string(),
		message: format!("{column} is not valid JSON: {err}."),
	})
}
