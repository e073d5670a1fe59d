use std::{collections::BTreeSet, fmt};

use serde_json::{Map, Value};

pub const CATEGORY_KEY: &str = "category";
pub const TAGS_KEY: &str = "tags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
	Category,
	Tags,
}

/// A recognized result filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFilter {
	/// Exact category equality.
	Category(String),
	/// Matches when the tool carries at least one of the tags.
	Tags(BTreeSet<String>),
}
impl ToolFilter {
	pub fn kind(&self) -> FilterKind {
		match self {
			Self::Category(_) => FilterKind::Category,
			Self::Tags(_) => FilterKind::Tags,
		}
	}

	pub fn matches(&self, category: &str, tags: &[String]) -> bool {
		match self {
			Self::Category(expected) => expected == category,
			Self::Tags(wanted) => tags.iter().any(|tag| wanted.contains(tag)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
	pub key: String,
	pub message: String,
}
impl fmt::Display for FilterError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "filters.{}: {}", self.key, self.message)
	}
}

impl std::error::Error for FilterError {}

/// At most one filter per [`FilterKind`]; a result must satisfy all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilters {
	filters: Vec<ToolFilter>,
}
impl ToolFilters {
	/// Parses caller-supplied filters. Recognized keys with unusable values are rejected;
	/// unrecognized keys are ignored.
	pub fn parse_strict(raw: &Map<String, Value>) -> Result<Self, FilterError> {
		let mut out = Self::default();

		for (key, value) in raw {
			match parse_entry(key, value)? {
				Some(filter) => out.set(filter),
				None => continue,
			}
		}

		Ok(out)
	}

	/// Parses filters proposed by a language model. Anything unusable is skipped and its key
	/// reported in the second tuple element.
	pub fn parse_lenient(raw: &Map<String, Value>) -> (Self, Vec<String>) {
		let mut out = Self::default();
		let mut skipped = Vec::new();

		for (key, value) in raw {
			let lenient = match (key.as_str(), value) {
				(TAGS_KEY, Value::Array(items)) =>
					Value::Array(items.iter().filter(|item| item.is_string()).cloned().collect()),
				_ => value.clone(),
			};

			match parse_entry(key, &lenient) {
				Ok(Some(filter)) => out.set(filter),
				Ok(None) => {},
				Err(err) => skipped.push(err.key),
			}
		}

		(out, skipped)
	}

	pub fn from_filters(filters: impl IntoIterator<Item = ToolFilter>) -> Self {
		let mut out = Self::default();

		for filter in filters {
			out.set(filter);
		}

		out
	}

	/// Returns `self` with every filter of a kind present in `other` replaced by `other`'s.
	pub fn overridden_by(mut self, other: Self) -> Self {
		for filter in other.filters {
			self.set(filter);
		}

		self
	}

	pub fn matches(&self, category: &str, tags: &[String]) -> bool {
		self.filters.iter().all(|filter| filter.matches(category, tags))
	}

	pub fn is_empty(&self) -> bool {
		self.filters.is_empty()
	}

	pub fn len(&self) -> usize {
		self.filters.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &ToolFilter> {
		self.filters.iter()
	}

	fn set(&mut self, filter: ToolFilter) {
		let kind = filter.kind();

		match self.filters.iter_mut().find(|existing| existing.kind() == kind) {
			Some(existing) => *existing = filter,
			None => self.filters.push(filter),
		}
	}
}

fn parse_entry(key: &str, value: &Value) -> Result<Option<ToolFilter>, FilterError> {
	let err = |message: &str| FilterError { key: key.to_string(), message: message.to_string() };

	match key {
		CATEGORY_KEY => match value {
			Value::Null => Ok(None),
			Value::String(raw) if !raw.trim().is_empty() =>
				Ok(Some(ToolFilter::Category(raw.trim().to_string()))),
			_ => Err(err("category must be a non-empty string.")),
		},
		TAGS_KEY => {
			let tags: BTreeSet<String> = match value {
				Value::Null => return Ok(None),
				Value::String(raw) => [raw.trim().to_string()].into_iter().collect(),
				Value::Array(items) => items
					.iter()
					.map(|item| {
						item.as_str()
							.map(|tag| tag.trim().to_string())
							.ok_or_else(|| err("tags must contain only strings."))
					})
					.collect::<Result<_, _>>()?,
				_ => return Err(err("tags must be a string or an array of strings.")),
			};
			let tags: BTreeSet<String> = tags.into_iter().filter(|tag| !tag.is_empty()).collect();

			if tags.is_empty() { Ok(None) } else { Ok(Some(ToolFilter::Tags(tags))) }
		},
		_ => Ok(None),
	}
}
