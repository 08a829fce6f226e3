use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One scored person match from the people index. Scores are comparable only
/// within candidates from the same query batch.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Candidate {
	pub person_id: String,
	pub display_name: String,
	pub score: f32,
	pub source_query: String,
}

/// One scored evidence fragment. Metadata carries provenance (section,
/// employer, owning person_id) for attribution in generated answers.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Chunk {
	pub chunk_id: String,
	pub text: String,
	pub metadata: Map<String, Value>,
	pub score: f32,
}
impl Chunk {
	pub fn person_id(&self) -> Option<&str> {
		self.metadata.get("person_id").and_then(Value::as_str)
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	User,
	Assistant,
}

/// One half of an exchange. Immutable once appended to memory.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Turn {
	pub role: Role,
	pub content: String,
}
impl Turn {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: Role::Assistant, content: content.into() }
	}
}
