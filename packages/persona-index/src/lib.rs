//! Qdrant-backed implementation of the search oracle: query text is embedded
//! through the configured provider, then matched against the people or chunk
//! collection, optionally restricted to a set of owning person_ids.

use color_eyre::{Result, eyre};
use qdrant_client::{
	Qdrant,
	qdrant::{
		Condition, Filter, Query, QueryPointsBuilder, ScoredPoint, point_id::PointIdOptions,
		value::Kind,
	},
};
use serde_json::{Map, Number, Value};

use persona_service::{BoxFuture, IndexKind, SearchHit, SearchProvider};

pub struct VectorIndex {
	client: Qdrant,
	embedding: persona_config::EmbeddingProviderConfig,
	people_collection: String,
	chunk_collection: String,
}
impl VectorIndex {
	pub fn new(
		cfg: &persona_config::Index,
		embedding: &persona_config::EmbeddingProviderConfig,
	) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			embedding: embedding.clone(),
			people_collection: cfg.people_collection.clone(),
			chunk_collection: cfg.chunk_collection.clone(),
		})
	}

	fn collection(&self, index: IndexKind) -> &str {
		match index {
			IndexKind::People => &self.people_collection,
			IndexKind::Chunks => &self.chunk_collection,
		}
	}
}
impl SearchProvider for VectorIndex {
	fn query<'a>(
		&'a self,
		text: &'a str,
		top_k: u32,
		index: IndexKind,
		person_filter: &'a [String],
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move {
			let vectors =
				persona_providers::embedding::embed(&self.embedding, &[text.to_string()]).await?;
			let vector = vectors
				.into_iter()
				.next()
				.ok_or_else(|| eyre::eyre!("Embedding provider returned no vector."))?;
			let mut search = QueryPointsBuilder::new(self.collection(index).to_string())
				.query(Query::new_nearest(vector))
				.limit(top_k as u64)
				.with_payload(true);

			if !person_filter.is_empty() {
				search = search.filter(Filter::must([Condition::matches(
					"person_id",
					person_filter.to_vec(),
				)]));
			}

			let response = self.client.query(search).await?;

			Ok(response.result.into_iter().map(hit_from_point).collect())
		})
	}
}

fn hit_from_point(point: ScoredPoint) -> SearchHit {
	let id = point
		.id
		.as_ref()
		.and_then(|point_id| match &point_id.point_id_options {
			Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
			Some(PointIdOptions::Num(id)) => Some(id.to_string()),
			None => None,
		})
		.unwrap_or_default();
	let fields = point
		.payload
		.into_iter()
		.map(|(key, value)| (key, qdrant_value_to_json(value)))
		.collect::<Map<_, _>>();

	SearchHit { id, score: point.score, fields }
}

fn qdrant_value_to_json(value: qdrant_client::qdrant::Value) -> Value {
	match value.kind {
		Some(Kind::StringValue(text)) => Value::String(text),
		Some(Kind::IntegerValue(number)) => Value::Number(number.into()),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null),
		Some(Kind::BoolValue(flag)) => Value::Bool(flag),
		Some(Kind::ListValue(list)) =>
			Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect()),
		Some(Kind::StructValue(object)) => Value::Object(
			object
				.fields
				.into_iter()
				.map(|(key, value)| (key, qdrant_value_to_json(value)))
				.collect(),
		),
		Some(Kind::NullValue(_)) | None => Value::Null,
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::PointId;

	use super::*;

	fn qdrant_string(text: &str) -> qdrant_client::qdrant::Value {
		qdrant_client::qdrant::Value { kind: Some(Kind::StringValue(text.to_string())) }
	}

	#[test]
	fn converts_payload_kinds() {
		let nested = qdrant_client::qdrant::Value {
			kind: Some(Kind::ListValue(qdrant_client::qdrant::ListValue {
				values: vec![qdrant_string("a"), qdrant_client::qdrant::Value {
					kind: Some(Kind::IntegerValue(7)),
				}],
			})),
		};

		assert_eq!(qdrant_value_to_json(qdrant_string("x")), Value::String("x".to_string()));
		assert_eq!(
			qdrant_value_to_json(nested),
			Value::Array(vec![Value::String("a".to_string()), Value::Number(7.into())])
		);
		assert_eq!(
			qdrant_value_to_json(qdrant_client::qdrant::Value { kind: None }),
			Value::Null
		);
	}

	#[test]
	fn maps_point_id_and_payload_into_a_hit() {
		let point = ScoredPoint {
			id: Some(PointId { point_id_options: Some(PointIdOptions::Num(42)) }),
			score: 0.5,
			payload: [("person_id".to_string(), qdrant_string("p-1"))].into_iter().collect(),
			..Default::default()
		};
		let hit = hit_from_point(point);

		assert_eq!(hit.id, "42");
		assert_eq!(hit.score, 0.5);
		assert_eq!(hit.fields.get("person_id"), Some(&Value::String("p-1".to_string())));
	}
}
