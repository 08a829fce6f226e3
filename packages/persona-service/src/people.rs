use std::collections::{HashMap, hash_map::Entry};

use serde_json::Value;

use persona_domain::{Candidate, Chunk};

use crate::{Error, IndexKind, PersonaService, Result, SearchHit};

impl PersonaService {
	/// Queries the people index once per text, then deduplicates by person_id
	/// keeping the best score per person, sorted by score descending.
	pub(crate) async fn find_people(&self, query_texts: &[String]) -> Result<Vec<Candidate>> {
		let mut best: HashMap<String, Candidate> = HashMap::new();

		for text in query_texts {
			let hits = self
				.search
				.query(text, self.cfg.resolver.people_top_k, IndexKind::People, &[])
				.await
				.map_err(|err| Error::SearchUnavailable { message: err.to_string() })?;

			for hit in hits {
				let Some(candidate) = person_candidate(&hit, text) else {
					continue;
				};

				match best.entry(candidate.person_id.clone()) {
					Entry::Occupied(mut existing) =>
						if candidate.score > existing.get().score {
							existing.insert(candidate);
						},
					Entry::Vacant(vacant) => {
						vacant.insert(candidate);
					},
				}
			}
		}

		let mut candidates = best.into_values().collect::<Vec<_>>();

		candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

		Ok(candidates)
	}

	/// Queries the chunk index restricted to the given owners, top-N by score.
	/// Hits are post-filtered by owner even when the backend filtered
	/// server-side, so an over-broad oracle cannot leak another person's
	/// evidence into the context.
	pub(crate) async fn find_chunks(
		&self,
		query_text: &str,
		person_ids: &[String],
	) -> Result<Vec<Chunk>> {
		if person_ids.is_empty() {
			return Ok(Vec::new());
		}

		let hits = self
			.search
			.query(query_text, self.cfg.retrieval.chunk_top_k, IndexKind::Chunks, person_ids)
			.await
			.map_err(|err| Error::SearchUnavailable { message: err.to_string() })?;
		let mut chunks = hits
			.into_iter()
			.map(evidence_chunk)
			.filter(|chunk| {
				chunk.person_id().is_some_and(|owner| person_ids.iter().any(|id| id == owner))
			})
			.collect::<Vec<_>>();

		chunks.sort_by(|a, b| b.score.total_cmp(&a.score));
		chunks.truncate(self.cfg.retrieval.chunk_top_k as usize);

		Ok(chunks)
	}
}

/// Shapes one people-index hit into a candidate. Hits without any usable
/// person_id are dropped. The display name is assembled from canonical_name
/// or name plus an optional lastname field.
fn person_candidate(hit: &SearchHit, source_query: &str) -> Option<Candidate> {
	let person_id = hit
		.fields
		.get("person_id")
		.and_then(Value::as_str)
		.map(String::from)
		.or_else(|| (!hit.id.is_empty()).then(|| hit.id.clone()))?;
	let name = hit
		.fields
		.get("canonical_name")
		.or_else(|| hit.fields.get("name"))
		.and_then(Value::as_str)
		.unwrap_or_default();
	let lastname = hit.fields.get("lastname").and_then(Value::as_str).unwrap_or_default();
	let display_name = if lastname.is_empty() {
		name.to_string()
	} else {
		format!("{name} {lastname}")
	};

	Some(Candidate {
		person_id,
		display_name: display_name.trim().to_string(),
		score: hit.score,
		source_query: source_query.to_string(),
	})
}

fn evidence_chunk(hit: SearchHit) -> Chunk {
	let chunk_id = hit
		.fields
		.get("chunk_id")
		.and_then(Value::as_str)
		.map(String::from)
		.unwrap_or_else(|| hit.id.clone());
	let text = hit
		.fields
		.get("chunk_text")
		.or_else(|| hit.fields.get("text"))
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string();

	Chunk { chunk_id, text, metadata: hit.fields, score: hit.score }
}
