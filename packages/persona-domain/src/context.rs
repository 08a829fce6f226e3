use serde_json::Value;

use crate::types::{Chunk, Role, Turn};

/// Picks the context window from retrieved chunks.
///
/// Single person: the `budget` highest-scored chunks. Multiple people: the
/// budget is split as evenly as possible with at least one slot per person,
/// leftover slots filled by the next-highest-scored remaining chunks.
pub fn select_context<'a>(
	chunks: &'a [Chunk],
	person_ids: &[String],
	budget: usize,
) -> Vec<&'a Chunk> {
	let mut ranked = chunks.iter().collect::<Vec<_>>();

	ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

	if person_ids.len() <= 1 {
		ranked.truncate(budget);

		return ranked;
	}

	let per_person = (budget / person_ids.len()).max(1);
	let mut chosen = Vec::with_capacity(budget);
	let mut leftovers = Vec::new();

	for person_id in person_ids {
		let mut taken = 0;

		for chunk in ranked.iter().filter(|chunk| chunk.person_id() == Some(person_id.as_str())) {
			if taken < per_person {
				chosen.push(*chunk);
				taken += 1;
			} else {
				leftovers.push(*chunk);
			}
		}
	}

	leftovers.sort_by(|a, b| b.score.total_cmp(&a.score));

	for chunk in leftovers {
		if chosen.len() >= budget {
			break;
		}

		chosen.push(chunk);
	}

	chosen.truncate(budget);

	chosen
}

/// Renders chunks as numbered context blocks with provenance, e.g.
/// `[1] (id=c-7 | experience/Acme) ...text...`.
pub fn render_context(chunks: &[&Chunk]) -> String {
	chunks
		.iter()
		.enumerate()
		.map(|(index, chunk)| {
			let provenance = ["section", "employer"]
				.iter()
				.filter_map(|field| chunk.metadata.get(*field).and_then(Value::as_str))
				.collect::<Vec<_>>()
				.join("/");

			format!("[{}] (id={} | {}) {}", index + 1, chunk.chunk_id, provenance, chunk.text)
		})
		.collect::<Vec<_>>()
		.join("\n\n")
}

/// Renders the last `window` turns chronologically, oldest first.
pub fn render_history(turns: &[Turn], window: usize) -> String {
	if turns.is_empty() {
		return "(no prior history)\n".to_string();
	}

	let skip = turns.len().saturating_sub(window);
	let lines = turns[skip..]
		.iter()
		.map(|turn| {
			let role = match turn.role {
				Role::User => "User",
				Role::Assistant => "Assistant",
			};

			format!("{role}: {}", turn.content)
		})
		.collect::<Vec<_>>();

	format!("{}\n", lines.join("\n"))
}
