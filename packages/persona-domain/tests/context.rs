use serde_json::{Map, json};

use persona_domain::{Chunk, Turn, render_context, render_history, select_context};

fn chunk(chunk_id: &str, person_id: &str, score: f32) -> Chunk {
	let mut metadata = Map::new();

	metadata.insert("person_id".to_string(), json!(person_id));
	metadata.insert("section".to_string(), json!("experience"));
	metadata.insert("employer".to_string(), json!("Acme"));

	Chunk { chunk_id: chunk_id.to_string(), text: format!("text of {chunk_id}"), metadata, score }
}

#[test]
fn single_person_takes_top_scored_chunks() {
	let chunks = vec![
		chunk("c1", "A", 0.2),
		chunk("c2", "A", 0.9),
		chunk("c3", "A", 0.5),
		chunk("c4", "A", 0.7),
	];
	let selected = select_context(&chunks, &["A".to_string()], 2);
	let ids = selected.iter().map(|c| c.chunk_id.as_str()).collect::<Vec<_>>();

	assert_eq!(ids, ["c2", "c4"]);
}

#[test]
fn multi_person_budget_is_split_with_at_least_one_slot_each() {
	let chunks = vec![
		chunk("a1", "A", 0.9),
		chunk("a2", "A", 0.8),
		chunk("a3", "A", 0.7),
		chunk("b1", "B", 0.6),
	];
	let people = ["A".to_string(), "B".to_string()];
	let selected = select_context(&chunks, &people, 4);
	let ids = selected.iter().map(|c| c.chunk_id.as_str()).collect::<Vec<_>>();

	// Two slots each; B only has one chunk, leftover goes to A's next best.
	assert_eq!(ids, ["a1", "a2", "b1", "a3"]);
}

#[test]
fn multi_person_ignores_unresolved_owners() {
	let chunks = vec![chunk("a1", "A", 0.9), chunk("x1", "X", 0.95), chunk("b1", "B", 0.8)];
	let people = ["A".to_string(), "B".to_string()];
	let selected = select_context(&chunks, &people, 4);

	assert!(selected.iter().all(|c| c.person_id() != Some("X")));
}

#[test]
fn render_context_numbers_chunks_and_shows_provenance() {
	let chunks = vec![chunk("c1", "A", 0.9)];
	let selected = select_context(&chunks, &["A".to_string()], 4);
	let rendered = render_context(&selected);

	assert!(rendered.starts_with("[1] (id=c1 | experience/Acme)"));
	assert!(rendered.contains("text of c1"));
}

#[test]
fn render_context_tolerates_missing_provenance_fields() {
	let bare = Chunk {
		chunk_id: "c9".to_string(),
		text: "plain".to_string(),
		metadata: Map::new(),
		score: 0.5,
	};
	let rendered = render_context(&[&bare]);

	assert_eq!(rendered, "[1] (id=c9 | ) plain");
}

#[test]
fn render_history_windows_to_most_recent_turns() {
	let turns = (0..6)
		.flat_map(|index| {
			vec![Turn::user(format!("q{index}")), Turn::assistant(format!("a{index}"))]
		})
		.collect::<Vec<_>>();
	let rendered = render_history(&turns, 8);

	assert!(!rendered.contains("q1"));
	assert!(rendered.contains("User: q2"));
	assert!(rendered.ends_with("Assistant: a5\n"));
}

#[test]
fn render_history_handles_empty_memory() {
	assert_eq!(render_history(&[], 8), "(no prior history)\n");
}
