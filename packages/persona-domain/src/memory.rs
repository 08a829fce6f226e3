use std::collections::{HashMap, VecDeque};

use crate::types::Turn;

/// Bounded conversational recall keyed by (session_id, person_id).
///
/// A session holds memory for at most one active person; switching to a
/// different person invalidates every buffer of that session, not just the
/// differing one, so stale context can never bleed between people.
#[derive(Debug)]
pub struct MemoryStore {
	max_exchanges: usize,
	buffers: HashMap<(String, String), VecDeque<Turn>>,
	last_person_by_session: HashMap<String, String>,
}
impl MemoryStore {
	pub fn new(max_exchanges: usize) -> Self {
		Self {
			max_exchanges: max_exchanges.max(1),
			buffers: HashMap::new(),
			last_person_by_session: HashMap::new(),
		}
	}

	/// Chronological turns for one key, most recent last. Empty if absent.
	pub fn get(&self, session_id: &str, person_id: &str) -> Vec<Turn> {
		self.buffers
			.get(&(session_id.to_string(), person_id.to_string()))
			.map(|buffer| buffer.iter().cloned().collect())
			.unwrap_or_default()
	}

	pub fn last_person(&self, session_id: &str) -> Option<&str> {
		self.last_person_by_session.get(session_id).map(String::as_str)
	}

	/// Appends one exchange (two turns) and records the session's last-active
	/// person. The oldest exchange is evicted once the buffer would exceed
	/// `max_exchanges`, so a buffer never holds more than 2x that many turns.
	pub fn append(
		&mut self,
		session_id: &str,
		person_id: &str,
		user_text: &str,
		assistant_text: &str,
	) {
		let buffer =
			self.buffers.entry((session_id.to_string(), person_id.to_string())).or_default();

		buffer.push_back(Turn::user(user_text));
		buffer.push_back(Turn::assistant(assistant_text));

		while buffer.len() > self.max_exchanges * 2 {
			buffer.pop_front();
			buffer.pop_front();
		}

		self.last_person_by_session.insert(session_id.to_string(), person_id.to_string());
	}

	/// Drops every buffer and the last-person marker of one session.
	pub fn forget_session(&mut self, session_id: &str) {
		self.buffers.retain(|(session, _), _| session != session_id);
		self.last_person_by_session.remove(session_id);
	}

	/// Full per-session invalidation on a person switch. Conservative: every
	/// key sharing the session is dropped, not only the previous person's.
	pub fn reset_if_person_changed(&mut self, session_id: &str, new_person_id: &str) {
		let changed = self
			.last_person_by_session
			.get(session_id)
			.is_some_and(|last| last != new_person_id);

		if changed {
			self.buffers.retain(|(session, _), _| session != session_id);
		}
	}
}
