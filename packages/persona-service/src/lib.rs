pub mod answer;
pub mod coref;
mod error;
pub mod people;
pub mod turn;

pub use error::{Error, Result};
pub use turn::{TurnRequest, TurnResponse, TurnTrace};

use std::{
	collections::HashMap,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use serde_json::{Map, Value};

use persona_config::Config;
use persona_domain::{Candidate, MemoryStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which logical index a search targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
	/// Embeds canonical display names.
	People,
	/// Embeds evidence chunk text, filterable by owning person_id.
	Chunks,
}

/// One raw hit from the search oracle, already normalized to a uniform shape.
#[derive(Clone, Debug)]
pub struct SearchHit {
	pub id: String,
	pub score: f32,
	pub fields: Map<String, Value>,
}

/// The vector-search oracle. `person_filter` restricts chunk queries to the
/// given owners; implementations without server-side filtering may return
/// unfiltered hits, the entity search client post-filters either way.
pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		text: &'a str,
		top_k: u32,
		index: IndexKind,
		person_filter: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>>;
}

/// The language-model oracle, one constrained chat completion per call.
pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		system: &'a str,
		user: &'a str,
		temperature: f32,
		max_tokens: u32,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Production completion provider, delegating to the HTTP chat client.
pub struct DefaultCompletion {
	cfg: persona_config::LlmProviderConfig,
}
impl DefaultCompletion {
	pub fn new(cfg: persona_config::LlmProviderConfig) -> Self {
		Self { cfg }
	}
}
impl CompletionProvider for DefaultCompletion {
	fn complete<'a>(
		&'a self,
		system: &'a str,
		user: &'a str,
		temperature: f32,
		max_tokens: u32,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(persona_providers::completion::complete(
			&self.cfg, system, user, temperature, max_tokens,
		))
	}
}

/// Candidates the service asked the user to pick from, kept server-side so a
/// follow-up reply works even when the caller does not echo the list back.
/// Single-use and TTL-bound.
#[derive(Debug)]
struct PendingDisambiguation {
	candidates: Vec<Candidate>,
	stored_at: Instant,
}

#[derive(Debug)]
struct SessionSlot {
	lock: Arc<tokio::sync::Mutex<()>>,
	last_used: Instant,
}

pub struct PersonaService {
	pub(crate) cfg: Config,
	pub(crate) search: Arc<dyn SearchProvider>,
	pub(crate) completion: Arc<dyn CompletionProvider>,
	pub(crate) memory: Mutex<MemoryStore>,
	pending: Mutex<HashMap<String, PendingDisambiguation>>,
	session_locks: Mutex<HashMap<String, SessionSlot>>,
}
impl PersonaService {
	pub fn new(
		cfg: Config,
		search: Arc<dyn SearchProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		let memory = MemoryStore::new(cfg.memory.max_exchanges as usize);

		Self {
			cfg,
			search,
			completion,
			memory: Mutex::new(memory),
			pending: Mutex::new(HashMap::new()),
			session_locks: Mutex::new(HashMap::new()),
		}
	}

	/// Per-session exclusion. Turns of one session run to completion in
	/// submission order; different sessions proceed in parallel.
	///
	/// Acquisition doubles as the idle-session sweep: other sessions idle
	/// past `memory.idle_session_ttl_secs` have their lock entry, memory
	/// buffers and pending candidates dropped, so the per-session maps stay
	/// bounded on long-running hosts.
	pub(crate) fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
		let idle_after = Duration::from_secs(self.cfg.memory.idle_session_ttl_secs);
		let now = Instant::now();
		let mut locks = self.session_locks.lock().unwrap_or_else(|err| err.into_inner());
		let expired = locks
			.iter()
			.filter(|(id, slot)| {
				id.as_str() != session_id && now.duration_since(slot.last_used) > idle_after
			})
			.map(|(id, _)| id.clone())
			.collect::<Vec<_>>();

		for id in &expired {
			locks.remove(id);
		}

		if !expired.is_empty() {
			let mut memory = self.memory.lock().unwrap_or_else(|err| err.into_inner());
			let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());

			for id in &expired {
				memory.forget_session(id);
				pending.remove(id);
			}
		}

		let slot = locks
			.entry(session_id.to_string())
			.or_insert_with(|| SessionSlot { lock: Arc::default(), last_used: now });

		slot.last_used = now;

		slot.lock.clone()
	}

	pub(crate) fn store_pending(&self, session_id: &str, candidates: &[Candidate]) {
		let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());

		pending.insert(session_id.to_string(), PendingDisambiguation {
			candidates: candidates.to_vec(),
			stored_at: Instant::now(),
		});
	}

	/// Consumes the pending candidate list for a session, if still fresh.
	pub(crate) fn take_pending(&self, session_id: &str) -> Option<Vec<Candidate>> {
		let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());
		let record = pending.remove(session_id)?;

		if record.stored_at.elapsed().as_secs() > self.cfg.resolver.pending_ttl_secs {
			return None;
		}

		Some(record.candidates)
	}

	pub(crate) fn last_person(&self, session_id: &str) -> Option<String> {
		let memory = self.memory.lock().unwrap_or_else(|err| err.into_inner());

		memory.last_person(session_id).map(String::from)
	}
}
