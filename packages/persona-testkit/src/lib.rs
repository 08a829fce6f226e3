//! Deterministic in-process stand-ins for the search and completion oracles,
//! shared by the service and app test suites.

use std::sync::{
	Mutex,
	atomic::{AtomicBool, Ordering},
};

use color_eyre::eyre;
use serde_json::{Map, json};

use persona_config::{
	Config, EmbeddingProviderConfig, Index, LlmProviderConfig, Memory, Providers, Resolver,
	Retrieval, Security, Service,
};
use persona_service::{BoxFuture, CompletionProvider, IndexKind, SearchHit, SearchProvider};

/// Default configuration for in-process tests. Provider endpoints are
/// placeholders; tests never dial them because the oracles are mocked.
pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		index: Index {
			url: "http://127.0.0.1:6334".to_string(),
			people_collection: "people_v1".to_string(),
			chunk_collection: "cv_chunks_v1".to_string(),
			vector_dim: 4,
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "embed".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: 4,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "llm".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-llm".to_string(),
				answer_temperature: 0.2,
				answer_max_tokens: 800,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		resolver: Resolver {
			min_score: 0.05,
			ambiguity_delta: 0.04,
			people_top_k: 5,
			max_clarify_options: 3,
			pending_ttl_secs: 300,
		},
		retrieval: Retrieval { chunk_top_k: 50, context_chunks: 4 },
		memory: Memory { max_exchanges: 4, history_window: 8, idle_session_ttl_secs: 3600 },
		security: Security { bind_localhost_only: true },
	}
}

pub fn person_hit(person_id: &str, display_name: &str, score: f32) -> SearchHit {
	let mut fields = Map::new();

	fields.insert("person_id".to_string(), json!(person_id));
	fields.insert("canonical_name".to_string(), json!(display_name));

	SearchHit { id: format!("people-{person_id}"), score, fields }
}

pub fn chunk_hit(chunk_id: &str, person_id: &str, text: &str, score: f32) -> SearchHit {
	let mut fields = Map::new();

	fields.insert("chunk_id".to_string(), json!(chunk_id));
	fields.insert("person_id".to_string(), json!(person_id));
	fields.insert("chunk_text".to_string(), json!(text));
	fields.insert("section".to_string(), json!("experience"));
	fields.insert("employer".to_string(), json!("Acme"));

	SearchHit { id: chunk_id.to_string(), score, fields }
}

/// Search oracle returning fixed hit lists and recording every query, so a
/// test can assert that a path skipped (or hit) the index.
#[derive(Default)]
pub struct MockSearch {
	people: Vec<SearchHit>,
	chunks: Vec<SearchHit>,
	fail: AtomicBool,
	queries: Mutex<Vec<RecordedQuery>>,
}

#[derive(Clone, Debug)]
pub struct RecordedQuery {
	pub text: String,
	pub index: IndexKind,
	pub person_filter: Vec<String>,
}

impl MockSearch {
	pub fn new(people: Vec<SearchHit>, chunks: Vec<SearchHit>) -> Self {
		Self { people, chunks, ..Self::default() }
	}

	pub fn set_unavailable(&self, unavailable: bool) {
		self.fail.store(unavailable, Ordering::SeqCst);
	}

	pub fn queries(&self) -> Vec<RecordedQuery> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn people_query_count(&self) -> usize {
		self.queries().iter().filter(|query| query.index == IndexKind::People).count()
	}
}
impl SearchProvider for MockSearch {
	fn query<'a>(
		&'a self,
		text: &'a str,
		_top_k: u32,
		index: IndexKind,
		person_filter: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(RecordedQuery {
			text: text.to_string(),
			index,
			person_filter: person_filter.to_vec(),
		});

		let result = if self.fail.load(Ordering::SeqCst) {
			Err(eyre::eyre!("index offline"))
		} else {
			Ok(match index {
				IndexKind::People => self.people.clone(),
				IndexKind::Chunks => self.chunks.clone(),
			})
		};

		Box::pin(async move { result })
	}
}

/// Completion oracle with one canned reply per call kind. Calls are routed by
/// the distinctive phrasing of each system prompt and recorded for assertion.
pub struct MockCompletion {
	pub names_reply: String,
	pub coref_reply: String,
	pub answer_reply: String,
	fail_answers: AtomicBool,
	calls: Mutex<Vec<CompletionCall>>,
}

#[derive(Clone, Debug)]
pub struct CompletionCall {
	pub kind: CompletionKind,
	pub user: String,
	pub temperature: f32,
	pub max_tokens: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompletionKind {
	ExtractNames,
	Coref,
	Answer,
}

impl Default for MockCompletion {
	fn default() -> Self {
		Self {
			names_reply: "[]".to_string(),
			coref_reply: "no".to_string(),
			answer_reply: "A generated answer [1].".to_string(),
			fail_answers: AtomicBool::new(false),
			calls: Mutex::new(Vec::new()),
		}
	}
}
impl MockCompletion {
	pub fn with_names(names_reply: impl Into<String>) -> Self {
		Self { names_reply: names_reply.into(), ..Self::default() }
	}

	pub fn with_coref(coref_reply: impl Into<String>) -> Self {
		Self { coref_reply: coref_reply.into(), ..Self::default() }
	}

	pub fn set_fail_answers(&self, fail: bool) {
		self.fail_answers.store(fail, Ordering::SeqCst);
	}

	pub fn calls(&self) -> Vec<CompletionCall> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn calls_of(&self, kind: CompletionKind) -> usize {
		self.calls().iter().filter(|call| call.kind == kind).count()
	}

	fn kind_of(system: &str) -> CompletionKind {
		if system.contains("JSON array") {
			CompletionKind::ExtractNames
		} else if system.contains("'yes' or 'no'") {
			CompletionKind::Coref
		} else {
			CompletionKind::Answer
		}
	}
}
impl CompletionProvider for MockCompletion {
	fn complete<'a>(
		&'a self,
		system: &'a str,
		user: &'a str,
		temperature: f32,
		max_tokens: u32,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		let kind = Self::kind_of(system);

		self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(CompletionCall {
			kind,
			user: user.to_string(),
			temperature,
			max_tokens,
		});

		let reply = match kind {
			CompletionKind::ExtractNames => Ok(self.names_reply.clone()),
			CompletionKind::Coref => Ok(self.coref_reply.clone()),
			CompletionKind::Answer =>
				if self.fail_answers.load(Ordering::SeqCst) {
					Err(eyre::eyre!("model offline"))
				} else {
					Ok(self.answer_reply.clone())
				},
		};

		Box::pin(async move { reply })
	}
}
