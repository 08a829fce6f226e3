use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub index: Index,
	pub providers: Providers,
	pub resolver: Resolver,
	pub retrieval: Retrieval,
	pub memory: Memory,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Index {
	pub url: String,
	pub people_collection: String,
	pub chunk_collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub answer_temperature: f32,
	pub answer_max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Resolver {
	/// Top candidate scores below this resolve to no match.
	pub min_score: f32,
	/// Rank1-rank2 score gap below this counts as a tie.
	pub ambiguity_delta: f32,
	pub people_top_k: u32,
	pub max_clarify_options: u32,
	pub pending_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub chunk_top_k: u32,
	pub context_chunks: u32,
}

#[derive(Debug, Deserialize)]
pub struct Memory {
	pub max_exchanges: u32,
	pub history_window: u32,
	/// Sessions idle longer than this have their memory, pending candidates
	/// and lock entry dropped, keeping long-running hosts bounded.
	pub idle_session_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
