use toml::Value;

use persona_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:8080"
log_level = "info"

[index]
url               = "http://127.0.0.1:6334"
people_collection = "people_v1"
chunk_collection  = "cv_chunks_v1"
vector_dim        = 1024

[providers.embedding]
provider_id = "embed"
api_base    = "http://127.0.0.1:9000"
api_key     = "test-key"
path        = "/v1/embeddings"
model       = "test-embed"
dimensions  = 1024
timeout_ms  = 5000

[providers.llm]
provider_id        = "llm"
api_base           = "http://127.0.0.1:9001/"
api_key            = "test-key"
path               = "/v1/chat/completions"
model              = "test-llm"
answer_temperature = 0.2
answer_max_tokens  = 800
timeout_ms         = 10000

[resolver]
min_score           = 0.05
ambiguity_delta     = 0.04
people_top_k        = 5
max_clarify_options = 3
pending_ttl_secs    = 300

[retrieval]
chunk_top_k    = 50
context_chunks = 4

[memory]
max_exchanges         = 4
history_window        = 8
idle_session_ttl_secs = 3600

[security]
bind_localhost_only = true
"#;

fn sample_with<F>(mutate: F) -> String
where
	F: FnOnce(&mut toml::Table),
{
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	mutate(root);

	toml::to_string(&value).expect("Failed to render sample config.")
}

fn parse(raw: &str) -> Config {
	toml::from_str(raw).expect("Failed to parse config.")
}

#[test]
fn sample_config_validates() {
	let cfg = parse(SAMPLE_CONFIG_TOML);

	persona_config::validate(&cfg).expect("Sample config must validate.");
}

#[test]
fn rejects_dimension_mismatch() {
	let raw = sample_with(|root| {
		root.get_mut("index")
			.and_then(Value::as_table_mut)
			.expect("missing [index]")
			.insert("vector_dim".to_string(), Value::Integer(768));
	});
	let result = persona_config::validate(&parse(&raw));

	assert!(matches!(
		result,
		Err(Error::Validation { message }) if message.contains("vector_dim")
	));
}

#[test]
fn rejects_negative_thresholds() {
	for key in ["min_score", "ambiguity_delta"] {
		let raw = sample_with(|root| {
			root.get_mut("resolver")
				.and_then(Value::as_table_mut)
				.expect("missing [resolver]")
				.insert(key.to_string(), Value::Float(-0.01));
		});
		let result = persona_config::validate(&parse(&raw));

		assert!(
			matches!(result, Err(Error::Validation { message }) if message.contains(key)),
			"expected {key} validation failure",
		);
	}
}

#[test]
fn rejects_context_budget_above_retrieval_cap() {
	let raw = sample_with(|root| {
		root.get_mut("retrieval")
			.and_then(Value::as_table_mut)
			.expect("missing [retrieval]")
			.insert("context_chunks".to_string(), Value::Integer(100));
	});
	let result = persona_config::validate(&parse(&raw));

	assert!(matches!(
		result,
		Err(Error::Validation { message }) if message.contains("context_chunks")
	));
}

#[test]
fn rejects_empty_api_key() {
	let raw = sample_with(|root| {
		root.get_mut("providers")
			.and_then(Value::as_table_mut)
			.and_then(|providers| providers.get_mut("llm"))
			.and_then(Value::as_table_mut)
			.expect("missing [providers.llm]")
			.insert("api_key".to_string(), Value::String("  ".to_string()));
	});
	let result = persona_config::validate(&parse(&raw));

	assert!(matches!(
		result,
		Err(Error::Validation { message }) if message.contains("llm api_key")
	));
}

#[test]
fn rejects_zero_idle_session_ttl() {
	let raw = sample_with(|root| {
		root.get_mut("memory")
			.and_then(Value::as_table_mut)
			.expect("missing [memory]")
			.insert("idle_session_ttl_secs".to_string(), Value::Integer(0));
	});
	let result = persona_config::validate(&parse(&raw));

	assert!(matches!(
		result,
		Err(Error::Validation { message }) if message.contains("idle_session_ttl_secs")
	));
}

#[test]
fn rejects_single_clarify_option() {
	let raw = sample_with(|root| {
		root.get_mut("resolver")
			.and_then(Value::as_table_mut)
			.expect("missing [resolver]")
			.insert("max_clarify_options".to_string(), Value::Integer(1));
	});
	let result = persona_config::validate(&parse(&raw));

	assert!(matches!(
		result,
		Err(Error::Validation { message }) if message.contains("max_clarify_options")
	));
}
