mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Index, LlmProviderConfig, Memory, Providers, Resolver,
	Retrieval, Security, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.index.people_collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.people_collection must be non-empty.".to_string(),
		});
	}
	if cfg.index.chunk_collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "index.chunk_collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.index.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match index.vector_dim.".to_string(),
		});
	}
	if !cfg.resolver.min_score.is_finite() || cfg.resolver.min_score < 0.0 {
		return Err(Error::Validation {
			message: "resolver.min_score must be a finite number of zero or greater.".to_string(),
		});
	}
	if !cfg.resolver.ambiguity_delta.is_finite() || cfg.resolver.ambiguity_delta < 0.0 {
		return Err(Error::Validation {
			message: "resolver.ambiguity_delta must be a finite number of zero or greater."
				.to_string(),
		});
	}
	if cfg.resolver.people_top_k == 0 {
		return Err(Error::Validation {
			message: "resolver.people_top_k must be greater than zero.".to_string(),
		});
	}
	if !(2..=10).contains(&cfg.resolver.max_clarify_options) {
		return Err(Error::Validation {
			message: "resolver.max_clarify_options must be in the range 2-10.".to_string(),
		});
	}
	if cfg.resolver.pending_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "resolver.pending_ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.chunk_top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.chunk_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.context_chunks == 0 {
		return Err(Error::Validation {
			message: "retrieval.context_chunks must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.context_chunks > cfg.retrieval.chunk_top_k {
		return Err(Error::Validation {
			message: "retrieval.context_chunks must not exceed retrieval.chunk_top_k.".to_string(),
		});
	}
	if cfg.memory.max_exchanges == 0 {
		return Err(Error::Validation {
			message: "memory.max_exchanges must be greater than zero.".to_string(),
		});
	}
	if cfg.memory.history_window == 0 {
		return Err(Error::Validation {
			message: "memory.history_window must be greater than zero.".to_string(),
		});
	}
	if cfg.memory.idle_session_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "memory.idle_session_ttl_secs must be greater than zero.".to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	trim_trailing_slash(&mut cfg.providers.embedding.api_base);
	trim_trailing_slash(&mut cfg.providers.llm.api_base);
	trim_trailing_slash(&mut cfg.index.url);
}

fn trim_trailing_slash(value: &mut String) {
	while value.ends_with('/') {
		value.pop();
	}
}
