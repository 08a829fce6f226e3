use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// One chat completion through an OpenAI-compatible endpoint. Used for answer
/// generation (temperature ~0.2, larger token budget), binary classification
/// (temperature 0.0, tiny budget) and name extraction.
pub async fn complete(
	cfg: &persona_config::LlmProviderConfig,
	system: &str,
	user: &str,
	temperature: f32,
	max_tokens: u32,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": temperature,
		"max_tokens": max_tokens,
		"messages": [
			{ "role": "system", "content": system },
			{ "role": "user", "content": user },
		],
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_text(json)
}

fn parse_completion_text(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.map(|content| content.trim().to_string())
		.ok_or_else(|| eyre::eyre!("Completion response is missing message content."))
}

/// Interprets a constrained yes/no reply. Only a leading affirmative token
/// counts as yes; anything else, including empty or rambling output, is no.
pub fn parse_yes_no(text: &str) -> bool {
	let lowered = text.trim().to_lowercase();
	let first_token = lowered
		.split(|c: char| !c.is_alphanumeric())
		.find(|token| !token.is_empty())
		.unwrap_or_default();

	matches!(first_token, "yes" | "y" | "si" | "sí")
}

/// Parses a JSON array of names out of raw model output, tolerating code
/// fences. Malformed output degrades to an empty list, never an error.
pub fn parse_name_array(raw: &str) -> Vec<String> {
	let trimmed = strip_code_fence(raw.trim());

	serde_json::from_str::<Vec<Value>>(trimmed)
		.map(|values| {
			values
				.into_iter()
				.filter_map(|value| {
					value.as_str().map(str::trim).filter(|name| !name.is_empty()).map(String::from)
				})
				.collect()
		})
		.unwrap_or_default()
}

fn strip_code_fence(raw: &str) -> &str {
	let Some(inner) = raw.strip_prefix("```") else {
		return raw;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_message_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "  An answer. " } }
			]
		});
		let parsed = parse_completion_text(json).expect("parse failed");

		assert_eq!(parsed, "An answer.");
	}

	#[test]
	fn missing_content_is_an_error() {
		let json = serde_json::json!({ "choices": [] });

		assert!(parse_completion_text(json).is_err());
	}

	#[test]
	fn yes_no_matches_leading_affirmative_tokens_only() {
		assert!(parse_yes_no("yes"));
		assert!(parse_yes_no("Yes."));
		assert!(parse_yes_no("  SÍ  "));
		assert!(parse_yes_no("y"));
		assert!(!parse_yes_no("no"));
		assert!(!parse_yes_no("maybe yes"));
		assert!(!parse_yes_no(""));
		assert!(!parse_yes_no("simplemente no"));
	}

	#[test]
	fn name_array_parses_strings_and_skips_junk() {
		assert_eq!(parse_name_array(r#"["Camila", " Valentina Rodríguez ", "", 3]"#), vec![
			"Camila".to_string(),
			"Valentina Rodríguez".to_string()
		]);
	}

	#[test]
	fn name_array_tolerates_code_fences() {
		assert_eq!(parse_name_array("```json\n[\"Ana\"]\n```"), vec!["Ana".to_string()]);
	}

	#[test]
	fn malformed_name_array_degrades_to_empty() {
		assert!(parse_name_array("I found Camila and Valentina.").is_empty());
		assert!(parse_name_array("{\"names\": [\"Ana\"]}").is_empty());
	}
}
