use tracing::warn;

use persona_providers::completion::{parse_name_array, parse_yes_no};

use crate::{Error, PersonaService, Result};

const COREF_SYSTEM: &str = "You are a binary classifier. Answer ONLY 'yes' or 'no'. \
Decide whether the user's question refers to the SAME person already in context \
or introduces a NEW person.\n\
- Answer 'yes' if the query is anaphoric or a continuation (e.g. 'and their \
latest roles?', 'where did they study?', 'what is their email?').\n\
- Answer 'no' if it mentions an explicit proper name or suggests a person switch.";

const EXTRACT_NAMES_SYSTEM: &str = "Extract every person name mentioned in the user's text. \
Answer ONLY a JSON array of strings, with no additional text. \
Example: [\"Camila\", \"Valentina Rodriguez\"]";

impl PersonaService {
	/// Decides whether `query` continues the session's last-resolved person.
	///
	/// Short-circuits to false when the user is actively resolving a
	/// disambiguation (a choice is present) or when no person has been
	/// resolved for the session yet. Otherwise one temperature-0 completion
	/// classifies the query; anything but an affirmative reply means no reuse.
	pub(crate) async fn should_reuse(
		&self,
		session_id: &str,
		query: &str,
		has_choice: bool,
	) -> Result<bool> {
		if has_choice || self.last_person(session_id).is_none() {
			return Ok(false);
		}

		let user = format!(
			"User question: {query}\n\
			A person is already selected in context.\n\
			Does the question appear to refer to that SAME person? (yes/no)"
		);
		let reply = self
			.completion
			.complete(COREF_SYSTEM, &user, 0.0, 5)
			.await
			.map_err(|err| Error::GenerationUnavailable { message: err.to_string() })?;

		Ok(parse_yes_no(&reply))
	}

	/// LLM name extraction for mode classification. Any failure, transport or
	/// parse, degrades to an empty list so the turn falls back to the
	/// single-person path instead of erroring.
	pub(crate) async fn extract_names(&self, query: &str) -> Vec<String> {
		match self.completion.complete(EXTRACT_NAMES_SYSTEM, query, 0.0, 120).await {
			Ok(raw) => parse_name_array(&raw),
			Err(err) => {
				warn!(error = %err, "Name extraction failed; treating query as single-person.");

				Vec::new()
			},
		}
	}
}
