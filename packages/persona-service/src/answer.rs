use persona_domain::{Chunk, Turn, render_context, render_history};

use crate::{Error, PersonaService, Result};

/// Citation formatting is a prompt-level instruction to the oracle; fidelity
/// is best-effort and not validated here.
const ANSWER_SYSTEM: &str = "You are an assistant that answers ONLY from the provided context.\n\
- Cite fragments with [#] references and end with a list of (id=... | section/employer when present).\n\
- If information is missing, say so explicitly.\n\
- Summarize in clear bullets (Experience, Education, Skills) when it fits.";

impl PersonaService {
	/// Single-person answer: recent memory plus the budgeted context window.
	pub(crate) async fn generate_answer(
		&self,
		query: &str,
		chunks: &[&Chunk],
		history: &[Turn],
	) -> Result<String> {
		let window = self.cfg.memory.history_window as usize;
		let prompt = format!(
			"Recent history:\n{}\nContext:\n{}\n\nCurrent question: {query}\n\
			Answer with [#] citations and a final (id=...) list.",
			render_history(history, window),
			render_context(chunks),
		);

		self.complete_answer(&prompt).await
	}

	/// Multi-person answer: stateless, sectioned per person.
	pub(crate) async fn generate_answer_multi(
		&self,
		query: &str,
		chunks: &[&Chunk],
	) -> Result<String> {
		let prompt = format!(
			"Context (multiple people):\n{}\n\nQuestion: {query}\n\
			Answer in sections per person (## Name/ID), with bullets and [#] citations.",
			render_context(chunks),
		);

		self.complete_answer(&prompt).await
	}

	async fn complete_answer(&self, prompt: &str) -> Result<String> {
		let llm = &self.cfg.providers.llm;

		self.completion
			.complete(ANSWER_SYSTEM, prompt, llm.answer_temperature, llm.answer_max_tokens)
			.await
			.map_err(|err| Error::GenerationUnavailable { message: err.to_string() })
	}
}
