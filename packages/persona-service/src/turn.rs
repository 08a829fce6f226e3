use serde::{Deserialize, Serialize};

use persona_domain::{Candidate, coref_candidate, decide, select_context};

use crate::{Error, PersonaService, Result};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TurnRequest {
	pub session_id: String,
	pub query: String,
	/// The user's raw reply to a clarifying question: a 1-based index, a
	/// person_id, or a display name.
	#[serde(default)]
	pub disambiguation_choice: Option<String>,
	/// Candidate list echoed back from a previous clarifying response.
	#[serde(default)]
	pub candidates: Option<Vec<Candidate>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TurnResponse {
	pub answer: String,
	pub person_ids: Vec<String>,
	pub candidates: Vec<Candidate>,
	pub trace: TurnTrace,
}

/// Decision audit for one turn.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TurnTrace {
	pub mode: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub decision: Option<String>,
	pub coref_reuse: bool,
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub parsed_names: Vec<String>,
	/// The caller must collect a disambiguation reply and re-invoke with it
	/// plus the returned candidates.
	pub need_user_input: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub unmatched_choice: Option<String>,
	/// Set when the server-side pending candidate list backed the decision
	/// because the caller did not echo one.
	pub pending_used: bool,
}

impl PersonaService {
	/// Processes one conversational turn to completion.
	///
	/// Turns sharing a session_id are serialized; memory is written only
	/// after an answer was generated, so an abandoned or failed turn leaves
	/// no partial state behind.
	pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
		let query = request.query.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}
		if request.session_id.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "session_id must be non-empty.".to_string(),
			});
		}

		let lock = self.session_lock(&request.session_id);
		let _guard = lock.lock().await;
		let choice = request
			.disambiguation_choice
			.as_deref()
			.map(str::trim)
			.filter(|choice| !choice.is_empty())
			.map(String::from);

		// A pending reply is always a single-person continuation; name
		// extraction only routes fresh queries.
		let parsed_names =
			if choice.is_some() { Vec::new() } else { self.extract_names(&query).await };

		if parsed_names.len() >= 2 {
			return self.multi_person_turn(&query, parsed_names).await;
		}

		self.single_person_turn(&request.session_id, &query, choice, request.candidates, parsed_names)
			.await
	}

	/// Stateless multi-person path: resolve each name to its top person,
	/// retrieve once across all of them, split the context budget evenly.
	async fn multi_person_turn(
		&self,
		query: &str,
		parsed_names: Vec<String>,
	) -> Result<TurnResponse> {
		let mut person_ids = Vec::with_capacity(parsed_names.len());

		for name in &parsed_names {
			if let Some(top) = self.find_people(std::slice::from_ref(name)).await?.into_iter().next()
				&& !person_ids.contains(&top.person_id)
			{
				person_ids.push(top.person_id);
			}
		}

		let chunks = self.find_chunks(query, &person_ids).await?;
		// Twice the single-person window, shared across the resolved people.
		let budget = self.cfg.retrieval.context_chunks as usize * 2;
		let selected = select_context(&chunks, &person_ids, budget);
		let answer = self.generate_answer_multi(query, &selected).await?;

		Ok(TurnResponse {
			answer,
			person_ids,
			candidates: Vec::new(),
			trace: TurnTrace {
				mode: "multi".to_string(),
				parsed_names,
				..TurnTrace::default()
			},
		})
	}

	async fn single_person_turn(
		&self,
		session_id: &str,
		query: &str,
		choice: Option<String>,
		echoed_candidates: Option<Vec<Candidate>>,
		parsed_names: Vec<String>,
	) -> Result<TurnResponse> {
		let mut trace = TurnTrace {
			mode: "single".to_string(),
			parsed_names,
			..TurnTrace::default()
		};
		let reuse = self.should_reuse(session_id, query, choice.is_some()).await?;

		trace.coref_reuse = reuse;

		// Candidate sourcing, in order: the list the caller echoed back, the
		// server-side pending record, the coreference shortcut, fresh search.
		let candidates = match (&choice, echoed_candidates) {
			(Some(_), Some(echoed)) if !echoed.is_empty() => echoed,
			(Some(_), _) =>
				if let Some(pending) = self.take_pending(session_id) {
					trace.pending_used = true;

					pending
				} else {
					self.find_people(std::slice::from_ref(&query.to_string())).await?
				},
			(None, _) =>
				if let Some(last) = reuse.then(|| self.last_person(session_id)).flatten() {
					vec![coref_candidate(&last)]
				} else {
					self.find_people(std::slice::from_ref(&query.to_string())).await?
				},
		};
		let resolution = decide(&self.cfg.resolver, &candidates, choice.as_deref());

		trace.decision = Some(resolution.decision.label().to_string());
		trace.unmatched_choice = resolution.unmatched_choice;

		let Some(person_id) = resolution.decision.person_id().map(String::from) else {
			return Ok(self.clarify(session_id, candidates, trace));
		};
		let chunks = self.find_chunks(query, std::slice::from_ref(&person_id)).await?;
		let budget = self.cfg.retrieval.context_chunks as usize;
		let selected = select_context(&chunks, std::slice::from_ref(&person_id), budget);
		// A switched person's key is empty, so reading without invalidating
		// first still yields the right history window.
		let history = {
			let memory = self.memory.lock().unwrap_or_else(|err| err.into_inner());

			memory.get(session_id, &person_id)
		};
		let answer = self.generate_answer(query, &selected, &history).await?;

		// The only memory mutation of the turn, after the answer succeeded; a
		// failed or abandoned turn leaves the previous person's buffers intact.
		{
			let mut memory = self.memory.lock().unwrap_or_else(|err| err.into_inner());

			memory.reset_if_person_changed(session_id, &person_id);
			memory.append(session_id, &person_id, query, &answer);
		}

		Ok(TurnResponse { answer, person_ids: vec![person_id], candidates, trace })
	}

	/// Terminal clarifying question for the no-match and ambiguous outcomes.
	/// With candidates in hand the top few are listed and stored server-side
	/// for the follow-up reply; with none there is nothing to pick from.
	fn clarify(
		&self,
		session_id: &str,
		candidates: Vec<Candidate>,
		mut trace: TurnTrace,
	) -> TurnResponse {
		if candidates.is_empty() {
			trace.need_user_input = false;

			return TurnResponse {
				answer: "I could not identify that person. Try the full name.".to_string(),
				person_ids: Vec::new(),
				candidates,
				trace,
			};
		}

		let shown = candidates.len().min(self.cfg.resolver.max_clarify_options as usize);
		let mut lines = vec![
			"I found people with similar names. Reply with an option number or the exact name:"
				.to_string(),
		];

		for (index, candidate) in candidates[..shown].iter().enumerate() {
			lines.push(format!(
				"{}. {}  (id={}, score={:.3})",
				index + 1,
				candidate.display_name,
				candidate.person_id,
				candidate.score,
			));
		}

		lines.push("Your choice:".to_string());

		self.store_pending(session_id, &candidates);

		trace.need_user_input = true;

		TurnResponse {
			answer: lines.join("\n"),
			person_ids: Vec::new(),
			candidates,
			trace,
		}
	}
}
