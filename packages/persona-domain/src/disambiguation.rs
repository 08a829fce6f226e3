use serde::{Deserialize, Serialize};

use persona_config::Resolver;

use crate::types::Candidate;

/// Marker query recorded on candidates synthesized by the coreference path.
pub const COREF_SOURCE: &str = "[coref]";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "person_id")]
pub enum Decision {
	NoMatch,
	UserSelected(String),
	AmbiguousTop2,
	ClearTop1(String),
}
impl Decision {
	pub fn label(&self) -> &'static str {
		match self {
			Self::NoMatch => "no_match",
			Self::UserSelected(_) => "user_selected",
			Self::AmbiguousTop2 => "ambiguous_top2",
			Self::ClearTop1(_) => "clear_top1",
		}
	}

	pub fn person_id(&self) -> Option<&str> {
		match self {
			Self::UserSelected(person_id) | Self::ClearTop1(person_id) => Some(person_id),
			Self::NoMatch | Self::AmbiguousTop2 => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
	pub decision: Decision,
	/// Explicit choice that matched no candidate, kept for diagnostics.
	pub unmatched_choice: Option<String>,
}

/// The routing core. Pure function of the candidate list and the optional
/// explicit user choice, evaluated in fixed rule order:
///
/// 1. no match dominates everything (nothing to disambiguate),
/// 2. an explicit choice dominates automatic heuristics (user intent is
///    ground truth),
/// 3. a near-tied top pair asks the user,
/// 4. otherwise the top candidate wins.
///
/// An unmatched choice falls through to rules 3-4, so a repeated bad reply
/// degrades into a fresh clarifying prompt rather than an error.
pub fn decide(cfg: &Resolver, candidates: &[Candidate], choice: Option<&str>) -> Resolution {
	let top_score = candidates.first().map(|candidate| candidate.score);

	if top_score.is_none_or(|score| score < cfg.min_score) {
		return Resolution { decision: Decision::NoMatch, unmatched_choice: None };
	}

	let mut unmatched_choice = None;

	if let Some(raw) = choice {
		let trimmed = raw.trim();

		if !trimmed.is_empty() {
			if let Some(person_id) = resolve_choice(candidates, trimmed) {
				return Resolution {
					decision: Decision::UserSelected(person_id),
					unmatched_choice: None,
				};
			}

			unmatched_choice = Some(trimmed.to_string());
		}
	}

	if let [first, second, ..] = candidates
		&& first.score - second.score < cfg.ambiguity_delta
	{
		return Resolution { decision: Decision::AmbiguousTop2, unmatched_choice };
	}

	// `top_score` is `Some` past the no-match gate, so a first candidate exists.
	let top = candidates[0].person_id.clone();

	Resolution { decision: Decision::ClearTop1(top), unmatched_choice }
}

/// Resolves an explicit reply against the candidate list: 1-based index,
/// then exact person_id, then case-insensitive display name.
fn resolve_choice(candidates: &[Candidate], choice: &str) -> Option<String> {
	if choice.chars().all(|c| c.is_ascii_digit())
		&& let Ok(number) = choice.parse::<usize>()
		&& let Some(index) = number.checked_sub(1)
		&& let Some(candidate) = candidates.get(index)
	{
		return Some(candidate.person_id.clone());
	}
	if let Some(candidate) = candidates.iter().find(|candidate| candidate.person_id == choice) {
		return Some(candidate.person_id.clone());
	}

	let lowered = choice.to_lowercase();

	candidates
		.iter()
		.find(|candidate| candidate.display_name.to_lowercase() == lowered)
		.map(|candidate| candidate.person_id.clone())
}

/// Perfect-confidence candidate for the coreference reuse path. Feeding this
/// single candidate through `decide` deterministically yields `ClearTop1`,
/// which lets a continuation question skip re-querying the people index.
pub fn coref_candidate(person_id: &str) -> Candidate {
	Candidate {
		person_id: person_id.to_string(),
		display_name: String::new(),
		score: 1.0,
		source_query: COREF_SOURCE.to_string(),
	}
}
