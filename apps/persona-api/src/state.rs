use std::sync::Arc;

use persona_index::VectorIndex;
use persona_service::{CompletionProvider, DefaultCompletion, PersonaService, SearchProvider};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PersonaService>,
}
impl AppState {
	pub fn new(config: persona_config::Config) -> color_eyre::Result<Self> {
		let search = VectorIndex::new(&config.index, &config.providers.embedding)?;
		let completion = DefaultCompletion::new(config.providers.llm.clone());

		Ok(Self::with_providers(config, Arc::new(search), Arc::new(completion)))
	}

	/// Wires explicit oracle implementations, used by tests to inject mocks.
	pub fn with_providers(
		config: persona_config::Config,
		search: Arc<dyn SearchProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { service: Arc::new(PersonaService::new(config, search, completion)) }
	}
}
