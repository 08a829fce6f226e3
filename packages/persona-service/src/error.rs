pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search backend unavailable: {message}")]
	SearchUnavailable { message: String },
	#[error("Generation backend unavailable: {message}")]
	GenerationUnavailable { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
}
