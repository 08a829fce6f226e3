pub mod context;
pub mod disambiguation;
pub mod memory;
pub mod types;

pub use context::{render_context, render_history, select_context};
pub use disambiguation::{Decision, Resolution, coref_candidate, decide};
pub use memory::MemoryStore;
pub use types::{Candidate, Chunk, Role, Turn};
