//! Agent memory: an append-only episodic log plus a vector-indexed semantic
//! store over ingested documents and web pages (`spec.md` §4.2, §4.3).

pub mod embedder;
pub mod episodic;
pub mod semantic;

pub use embedder::{Embedder, LlmEmbedder};
pub use episodic::{EpisodicEvent, EpisodicMemory, EventPayload, Role};
pub use semantic::{Document, RelevantSnippet, SemanticMemory, SemanticMemorySnapshot};
