//! Embedding contract for semantic memory, decoupled from the LLM client
//! trait so tests can swap in a cheap deterministic embedder.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::llm::LlmClient;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;
}

/// Adapts any [`LlmClient`] into an [`Embedder`], so semantic memory uses
/// the same client the agent uses for chat completions.
pub struct LlmEmbedder {
    client: Arc<dyn LlmClient>,
}

impl LlmEmbedder {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Embedder for LlmEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        self.client
            .embed(text)
            .await
            .map_err(|e| MemoryError::Embedding(e.to_string()))
    }
}
