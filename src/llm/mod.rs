//! LLM client abstraction: chat completion and embeddings, with a
//! content-hash cache and exponential-backoff retry.
//!
//! One entry point returning assistant text, widened per `spec.md` §4.1 to
//! also cover embeddings and to make retry an explicit [`RetryPolicy`]
//! object rather than exception-driven control flow (per the REDESIGN FLAGS
//! note in `spec.md` §9).

mod client;
mod mock;
mod retry;
mod sanitize;

pub use client::ChatCompletionClient;
pub use mock::MockLlm;
pub use retry::RetryPolicy;
pub use sanitize::sanitize;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LlmError;

/// One message in a chat completion request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters, matching `spec.md` §4.1 and the `[LLM]` config
/// section in `spec.md` §6.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LlmParams {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
    pub n: u32,
    pub response_format_schema: Option<serde_json::Value>,
}

impl Default for LlmParams {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 1.0,
            top_p: 1.0,
            max_tokens: 1024,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: Vec::new(),
            n: 1,
            response_format_schema: None,
        }
    }
}

/// Computes a stable digest over `(model, all params, messages)`, used both
/// as the cache key and across process restarts (`spec.md` §4.1: "The cache
/// store ... survives across processes").
pub fn request_digest(params: &LlmParams, messages: &[ChatMessage]) -> String {
    let canonical = serde_json::json!({
        "params": params,
        "messages": messages,
    });
    let bytes = serde_json::to_vec(&canonical).expect("LlmParams/ChatMessage are always JSON-serializable");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).unwrap();
    }
    s
}

/// Chat-completion and embedding contract. Implementations: [`MockLlm`]
/// (fixed/scripted response, for tests) and [`ChatCompletionClient`] (real
/// API, cloud or self-hosted, behind the same trait per `spec.md` §6).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `messages` with `params`. Returns `None` when the request is
    /// non-retryable (bad request, unsupported params) or every retry is
    /// exhausted — per `spec.md` §4.1/§7, callers must handle `None`, it is
    /// not surfaced as an error.
    async fn send_message(&self, messages: &[ChatMessage], params: &LlmParams) -> Option<ChatMessage>;

    /// Embeds `text` into a fixed-size vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}
