use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, LlmClient, LlmParams, Role};
use crate::error::LlmError;

/// Fixed or scripted responses, for tests. If a script is provided it is
/// consumed in order (last entry repeats once exhausted); otherwise every
/// call returns `fixed_content`.
pub struct MockLlm {
    fixed_content: String,
    script: Mutex<Vec<String>>,
    embedding_dim: usize,
}

impl MockLlm {
    pub fn new(fixed_content: impl Into<String>) -> Self {
        Self {
            fixed_content: fixed_content.into(),
            script: Mutex::new(Vec::new()),
            embedding_dim: 8,
        }
    }

    /// A scripted sequence of responses, returned one per call in order.
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            fixed_content: String::new(),
            script: Mutex::new(responses),
            embedding_dim: 8,
        }
    }

    fn next_content(&self) -> String {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            self.fixed_content.clone()
        } else if script.len() == 1 {
            script[0].clone()
        } else {
            script.remove(0)
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn send_message(&self, _messages: &[ChatMessage], _params: &LlmParams) -> Option<ChatMessage> {
        Some(ChatMessage {
            role: Role::Assistant,
            content: self.next_content(),
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        // Deterministic pseudo-embedding derived from byte values, stable
        // across calls so tests can assert on similarity ordering.
        let mut vec = vec![0.0f32; self.embedding_dim];
        for (i, byte) in text.bytes().enumerate() {
            vec[i % self.embedding_dim] += byte as f32;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_content_repeats() {
        let llm = MockLlm::new("same every time");
        let a = llm.send_message(&[], &LlmParams::default()).await.unwrap();
        let b = llm.send_message(&[], &LlmParams::default()).await.unwrap();
        assert_eq!(a.content, "same every time");
        assert_eq!(b.content, "same every time");
    }

    #[tokio::test]
    async fn scripted_responses_consumed_in_order() {
        let llm = MockLlm::scripted(vec!["first".into(), "second".into()]);
        let a = llm.send_message(&[], &LlmParams::default()).await.unwrap();
        let b = llm.send_message(&[], &LlmParams::default()).await.unwrap();
        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let llm = MockLlm::new("x");
        let a = llm.embed("hello world").await.unwrap();
        let b = llm.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }
}
