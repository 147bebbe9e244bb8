//! Real LLM client: chat completion and embeddings over an OpenAI-compatible
//! API (cloud or self-hosted, selected purely by `base_url`), wrapped with
//! the cache + retry algorithm from `spec.md` §4.1.

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::{request_digest, sanitize, ChatMessage, LlmClient, LlmParams, RetryPolicy, Role};
use crate::cache::Cache;
use crate::error::LlmError;

fn to_openai_messages(messages: &[ChatMessage]) -> Vec<ChatCompletionRequestMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(m.content.as_str()),
            ),
            Role::User => ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage::from(m.content.as_str()),
            ),
            Role::Assistant => ChatCompletionRequestMessage::Assistant(
                ChatCompletionRequestAssistantMessage::from(m.content.as_str()),
            ),
        })
        .collect()
}

/// Chat-completion client over any OpenAI-compatible endpoint. Selection
/// between the hosted cloud API and a self-hosted endpoint is purely a
/// matter of `base_url` (`spec.md` §6: "selection is by config key").
pub struct ChatCompletionClient {
    client: Client<OpenAIConfig>,
    retry: RetryPolicy,
    embedding_model: String,
    cache: Option<Arc<dyn Cache<String, ChatMessage>>>,
    cache_enabled: bool,
}

impl ChatCompletionClient {
    /// Builds a client against the hosted OpenAI API.
    pub fn cloud(api_key: impl Into<String>, retry: RetryPolicy, embedding_model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self {
            client: Client::with_config(config),
            retry,
            embedding_model: embedding_model.into(),
            cache: None,
            cache_enabled: false,
        }
    }

    /// Builds a client against a self-hosted OpenAI-compatible endpoint.
    pub fn self_hosted(
        base_url: impl Into<String>,
        api_key: Option<String>,
        retry: RetryPolicy,
        embedding_model: impl Into<String>,
    ) -> Self {
        let mut config = OpenAIConfig::new().with_api_base(base_url.into());
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        Self {
            client: Client::with_config(config),
            retry,
            embedding_model: embedding_model.into(),
            cache: None,
            cache_enabled: false,
        }
    }

    /// Attaches a persistent cache keyed by request digest (`spec.md` §4.1).
    pub fn with_cache(mut self, cache: Arc<dyn Cache<String, ChatMessage>>) -> Self {
        self.cache = Some(cache);
        self.cache_enabled = true;
        self
    }

    async fn call_once(&self, messages: &[ChatMessage], params: &LlmParams) -> Result<ChatMessage, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(params.model.clone());
        args.messages(to_openai_messages(messages));
        args.temperature(params.temperature);
        args.top_p(params.top_p);
        args.max_tokens(params.max_tokens);
        args.frequency_penalty(params.frequency_penalty);
        args.presence_penalty(params.presence_penalty);
        args.n(params.n);
        if !params.stop.is_empty() {
            args.stop(params.stop.clone());
        }

        let request = args
            .build()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

        let content = sanitize(&choice.message.content.unwrap_or_default());
        Ok(ChatMessage {
            role: Role::Assistant,
            content,
        })
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn send_message(&self, messages: &[ChatMessage], params: &LlmParams) -> Option<ChatMessage> {
        let digest = request_digest(params, messages);

        if self.cache_enabled {
            if let Some(cache) = &self.cache {
                if let Some(cached) = cache.get(&digest).await {
                    debug!(digest = %digest, "LLM cache hit");
                    return Some(cached);
                }
            }
        }

        let mut attempt = 0u32;
        loop {
            if attempt > 0 {
                let wait = self.retry.wait_for(attempt - 1);
                if wait.as_secs_f64() > 0.0 {
                    tokio::time::sleep(wait).await;
                }
            }

            match self.call_once(messages, params).await {
                Ok(response) => {
                    if self.cache_enabled {
                        if let Some(cache) = &self.cache {
                            let _ = cache.set(digest.clone(), response.clone()).await;
                            let _ = cache.flush().await;
                        }
                    }
                    return Some(response);
                }
                Err(err) => {
                    if !self.retry.is_retryable(&err) {
                        warn!(error = %err, "LLM call failed with non-retryable error");
                        return None;
                    }
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        warn!(error = %err, attempts = attempt, "LLM retries exhausted");
                        return None;
                    }
                    debug!(error = %err, attempt, "LLM call failed, retrying");
                }
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = CreateEmbeddingRequest {
            input: EmbeddingInput::String(text.to_string()),
            model: self.embedding_model.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::MalformedResponse("no embedding returned".to_string()))
    }
}
