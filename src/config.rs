//! Run configuration: the `[LLM]` section of an Ini-style file, plus the
//! environment variables that carry API keys and endpoints. A typed struct
//! is assembled once at startup and logged for human-readable verbose
//! output.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Selects which [`crate::llm::LlmClient`] implementation to construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiType {
    /// Hosted OpenAI-compatible cloud endpoint.
    OpenAi,
    /// Self-hosted OpenAI-compatible endpoint (e.g. vLLM, Ollama's OpenAI shim).
    SelfHosted,
}

impl std::str::FromStr for ApiType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "self_hosted" | "selfhosted" | "self-hosted" => Ok(Self::SelfHosted),
            other => Err(format!("unknown API_TYPE: {other}")),
        }
    }
}

/// The `[LLM]` section, matching `spec.md` §6 exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_type: ApiType,
    pub model: String,
    pub embedding_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub freq_penalty: f32,
    pub presence_penalty: f32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub waiting_time_secs: f64,
    pub exponential_backoff_factor: f64,
    pub cache_api_calls: bool,
    pub cache_file_name: String,
    pub max_content_display_length: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_type: ApiType::OpenAi,
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            max_tokens: 1024,
            temperature: 1.0,
            top_p: 1.0,
            freq_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_secs: 60,
            max_attempts: 5,
            waiting_time_secs: 1.0,
            exponential_backoff_factor: 2.0,
            cache_api_calls: true,
            cache_file_name: "llm-cache.json".to_string(),
            max_content_display_length: 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading config file: {0}")]
    Io(String),
    #[error("missing required key [LLM].{0}")]
    MissingKey(&'static str),
    #[error("invalid value for [LLM].{key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl LlmConfig {
    /// Parses the `[LLM]` section of an Ini file at `path`. Missing keys fall
    /// back to [`LlmConfig::default`]'s value for that key.
    pub fn from_ini_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let ini = ini::Ini::load_from_file(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        let section = ini.section(Some("LLM"));
        let defaults = LlmConfig::default();

        macro_rules! get_or_default {
            ($key:literal, $default:expr, $parse:expr) => {
                match section.and_then(|s| s.get($key)) {
                    Some(raw) => $parse(raw).map_err(|_| ConfigError::InvalidValue {
                        key: $key,
                        value: raw.to_string(),
                    })?,
                    None => $default,
                }
            };
        }

        let api_type = get_or_default!(
            "API_TYPE",
            defaults.api_type,
            <ApiType as std::str::FromStr>::from_str
        );

        Ok(LlmConfig {
            api_type,
            model: section
                .and_then(|s| s.get("MODEL"))
                .map(str::to_string)
                .unwrap_or(defaults.model),
            embedding_model: section
                .and_then(|s| s.get("EMBEDDING_MODEL"))
                .map(str::to_string)
                .unwrap_or(defaults.embedding_model),
            max_tokens: get_or_default!("MAX_TOKENS", defaults.max_tokens, str::parse::<u32>),
            temperature: get_or_default!("TEMPERATURE", defaults.temperature, str::parse::<f32>),
            top_p: get_or_default!("TOP_P", defaults.top_p, str::parse::<f32>),
            freq_penalty: get_or_default!(
                "FREQ_PENALTY",
                defaults.freq_penalty,
                str::parse::<f32>
            ),
            presence_penalty: get_or_default!(
                "PRESENCE_PENALTY",
                defaults.presence_penalty,
                str::parse::<f32>
            ),
            timeout_secs: get_or_default!("TIMEOUT", defaults.timeout_secs, str::parse::<u64>),
            max_attempts: get_or_default!(
                "MAX_ATTEMPTS",
                defaults.max_attempts,
                str::parse::<u32>
            ),
            waiting_time_secs: get_or_default!(
                "WAITING_TIME",
                defaults.waiting_time_secs,
                str::parse::<f64>
            ),
            exponential_backoff_factor: get_or_default!(
                "EXPONENTIAL_BACKOFF_FACTOR",
                defaults.exponential_backoff_factor,
                str::parse::<f64>
            ),
            cache_api_calls: get_or_default!(
                "CACHE_API_CALLS",
                defaults.cache_api_calls,
                str::parse::<bool>
            ),
            cache_file_name: section
                .and_then(|s| s.get("CACHE_FILE_NAME"))
                .map(str::to_string)
                .unwrap_or(defaults.cache_file_name),
            max_content_display_length: get_or_default!(
                "MAX_CONTENT_DISPLAY_LENGTH",
                defaults.max_content_display_length,
                str::parse::<usize>
            ),
        })
    }
}

/// API credentials and endpoint, read from the environment (not the Ini file).
#[derive(Clone, Debug)]
pub struct ApiCredentials {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl ApiCredentials {
    /// Loads a `.env` file if present, then reads `SIMULATION_API_KEY` /
    /// `OPENAI_API_KEY` and `SIMULATION_API_BASE` from the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let api_key = std::env::var("SIMULATION_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok();
        let base_url = std::env::var("SIMULATION_API_BASE").ok();
        Self { api_key, base_url }
    }
}

/// Human-readable summary of the active configuration, for verbose startup
/// logging.
#[derive(Clone, Debug, Serialize)]
pub struct RunConfigSummary {
    pub api_type: ApiType,
    pub model: String,
    pub embedding_model: String,
    pub cache_api_calls: bool,
    pub cache_file_name: String,
}

impl From<&LlmConfig> for RunConfigSummary {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            api_type: cfg.api_type,
            model: cfg.model.clone(),
            embedding_model: cfg.embedding_model.clone(),
            cache_api_calls: cfg.cache_api_calls,
            cache_file_name: cfg.cache_file_name.clone(),
        }
    }
}
