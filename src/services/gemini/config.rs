use std::env;
use std::time::Duration;

use serde::Serialize;

use super::AiServiceError;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

/// Sampling parameters sent with every request. Kept low so the model sticks
/// to the requested JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_k: 1,
            top_p: 0.1,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub generation: GenerationConfig,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            max_attempts: MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            generation: GenerationConfig::default(),
        }
    }

    /// Reads `GEMINI_API_KEY` (required) and `GEMINI_API_URL` (optional).
    pub fn from_env() -> Result<Self, AiServiceError> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AiServiceError::Configuration(
                    "GEMINI_API_KEY is not set in environment variables".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(endpoint) = env::var("GEMINI_API_URL") {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// API key with everything but the first and last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let key = &self.api_key;
        if key.len() > 8 && key.is_ascii() {
            format!("{}***{}", &key[..4], &key[key.len() - 4..])
        } else {
            "***".to_string()
        }
    }
}
