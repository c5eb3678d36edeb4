use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;
use url::Url;

use super::config::{GeminiConfig, GenerationConfig};
use super::response::{GenerateContentResponse, ResponseError, StructuredTripPlan};
use super::{AiServiceError, TripPlanGenerator};
use crate::services::prompt_builder::wrap_with_response_format;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(text: &'a str, generation_config: &'a GenerationConfig) -> Self {
        Self {
            contents: [RequestContent {
                parts: [RequestPart { text }],
            }],
            generation_config,
        }
    }
}

/// Why a single attempt did not produce a plan. Never leaves this module:
/// every variant is retried and the caller only sees `GenerationFailed`.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini API returned status {0}")]
    Status(StatusCode),
    #[error("response contained no candidate text")]
    NoCandidateText,
    #[error(transparent)]
    Response(#[from] ResponseError),
}

pub struct GeminiClient {
    http_client: Client,
    endpoint: Url,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiServiceError> {
        if config.api_key.trim().is_empty() {
            return Err(AiServiceError::Configuration(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            AiServiceError::Configuration(format!(
                "invalid Gemini endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| {
                AiServiceError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint,
            config,
        })
    }

    async fn attempt(
        &self,
        request: &GenerateContentRequest<'_>,
    ) -> Result<StructuredTripPlan, AttemptError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        let payload: GenerateContentResponse = response.json().await?;
        first_valid_plan(&payload)
    }
}

/// The first candidate text that parses and validates wins. If none does, the
/// failure of the last text examined is reported.
fn first_valid_plan(payload: &GenerateContentResponse) -> Result<StructuredTripPlan, AttemptError> {
    let mut last_error = None;
    for text in payload.texts() {
        match StructuredTripPlan::parse(text) {
            Ok(plan) => return Ok(plan),
            Err(e) => {
                if let ResponseError::Parse(_) = e {
                    debug!(
                        "Unparseable candidate text: {}",
                        text.chars().take(200).collect::<String>()
                    );
                }
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(AttemptError::Response(e)),
        None => Err(AttemptError::NoCandidateText),
    }
}

#[async_trait]
impl TripPlanGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<StructuredTripPlan, AiServiceError> {
        info!(
            "Generating trip plan with Gemini (prompt length {})",
            prompt.len()
        );

        let text = wrap_with_response_format(prompt);
        let request = GenerateContentRequest::new(&text, &self.config.generation);
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            debug!("Sending request to Gemini (attempt {}/{})", attempt, max_attempts);

            match self.attempt(&request).await {
                Ok(plan) => {
                    info!(
                        "Gemini returned a valid trip plan on attempt {}/{}",
                        attempt, max_attempts
                    );
                    return Ok(plan);
                }
                Err(e) => warn!("Gemini attempt {}/{} failed: {}", attempt, max_attempts, e),
            }

            if attempt < max_attempts {
                sleep(self.config.retry_delay).await;
            }
        }

        error!(
            "Giving up on Gemini trip plan generation after {} attempts",
            max_attempts
        );
        Err(AiServiceError::GenerationFailed {
            attempts: max_attempts,
        })
    }
}
