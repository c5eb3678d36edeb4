//! Gemini integration for trip plan generation.
//!
//! [`GeminiClient`] posts a prompt to the `generateContent` endpoint, pulls
//! the (possibly fenced) JSON out of the candidates, and retries a bounded
//! number of times until the text parses into a [`StructuredTripPlan`].

pub mod client;
pub mod config;
pub mod response;

use async_trait::async_trait;
use thiserror::Error;

pub use client::GeminiClient;
pub use config::{GeminiConfig, GenerationConfig};
pub use response::{ResponseError, StructuredTripPlan};

#[derive(Debug, Error)]
pub enum AiServiceError {
    #[error("AI client configuration error: {0}")]
    Configuration(String),
    #[error("failed to generate a valid trip plan after {attempts} attempts")]
    GenerationFailed { attempts: u32 },
}

/// Source of structured trip plans. The orchestrator only depends on this
/// trait, so tests can drive it with scripted generators.
#[async_trait]
pub trait TripPlanGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<StructuredTripPlan, AiServiceError>;
}
