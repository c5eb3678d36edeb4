use std::env;

use thiserror::Error;

use crate::services::gemini::{AiServiceError, GeminiConfig};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE: &str = "TripPlanner";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(transparent)]
    Gemini(#[from] AiServiceError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database: String,
    pub jwt_secret: String,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| HOST.to_string());
        let port = match env::var("PORT") {
            Ok(port) => port.parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{}", e),
            })?,
            Err(_) => PORT,
        };

        Ok(Self {
            host,
            port,
            mongodb_uri: required("MONGODB_URI")?,
            database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| DATABASE.to_string()),
            jwt_secret: required("JWT_SECRET")?,
            gemini: GeminiConfig::from_env()?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}
