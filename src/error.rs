use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use thiserror::Error;

use crate::db::trip_store::StoreError;
use crate::models::trip::request::ValidationErrors;
use crate::services::trip_orchestrator::TripPlanningError;

/// Errors returned by the HTTP handlers. The body always names the category
/// and never carries raw AI output or internal error text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(ValidationErrors),
    #[error("Failed to generate trip plan")]
    Generation { trip_id: Option<ObjectId> },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("An unexpected error occurred")]
    Unexpected,
}

impl ApiError {
    fn category(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Generation { .. } => "generation_failed",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Unexpected => "unexpected_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation { .. } => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.category(),
            "message": self.to_string(),
        });

        match self {
            ApiError::Validation(errors) => body["errors"] = json!(errors),
            ApiError::Generation {
                trip_id: Some(trip_id),
            } => body["trip_id"] = json!(trip_id.to_hex()),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!("Store error while handling request: {}", err);
        ApiError::Unexpected
    }
}

impl From<TripPlanningError> for ApiError {
    fn from(err: TripPlanningError) -> Self {
        match err {
            TripPlanningError::Generation { trip_id, .. }
            | TripPlanningError::UnusablePlan { trip_id, .. } => ApiError::Generation {
                trip_id: Some(trip_id),
            },
            TripPlanningError::Store(e) => e.into(),
        }
    }
}
