use actix_web::{web, HttpResponse, Responder};
use log::error;
use mongodb::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::db::mongo::ping;

/// What the health endpoint can see of the running configuration.
#[derive(Clone)]
pub struct HealthContext {
    pub mongo: Option<Arc<Client>>,
    pub gemini_endpoint: String,
    pub gemini_key_hint: String,
}

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(context: web::Data<HealthContext>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(context.mongo.as_deref()).await;
    health
        .services
        .insert("mongodb".to_string(), mongo_result.clone());

    let gemini_result = check_gemini(&context);
    health
        .services
        .insert("gemini".to_string(), gemini_result.clone());

    if mongo_result.status != "ok" || gemini_result.status != "ok" {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(client: Option<&Client>) -> ServiceStatus {
    let Some(client) = client else {
        return ServiceStatus {
            status: "unavailable".to_string(),
            details: Some("Running without MongoDB".to_string()),
        };
    };

    match ping(client).await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Connected successfully to MongoDB".to_string()),
        },
        Err(e) => {
            error!("MongoDB health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some("Failed to reach MongoDB".to_string()),
            }
        }
    }
}

fn check_gemini(context: &HealthContext) -> ServiceStatus {
    ServiceStatus {
        status: "ok".to_string(),
        details: Some(format!(
            "Gemini API key configured ({}) for {}",
            context.gemini_key_hint, context.gemini_endpoint
        )),
    }
}
