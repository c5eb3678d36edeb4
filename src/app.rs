use std::sync::Arc;

use actix_web::web;

use crate::db::districts::DistrictDirectory;
use crate::error::ApiError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::UserRole;
use crate::models::trip::request::ValidationErrors;
use crate::routes;
use crate::routes::health::HealthContext;
use crate::services::trip_orchestrator::TripOrchestrator;

/// Shared handles for every worker. Cloning is cheap; nothing in here is
/// mutable per request.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TripOrchestrator>,
    pub districts: Arc<dyn DistrictDirectory>,
    pub jwt_secret: String,
    pub health: HealthContext,
}

pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::from(state.orchestrator.clone()))
        .app_data(web::Data::from(state.districts.clone()))
        .app_data(web::Data::new(state.health.clone()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            let mut errors = ValidationErrors::default();
            errors.add("body", err.to_string());
            ApiError::Validation(errors).into()
        }))
        .route("/health", web::get().to(routes::health::health_check))
        .service(
            web::scope("/api")
                .route(
                    "/districts",
                    web::get().to(routes::district::get_districts),
                )
                .service(
                    // Wraps run outermost-last: authenticate, then check the role.
                    web::scope("/trips")
                        .wrap(RequireRole::new(UserRole::Tourist))
                        .wrap(AuthMiddleware::new(state.jwt_secret.clone()))
                        .route("/plan", web::post().to(routes::trip::plan_trip))
                        .route(
                            "/completed",
                            web::get().to(routes::trip::get_completed_trips),
                        )
                        .route("/{id}", web::get().to(routes::trip::get_trip)),
                ),
        );
}
