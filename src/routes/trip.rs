use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::db::districts::DistrictDirectory;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::trip::request::{PlanTripRequest, ValidationErrors};
use crate::models::trip::response::TripResponse;
use crate::services::trip_orchestrator::TripOrchestrator;

/*
    POST /api/trips/plan
*/
pub async fn plan_trip(
    user: AuthenticatedUser,
    orchestrator: web::Data<TripOrchestrator>,
    districts: web::Data<dyn DistrictDirectory>,
    input: web::Json<PlanTripRequest>,
) -> Result<HttpResponse, ApiError> {
    let tourist_id = user.tourist_id()?;
    info!("Trip plan requested by {}", user.email);

    let new_trip = input.into_inner().validate(Utc::now().date_naive())?;
    check_destinations(districts.get_ref(), &new_trip.destinations).await?;

    let trip = orchestrator.plan_trip(tourist_id, new_trip).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Trip plan created successfully",
        "trip": TripResponse::from(trip),
    })))
}

/*
    GET /api/trips/completed
*/
pub async fn get_completed_trips(
    user: AuthenticatedUser,
    orchestrator: web::Data<TripOrchestrator>,
) -> Result<HttpResponse, ApiError> {
    let trips: Vec<TripResponse> = orchestrator
        .completed_trips(user.tourist_id()?)
        .await?
        .into_iter()
        .map(TripResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "trips": trips })))
}

/*
    GET /api/trips/{id}
*/
pub async fn get_trip(
    user: AuthenticatedUser,
    orchestrator: web::Data<TripOrchestrator>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tourist_id = user.tourist_id()?;
    let trip_id = ObjectId::parse_str(path.into_inner().as_str())
        .map_err(|_| ApiError::NotFound("Trip not found".to_string()))?;

    match orchestrator.get_trip(tourist_id, trip_id).await? {
        Some(trip) => Ok(HttpResponse::Ok().json(json!({ "trip": TripResponse::from(trip) }))),
        None => Err(ApiError::NotFound("Trip not found".to_string())),
    }
}

async fn check_destinations(
    districts: &dyn DistrictDirectory,
    destinations: &[i64],
) -> Result<(), ApiError> {
    let known = districts.find_districts(destinations).await?;

    let mut errors = ValidationErrors::default();
    for (index, id) in destinations.iter().enumerate() {
        if !known.iter().any(|district| district.district_id == *id) {
            errors.add(
                format!("destinations.{}", index),
                "The selected destination is invalid.",
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}
