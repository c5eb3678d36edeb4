use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::Value;

use super::plan::TripPlan;
use super::prompt::{PromptPhase, PromptStatus, TripPrompt};
use super::{TripDetails, TripStatus, TripType};

fn hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

/// A trip as returned over HTTP. Ids are hex strings, matching the ids
/// accepted by `GET /api/trips/{id}` and reported in error bodies.
#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: String,
    pub tourist_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trip_type: TripType,
    pub destinations: Vec<i64>,
    pub interests: Vec<String>,
    pub status: TripStatus,
    pub is_completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub prompts: Vec<TripPromptResponse>,
    pub plan: Option<TripPlanResponse>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub district_names: BTreeMap<i64, String>,
}

#[derive(Debug, Serialize)]
pub struct TripPromptResponse {
    pub id: String,
    pub trip_id: String,
    pub phase: PromptPhase,
    pub prompt: String,
    pub response: Option<String>,
    pub status: PromptStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TripPlanResponse {
    pub id: String,
    pub trip_id: String,
    pub total_days: u32,
    pub stay_points: Value,
    pub itinerary: Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<TripPrompt> for TripPromptResponse {
    fn from(prompt: TripPrompt) -> Self {
        TripPromptResponse {
            id: hex(prompt.id),
            trip_id: prompt.trip_id.to_hex(),
            phase: prompt.phase,
            prompt: prompt.prompt,
            response: prompt.response,
            status: prompt.status,
            created_at: prompt.created_at,
            updated_at: prompt.updated_at,
        }
    }
}

impl From<TripPlan> for TripPlanResponse {
    fn from(plan: TripPlan) -> Self {
        TripPlanResponse {
            id: hex(plan.id),
            trip_id: plan.trip_id.to_hex(),
            total_days: plan.total_days,
            stay_points: plan.stay_points,
            itinerary: plan.itinerary,
            created_at: plan.created_at,
        }
    }
}

impl From<TripDetails> for TripResponse {
    fn from(details: TripDetails) -> Self {
        let trip = details.trip;
        TripResponse {
            id: hex(trip.id),
            tourist_id: trip.tourist_id.to_hex(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            trip_type: trip.trip_type,
            destinations: trip.destinations,
            interests: trip.interests,
            status: trip.status,
            is_completed: trip.is_completed,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
            prompts: details.prompts.into_iter().map(Into::into).collect(),
            plan: details.plan.map(Into::into),
            district_names: details.district_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::models::trip::Trip;

    #[test]
    fn test_ids_serialize_as_hex() {
        let trip_id = ObjectId::new();
        let tourist_id = ObjectId::new();
        let trip = Trip {
            id: Some(trip_id),
            tourist_id,
            start_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
            trip_type: TripType::Partner,
            destinations: vec![4],
            interests: vec!["surfing".to_string()],
            status: TripStatus::Completed,
            is_completed: true,
            created_at: None,
            updated_at: None,
        };
        let mut prompt = TripPrompt::pending(trip_id, PromptPhase::Detail, "prompt".to_string());
        prompt.id = Some(ObjectId::new());
        let plan = TripPlan::new(trip_id, 1, json!([]), json!([]));

        let body = serde_json::to_value(TripResponse::from(TripDetails::new(
            trip,
            vec![prompt],
            Some(plan),
        )))
        .unwrap();

        assert_eq!(body["id"], trip_id.to_hex());
        assert_eq!(body["tourist_id"], tourist_id.to_hex());
        assert_eq!(body["prompts"][0]["trip_id"], trip_id.to_hex());
        assert!(body["prompts"][0]["id"].is_string());
        assert!(body["prompts"][0]["response"].is_null());
        assert_eq!(body["plan"]["trip_id"], trip_id.to_hex());
        assert!(body.get("_id").is_none());
    }
}
