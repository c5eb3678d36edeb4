use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

/// The itinerary stored once a trip completes. Stay points and day plans are
/// kept exactly as the AI produced them, in order.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TripPlan {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub total_days: u32,
    pub stay_points: Value,
    pub itinerary: Value,
    pub created_at: Option<DateTime<Utc>>,
}

impl TripPlan {
    pub fn new(trip_id: ObjectId, total_days: u32, stay_points: Value, itinerary: Value) -> Self {
        TripPlan {
            id: None,
            trip_id,
            total_days,
            stay_points,
            itinerary,
            created_at: Some(Utc::now()),
        }
    }
}
