use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

pub mod plan;
pub mod prompt;
pub mod request;
pub mod response;

use plan::TripPlan;
use prompt::TripPrompt;
use request::NewTrip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Solo,
    Partner,
    Friends,
    Family,
}

impl TripType {
    pub const ALL: [TripType; 4] = [
        TripType::Solo,
        TripType::Partner,
        TripType::Friends,
        TripType::Family,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        TripType::ALL
            .into_iter()
            .find(|trip_type| trip_type.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::Solo => "solo",
            TripType::Partner => "partner",
            TripType::Friends => "friends",
            TripType::Family => "family",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a trip planning run.
///
/// `Pending -> Processing -> Completed`, with `Failed` reachable from either
/// non-terminal state. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Pending => "pending",
            TripStatus::Processing => "processing",
            TripStatus::Completed => "completed",
            TripStatus::Failed => "failed",
        }
    }

    /// States a trip may be in immediately before moving to `self`.
    pub fn predecessors(&self) -> &'static [TripStatus] {
        match self {
            TripStatus::Pending => &[],
            TripStatus::Processing => &[TripStatus::Pending],
            TripStatus::Completed => &[TripStatus::Processing],
            TripStatus::Failed => &[TripStatus::Pending, TripStatus::Processing],
        }
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        next.predecessors().contains(self)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Trip {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub tourist_id: ObjectId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trip_type: TripType,
    pub destinations: Vec<i64>,
    pub interests: Vec<String>,
    pub status: TripStatus,
    pub is_completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn pending(tourist_id: ObjectId, new_trip: NewTrip) -> Self {
        let now = Utc::now();
        Trip {
            id: None,
            tourist_id,
            start_date: new_trip.start_date,
            end_date: new_trip.end_date,
            trip_type: new_trip.trip_type,
            destinations: new_trip.destinations,
            interests: new_trip.interests,
            status: TripStatus::Pending,
            is_completed: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// A trip loaded together with its prompts and plan. Rendered for clients
/// through [`response::TripResponse`].
#[derive(Debug, Clone)]
pub struct TripDetails {
    pub trip: Trip,
    pub prompts: Vec<TripPrompt>,
    pub plan: Option<TripPlan>,
    pub district_names: BTreeMap<i64, String>,
}

impl TripDetails {
    pub fn new(trip: Trip, prompts: Vec<TripPrompt>, plan: Option<TripPlan>) -> Self {
        TripDetails {
            trip,
            prompts,
            plan,
            district_names: BTreeMap::new(),
        }
    }

    pub fn with_district_names(mut self, district_names: BTreeMap<i64, String>) -> Self {
        self.district_names = district_names;
        self
    }
}
