use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptPhase {
    Detail,
    Itinerary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    Pending,
    Completed,
    Failed,
}

impl PromptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStatus::Pending => "pending",
            PromptStatus::Completed => "completed",
            PromptStatus::Failed => "failed",
        }
    }
}

/// One exchange with the AI service. Resolved exactly once, from `Pending`
/// to either `Completed` (with a response) or `Failed`.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TripPrompt {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub trip_id: ObjectId,
    pub phase: PromptPhase,
    pub prompt: String,
    #[serialize_always]
    pub response: Option<String>,
    pub status: PromptStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TripPrompt {
    pub fn pending(trip_id: ObjectId, phase: PromptPhase, prompt: String) -> Self {
        let now = Utc::now();
        TripPrompt {
            id: None,
            trip_id,
            phase,
            prompt,
            response: None,
            status: PromptStatus::Pending,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}
