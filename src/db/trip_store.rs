use std::sync::Arc;

use async_trait::async_trait;
use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::oid::ObjectId, Client, Collection};
use thiserror::Error;

use crate::models::trip::{
    plan::TripPlan,
    prompt::{PromptStatus, TripPrompt},
    Trip, TripDetails, TripStatus,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: ObjectId },
    #[error("trip {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ObjectId,
        from: TripStatus,
        to: TripStatus,
    },
    #[error("prompt {0} was already resolved")]
    PromptAlreadyResolved(ObjectId),
    #[error("trip {0} already has a plan")]
    PlanExists(ObjectId),
    #[error("inserted {0} has no ObjectId")]
    MissingId(&'static str),
}

/// Final state of a prompt. A prompt leaves `Pending` exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    Completed { response: String },
    Failed,
}

impl PromptOutcome {
    pub fn status(&self) -> PromptStatus {
        match self {
            PromptOutcome::Completed { .. } => PromptStatus::Completed,
            PromptOutcome::Failed => PromptStatus::Failed,
        }
    }
}

/// Create/update primitives for the trip planning records.
///
/// Only the orchestration run that created a trip writes to it, so the store
/// needs no locking across trips. Transition rules are enforced here so a
/// record can never leave a terminal state.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn create_trip(&self, trip: &Trip) -> Result<ObjectId, StoreError>;

    /// Moves a trip to `status`; `is_completed` follows `status == Completed`.
    async fn update_trip_status(&self, trip_id: ObjectId, status: TripStatus)
        -> Result<(), StoreError>;

    async fn create_prompt(&self, prompt: &TripPrompt) -> Result<ObjectId, StoreError>;

    async fn resolve_prompt(&self, prompt_id: ObjectId, outcome: PromptOutcome)
        -> Result<(), StoreError>;

    /// Plans are written once; there is no update path.
    async fn create_plan(&self, plan: &TripPlan) -> Result<ObjectId, StoreError>;

    async fn find_trip(
        &self,
        tourist_id: ObjectId,
        trip_id: ObjectId,
    ) -> Result<Option<TripDetails>, StoreError>;

    async fn find_completed_trips(&self, tourist_id: ObjectId)
        -> Result<Vec<TripDetails>, StoreError>;
}

/// Groups prompts and plans under their trips, keeping trip order and prompt
/// creation order.
pub(crate) fn assemble_details(
    trips: Vec<Trip>,
    prompts: Vec<TripPrompt>,
    plans: Vec<TripPlan>,
) -> Vec<TripDetails> {
    trips
        .into_iter()
        .map(|trip| {
            let trip_prompts: Vec<TripPrompt> = prompts
                .iter()
                .filter(|prompt| Some(prompt.trip_id) == trip.id)
                .cloned()
                .collect();
            let plan = plans
                .iter()
                .find(|plan| Some(plan.trip_id) == trip.id)
                .cloned();
            TripDetails::new(trip, trip_prompts, plan)
        })
        .collect()
}

pub struct MongoTripStore {
    client: Arc<Client>,
    database: String,
}

impl MongoTripStore {
    pub fn new(client: Arc<Client>, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    fn trips(&self) -> Collection<Trip> {
        self.client.database(&self.database).collection("Trip")
    }

    fn prompts(&self) -> Collection<TripPrompt> {
        self.client.database(&self.database).collection("TripPrompt")
    }

    fn plans(&self) -> Collection<TripPlan> {
        self.client.database(&self.database).collection("TripPlan")
    }

    async fn load_details(&self, trips: Vec<Trip>) -> Result<Vec<TripDetails>, StoreError> {
        if trips.is_empty() {
            return Ok(Vec::new());
        }
        let trip_ids: Vec<ObjectId> = trips.iter().filter_map(|trip| trip.id).collect();

        let prompts: Vec<TripPrompt> = self
            .prompts()
            .find(doc! { "trip_id": { "$in": trip_ids.clone() } })
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        let plans: Vec<TripPlan> = self
            .plans()
            .find(doc! { "trip_id": { "$in": trip_ids } })
            .await?
            .try_collect()
            .await?;

        Ok(assemble_details(trips, prompts, plans))
    }
}

#[async_trait]
impl TripStore for MongoTripStore {
    async fn create_trip(&self, trip: &Trip) -> Result<ObjectId, StoreError> {
        let result = self.trips().insert_one(trip).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or(StoreError::MissingId("trip"))
    }

    async fn update_trip_status(
        &self,
        trip_id: ObjectId,
        status: TripStatus,
    ) -> Result<(), StoreError> {
        let allowed: Vec<&str> = status
            .predecessors()
            .iter()
            .map(TripStatus::as_str)
            .collect();

        let filter = doc! { "_id": trip_id, "status": { "$in": allowed } };
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "is_completed": status == TripStatus::Completed,
                "updated_at": Utc::now().to_rfc3339(),
            }
        };

        let result = self.trips().update_one(filter, update).await?;
        if result.matched_count == 1 {
            return Ok(());
        }

        match self.trips().find_one(doc! { "_id": trip_id }).await? {
            Some(trip) => Err(StoreError::InvalidTransition {
                id: trip_id,
                from: trip.status,
                to: status,
            }),
            None => Err(StoreError::NotFound {
                entity: "trip",
                id: trip_id,
            }),
        }
    }

    async fn create_prompt(&self, prompt: &TripPrompt) -> Result<ObjectId, StoreError> {
        let result = self.prompts().insert_one(prompt).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or(StoreError::MissingId("trip prompt"))
    }

    async fn resolve_prompt(
        &self,
        prompt_id: ObjectId,
        outcome: PromptOutcome,
    ) -> Result<(), StoreError> {
        let mut fields = doc! {
            "status": outcome.status().as_str(),
            "updated_at": Utc::now().to_rfc3339(),
        };
        if let PromptOutcome::Completed { response } = outcome {
            fields.insert("response", response);
        }

        let filter = doc! { "_id": prompt_id, "status": PromptStatus::Pending.as_str() };
        let result = self
            .prompts()
            .update_one(filter, doc! { "$set": fields })
            .await?;
        if result.matched_count == 1 {
            return Ok(());
        }

        match self.prompts().find_one(doc! { "_id": prompt_id }).await? {
            Some(_) => Err(StoreError::PromptAlreadyResolved(prompt_id)),
            None => Err(StoreError::NotFound {
                entity: "trip prompt",
                id: prompt_id,
            }),
        }
    }

    async fn create_plan(&self, plan: &TripPlan) -> Result<ObjectId, StoreError> {
        if self
            .plans()
            .find_one(doc! { "trip_id": plan.trip_id })
            .await?
            .is_some()
        {
            return Err(StoreError::PlanExists(plan.trip_id));
        }

        let result = self.plans().insert_one(plan).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or(StoreError::MissingId("trip plan"))
    }

    async fn find_trip(
        &self,
        tourist_id: ObjectId,
        trip_id: ObjectId,
    ) -> Result<Option<TripDetails>, StoreError> {
        let trip = self
            .trips()
            .find_one(doc! { "_id": trip_id, "tourist_id": tourist_id })
            .await?;

        match trip {
            Some(trip) => Ok(self.load_details(vec![trip]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn find_completed_trips(
        &self,
        tourist_id: ObjectId,
    ) -> Result<Vec<TripDetails>, StoreError> {
        let trips: Vec<Trip> = self
            .trips()
            .find(doc! { "tourist_id": tourist_id, "is_completed": true })
            .sort(doc! { "_id": -1 })
            .await?
            .try_collect()
            .await?;

        self.load_details(trips).await
    }
}
