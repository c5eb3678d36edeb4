//! In-process implementations of the store traits. They enforce the same
//! transition rules as the MongoDB stores and back the test suite.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::districts::DistrictDirectory;
use super::trip_store::{assemble_details, PromptOutcome, StoreError, TripStore};
use crate::models::district::District;
use crate::models::trip::{
    plan::TripPlan,
    prompt::{PromptStatus, TripPrompt},
    Trip, TripDetails, TripStatus,
};

#[derive(Default)]
struct Records {
    trips: Vec<Trip>,
    prompts: Vec<TripPrompt>,
    plans: Vec<TripPlan>,
}

#[derive(Default)]
pub struct MemoryTripStore {
    records: RwLock<Records>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn trips(&self) -> Vec<Trip> {
        self.records.read().await.trips.clone()
    }

    pub async fn prompts_for(&self, trip_id: ObjectId) -> Vec<TripPrompt> {
        self.records
            .read()
            .await
            .prompts
            .iter()
            .filter(|prompt| prompt.trip_id == trip_id)
            .cloned()
            .collect()
    }

    pub async fn plan_for(&self, trip_id: ObjectId) -> Option<TripPlan> {
        self.records
            .read()
            .await
            .plans
            .iter()
            .find(|plan| plan.trip_id == trip_id)
            .cloned()
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn create_trip(&self, trip: &Trip) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        let mut stored = trip.clone();
        stored.id = Some(id);
        self.records.write().await.trips.push(stored);
        Ok(id)
    }

    async fn update_trip_status(
        &self,
        trip_id: ObjectId,
        status: TripStatus,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let trip = records
            .trips
            .iter_mut()
            .find(|trip| trip.id == Some(trip_id))
            .ok_or(StoreError::NotFound {
                entity: "trip",
                id: trip_id,
            })?;

        if !trip.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: trip_id,
                from: trip.status,
                to: status,
            });
        }

        trip.status = status;
        trip.is_completed = status == TripStatus::Completed;
        trip.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn create_prompt(&self, prompt: &TripPrompt) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        let mut stored = prompt.clone();
        stored.id = Some(id);
        self.records.write().await.prompts.push(stored);
        Ok(id)
    }

    async fn resolve_prompt(
        &self,
        prompt_id: ObjectId,
        outcome: PromptOutcome,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let prompt = records
            .prompts
            .iter_mut()
            .find(|prompt| prompt.id == Some(prompt_id))
            .ok_or(StoreError::NotFound {
                entity: "trip prompt",
                id: prompt_id,
            })?;

        if prompt.status != PromptStatus::Pending {
            return Err(StoreError::PromptAlreadyResolved(prompt_id));
        }

        prompt.status = outcome.status();
        if let PromptOutcome::Completed { response } = outcome {
            prompt.response = Some(response);
        }
        prompt.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn create_plan(&self, plan: &TripPlan) -> Result<ObjectId, StoreError> {
        let mut records = self.records.write().await;
        if records.plans.iter().any(|existing| existing.trip_id == plan.trip_id) {
            return Err(StoreError::PlanExists(plan.trip_id));
        }

        let id = ObjectId::new();
        let mut stored = plan.clone();
        stored.id = Some(id);
        records.plans.push(stored);
        Ok(id)
    }

    async fn find_trip(
        &self,
        tourist_id: ObjectId,
        trip_id: ObjectId,
    ) -> Result<Option<TripDetails>, StoreError> {
        let records = self.records.read().await;
        let trips: Vec<Trip> = records
            .trips
            .iter()
            .filter(|trip| trip.id == Some(trip_id) && trip.tourist_id == tourist_id)
            .cloned()
            .collect();

        Ok(
            assemble_details(trips, records.prompts.clone(), records.plans.clone())
                .into_iter()
                .next(),
        )
    }

    async fn find_completed_trips(
        &self,
        tourist_id: ObjectId,
    ) -> Result<Vec<TripDetails>, StoreError> {
        let records = self.records.read().await;
        let trips: Vec<Trip> = records
            .trips
            .iter()
            .rev()
            .filter(|trip| trip.tourist_id == tourist_id && trip.is_completed)
            .cloned()
            .collect();

        Ok(assemble_details(
            trips,
            records.prompts.clone(),
            records.plans.clone(),
        ))
    }
}

pub struct MemoryDistrictDirectory {
    districts: Vec<District>,
}

impl MemoryDistrictDirectory {
    pub fn new(districts: Vec<District>) -> Self {
        Self { districts }
    }
}

#[async_trait]
impl DistrictDirectory for MemoryDistrictDirectory {
    async fn find_districts(&self, ids: &[i64]) -> Result<Vec<District>, StoreError> {
        Ok(self
            .districts
            .iter()
            .filter(|district| ids.contains(&district.district_id))
            .cloned()
            .collect())
    }

    async fn list_districts(
        &self,
        search: Option<&str>,
        limit: Option<u16>,
    ) -> Result<Vec<District>, StoreError> {
        let prefix = search.unwrap_or_default().to_lowercase();
        let mut districts: Vec<District> = self
            .districts
            .iter()
            .filter(|district| district.district_name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        districts.sort_by(|a, b| a.district_name.cmp(&b.district_name));
        if let Some(limit) = limit {
            districts.truncate(limit.into());
        }
        Ok(districts)
    }
}
