//! Two-phase trip plan generation.
//!
//! A run creates the trip, asks the AI for general recommendations (detail
//! phase), feeds that answer into an itinerary request (itinerary phase) and
//! stores the resulting plan. Phases run strictly in sequence. Every prompt
//! sent is recorded with its outcome, and records from a failed run are kept
//! for diagnosis.

use std::sync::Arc;

use log::{error, info, warn};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::Handle;

use crate::db::districts::{name_map, names_in_order, DistrictDirectory};
use crate::db::trip_store::{PromptOutcome, StoreError, TripStore};
use crate::models::trip::{
    plan::TripPlan,
    prompt::{PromptPhase, TripPrompt},
    request::NewTrip,
    Trip, TripDetails, TripStatus,
};
use crate::services::gemini::{AiServiceError, StructuredTripPlan, TripPlanGenerator};
use crate::services::prompt_builder::{build_detail_prompt, build_itinerary_prompt};

#[derive(Debug, Error)]
pub enum TripPlanningError {
    #[error("AI generation failed for trip {trip_id}: {source}")]
    Generation {
        trip_id: ObjectId,
        #[source]
        source: AiServiceError,
    },
    #[error("AI response for trip {trip_id} is not a usable plan: {reason}")]
    UnusablePlan { trip_id: ObjectId, reason: String },
    #[error("trip store error: {0}")]
    Store(#[from] StoreError),
}

impl TripPlanningError {
    /// The trip left in `failed` state, when the run got far enough to create one.
    pub fn trip_id(&self) -> Option<ObjectId> {
        match self {
            TripPlanningError::Generation { trip_id, .. }
            | TripPlanningError::UnusablePlan { trip_id, .. } => Some(*trip_id),
            TripPlanningError::Store(_) => None,
        }
    }
}

pub struct TripOrchestrator {
    store: Arc<dyn TripStore>,
    districts: Arc<dyn DistrictDirectory>,
    generator: Arc<dyn TripPlanGenerator>,
}

impl TripOrchestrator {
    pub fn new(
        store: Arc<dyn TripStore>,
        districts: Arc<dyn DistrictDirectory>,
        generator: Arc<dyn TripPlanGenerator>,
    ) -> Self {
        Self {
            store,
            districts,
            generator,
        }
    }

    /// Runs both phases for a validated request and returns the trip with its
    /// prompts and plan. On error the trip and its open prompt are left
    /// `failed`.
    pub async fn plan_trip(
        &self,
        tourist_id: ObjectId,
        new_trip: NewTrip,
    ) -> Result<TripDetails, TripPlanningError> {
        let districts = self.districts.find_districts(&new_trip.destinations).await?;
        let destination_names = names_in_order(&new_trip.destinations, &districts);

        let mut trip = Trip::pending(tourist_id, new_trip);
        let trip_id = self.store.create_trip(&trip).await?;
        trip.id = Some(trip_id);

        info!(
            "Starting trip planning for trip {} (tourist {}, {} destinations, type {})",
            trip_id,
            tourist_id,
            trip.destinations.len(),
            trip.trip_type
        );

        let mut guard = RunGuard::new(self.store.clone(), trip_id);
        let outcome = self
            .run_phases(&trip, trip_id, &destination_names, &mut guard)
            .await;
        guard.disarm();

        if let Err(e) = outcome {
            error!("Trip planning failed for trip {}: {}", trip_id, e);
            mark_trip_failed(self.store.as_ref(), trip_id).await;
            return Err(e);
        }

        info!("Trip plan completed for trip {}", trip_id);

        let details = self
            .store
            .find_trip(tourist_id, trip_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "trip",
                id: trip_id,
            })?;
        Ok(details.with_district_names(name_map(&districts)))
    }

    pub async fn get_trip(
        &self,
        tourist_id: ObjectId,
        trip_id: ObjectId,
    ) -> Result<Option<TripDetails>, StoreError> {
        match self.store.find_trip(tourist_id, trip_id).await? {
            Some(details) => {
                let districts = self
                    .districts
                    .find_districts(&details.trip.destinations)
                    .await?;
                Ok(Some(details.with_district_names(name_map(&districts))))
            }
            None => Ok(None),
        }
    }

    pub async fn completed_trips(&self, tourist_id: ObjectId) -> Result<Vec<TripDetails>, StoreError> {
        let trips = self.store.find_completed_trips(tourist_id).await?;

        let mut district_ids: Vec<i64> = trips
            .iter()
            .flat_map(|details| details.trip.destinations.iter().copied())
            .collect();
        district_ids.sort_unstable();
        district_ids.dedup();
        let names = name_map(&self.districts.find_districts(&district_ids).await?);

        Ok(trips
            .into_iter()
            .map(|details| details.with_district_names(names.clone()))
            .collect())
    }

    async fn run_phases(
        &self,
        trip: &Trip,
        trip_id: ObjectId,
        destination_names: &[String],
        guard: &mut RunGuard,
    ) -> Result<(), TripPlanningError> {
        self.store
            .update_trip_status(trip_id, TripStatus::Processing)
            .await?;

        let detail_prompt = build_detail_prompt(trip, destination_names, &trip.interests);
        let (detail_prompt_id, details) = self
            .execute_prompt(trip_id, PromptPhase::Detail, detail_prompt, guard)
            .await?;
        let detail_output = details.to_json_string();
        self.resolve_or_fail(
            detail_prompt_id,
            PromptOutcome::Completed {
                response: detail_output.clone(),
            },
        )
        .await?;
        guard.open_prompt = None;

        let itinerary_prompt =
            build_itinerary_prompt(trip, destination_names, &trip.interests, &detail_output);
        let (itinerary_prompt_id, itinerary) = self
            .execute_prompt(trip_id, PromptPhase::Itinerary, itinerary_prompt, guard)
            .await?;

        if let Err(e) = self
            .store_plan(trip_id, itinerary_prompt_id, &itinerary)
            .await
        {
            fail_prompt(self.store.as_ref(), itinerary_prompt_id).await;
            return Err(e);
        }
        guard.open_prompt = None;

        self.store
            .update_trip_status(trip_id, TripStatus::Completed)
            .await?;
        Ok(())
    }

    /// Records a pending prompt and sends it. The prompt is left pending on
    /// success so the caller can attach the response once it has been used.
    async fn execute_prompt(
        &self,
        trip_id: ObjectId,
        phase: PromptPhase,
        prompt: String,
        guard: &mut RunGuard,
    ) -> Result<(ObjectId, StructuredTripPlan), TripPlanningError> {
        let record = TripPrompt::pending(trip_id, phase, prompt);
        let prompt_id = self.store.create_prompt(&record).await?;
        guard.open_prompt = Some(prompt_id);

        match self.generator.generate(&record.prompt).await {
            Ok(plan) => Ok((prompt_id, plan)),
            Err(source) => {
                fail_prompt(self.store.as_ref(), prompt_id).await;
                Err(TripPlanningError::Generation { trip_id, source })
            }
        }
    }

    async fn store_plan(
        &self,
        trip_id: ObjectId,
        prompt_id: ObjectId,
        itinerary: &StructuredTripPlan,
    ) -> Result<(), TripPlanningError> {
        let total_days = positive_day_count(itinerary.total_days()).ok_or_else(|| {
            TripPlanningError::UnusablePlan {
                trip_id,
                reason: format!(
                    "total_days must be a positive integer, got {}",
                    itinerary.total_days()
                ),
            }
        })?;

        let plan = TripPlan::new(
            trip_id,
            total_days,
            itinerary.stay_points().clone(),
            itinerary.itinerary().clone(),
        );
        self.store.create_plan(&plan).await?;

        self.store
            .resolve_prompt(
                prompt_id,
                PromptOutcome::Completed {
                    response: itinerary.to_json_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn resolve_or_fail(
        &self,
        prompt_id: ObjectId,
        outcome: PromptOutcome,
    ) -> Result<(), TripPlanningError> {
        if let Err(e) = self.store.resolve_prompt(prompt_id, outcome).await {
            fail_prompt(self.store.as_ref(), prompt_id).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Fails the trip and its open prompt if a run is dropped before it
/// finishes, e.g. when the client disconnects mid-request. The cleanup runs
/// as a detached task since `Drop` cannot await.
struct RunGuard {
    store: Arc<dyn TripStore>,
    trip_id: ObjectId,
    open_prompt: Option<ObjectId>,
    armed: bool,
}

impl RunGuard {
    fn new(store: Arc<dyn TripStore>, trip_id: ObjectId) -> Self {
        Self {
            store,
            trip_id,
            open_prompt: None,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!("Trip planning for trip {} was cancelled", self.trip_id);
        let Ok(handle) = Handle::try_current() else {
            warn!(
                "No runtime to clean up cancelled trip {}; it stays unresolved",
                self.trip_id
            );
            return;
        };

        let store = self.store.clone();
        let trip_id = self.trip_id;
        let open_prompt = self.open_prompt.take();
        handle.spawn(async move {
            if let Some(prompt_id) = open_prompt {
                fail_prompt(store.as_ref(), prompt_id).await;
            }
            mark_trip_failed(store.as_ref(), trip_id).await;
        });
    }
}

async fn fail_prompt(store: &dyn TripStore, prompt_id: ObjectId) {
    if let Err(e) = store.resolve_prompt(prompt_id, PromptOutcome::Failed).await {
        warn!("Could not mark prompt {} as failed: {}", prompt_id, e);
    }
}

async fn mark_trip_failed(store: &dyn TripStore, trip_id: ObjectId) {
    if let Err(e) = store.update_trip_status(trip_id, TripStatus::Failed).await {
        warn!("Could not mark trip {} as failed: {}", trip_id, e);
    }
}

/// Accepts `3`, `3.0` and `"3"`; anything else, or zero, is rejected.
fn positive_day_count(value: &Value) -> Option<u32> {
    let days = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|days| days.fract() == 0.0 && *days >= 0.0)
                .map(|days| days as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }?;

    u32::try_from(days).ok().filter(|days| *days > 0)
}
