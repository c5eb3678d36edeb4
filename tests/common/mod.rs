#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use trip_planner_api::app::{configure, AppState};
use trip_planner_api::db::{MemoryDistrictDirectory, MemoryTripStore};
use trip_planner_api::middleware::auth::Claims;
use trip_planner_api::models::district::District;
use trip_planner_api::models::trip::request::NewTrip;
use trip_planner_api::models::trip::TripType;
use trip_planner_api::routes::health::HealthContext;
use trip_planner_api::services::gemini::{AiServiceError, StructuredTripPlan, TripPlanGenerator};
use trip_planner_api::services::trip_orchestrator::TripOrchestrator;

pub const JWT_SECRET: &str = "test-secret";

pub fn districts() -> Vec<District> {
    vec![
        District {
            district_id: 12,
            district_name: "Kandy".to_string(),
            province: Some("Central".to_string()),
        },
        District {
            district_id: 4,
            district_name: "Galle".to_string(),
            province: Some("Southern".to_string()),
        },
        District {
            district_id: 7,
            district_name: "Nuwara Eliya".to_string(),
            province: Some("Central".to_string()),
        },
    ]
}

/// A `trip_plan` document that passes validation, with one itinerary entry per day.
pub fn plan_document(days: u32) -> Value {
    let itinerary: Vec<Value> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "base": "Kandy",
                "places_to_visit": [{
                    "name": "Temple of the Tooth",
                    "distance_from_base_km": 1.2,
                    "activities": ["Evening puja"],
                    "time_spent": "2 hours"
                }],
                "meals": {"breakfast": "Hotel", "lunch": "Local rice and curry", "dinner": "Lake-side cafe"}
            })
        })
        .collect();

    json!({
        "trip_plan": {
            "total_days": days,
            "stay_points": [{
                "location": "Kandy",
                "stay_duration": days,
                "hotel_suggestion": "Earl's Regency",
                "area_description": "Hills above the lake",
                "transportation_options": ["tuk-tuk", "train"]
            }],
            "itinerary": itinerary,
            "additional_recommendations": {
                "transportation": ["Book the observation car"],
                "packing_tips": ["Rain jacket"],
                "local_customs": ["Cover shoulders at temples"],
                "safety_tips": ["Watch for leeches on trails"],
                "budget_estimates": {
                    "accommodation": "$60/night",
                    "meals": "$20/day",
                    "activities": "$15/day",
                    "transportation": "$10/day"
                }
            }
        }
    })
}

pub fn valid_plan(days: u32) -> StructuredTripPlan {
    StructuredTripPlan::from_value(plan_document(days)).expect("fixture plan is valid")
}

/// Replays scripted results in order and records every prompt it receives.
pub struct ScriptedGenerator {
    results: Mutex<VecDeque<Result<StructuredTripPlan, AiServiceError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(results: Vec<Result<StructuredTripPlan, AiServiceError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_valid(days: u32) -> Self {
        Self::new((0..4).map(|_| Ok(valid_plan(days))).collect())
    }

    pub fn always_failing() -> Self {
        Self::new(
            (0..4)
                .map(|_| Err(AiServiceError::GenerationFailed { attempts: 3 }))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TripPlanGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<StructuredTripPlan, AiServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AiServiceError::GenerationFailed { attempts: 3 }))
    }
}

pub fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

pub fn new_trip() -> NewTrip {
    NewTrip {
        destinations: vec![12],
        start_date: tomorrow(),
        end_date: tomorrow() + Duration::days(3),
        trip_type: TripType::Solo,
        interests: vec!["hiking".to_string()],
    }
}

pub struct TestApp {
    pub store: Arc<MemoryTripStore>,
    pub generator: Arc<ScriptedGenerator>,
    pub state: AppState,
}

impl TestApp {
    pub fn new(generator: ScriptedGenerator) -> Self {
        let store = Arc::new(MemoryTripStore::new());
        let generator = Arc::new(generator);
        let districts = Arc::new(MemoryDistrictDirectory::new(districts()));

        let orchestrator = TripOrchestrator::new(store.clone(), districts.clone(), generator.clone());
        let state = AppState {
            orchestrator: Arc::new(orchestrator),
            districts,
            jwt_secret: JWT_SECRET.to_string(),
            health: HealthContext {
                mongo: None,
                gemini_endpoint: "http://localhost/generate".to_string(),
                gemini_key_hint: "***".to_string(),
            },
        };

        Self {
            store,
            generator,
            state,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let state = self.state.clone();
        App::new().configure(move |cfg: &mut web::ServiceConfig| configure(cfg, &state))
    }
}

pub fn token_for(user_id: &ObjectId, role: &str) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: "tourist@example.com".to_string(),
        exp: now + 3600,
        iat: now,
        user_id: user_id.to_hex(),
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token encodes")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Status of a request whose middleware may reject it with an error instead
/// of a response.
pub async fn response_status<S, B>(app: &S, req: Request) -> StatusCode
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}
