use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use trip_planner_api::app::{configure, AppState};
use trip_planner_api::config::AppConfig;
use trip_planner_api::db::{self, MongoDistrictDirectory, MongoTripStore};
use trip_planner_api::routes::health::HealthContext;
use trip_planner_api::services::gemini::GeminiClient;
use trip_planner_api::services::trip_orchestrator::TripOrchestrator;

fn fatal(message: String) -> io::Error {
    error!("{}", message);
    io::Error::new(io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config =
        AppConfig::from_env().map_err(|e| fatal(format!("Invalid configuration: {}", e)))?;

    let generator = GeminiClient::new(config.gemini.clone())
        .map_err(|e| fatal(format!("Cannot start Gemini client: {}", e)))?;

    let client = db::mongo::create_mongo_client(&config.mongodb_uri)
        .await
        .map_err(|e| fatal(format!("Cannot create MongoDB client: {}", e)))?;

    let store = Arc::new(MongoTripStore::new(client.clone(), config.database.clone()));
    let districts = Arc::new(MongoDistrictDirectory::new(
        client.clone(),
        config.database.clone(),
    ));

    let state = AppState {
        orchestrator: Arc::new(TripOrchestrator::new(
            store,
            districts.clone(),
            Arc::new(generator),
        )),
        districts,
        jwt_secret: config.jwt_secret.clone(),
        health: HealthContext {
            mongo: Some(client),
            gemini_endpoint: config.gemini.endpoint.clone(),
            gemini_key_hint: config.gemini.masked_api_key(),
        },
    };

    info!("Starting HTTP server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(|cfg| configure(cfg, &state))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
