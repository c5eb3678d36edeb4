use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trip_planner_api::services::gemini::{
    AiServiceError, GeminiClient, GeminiConfig, TripPlanGenerator,
};

const API_KEY: &str = "test-gemini-key";

fn plan_text() -> String {
    json!({
        "trip_plan": {
            "total_days": 2,
            "stay_points": [{"location": "Galle", "stay_duration": 2, "hotel_suggestion": "Fort Bungalow"}],
            "itinerary": [
                {"day": 1, "base": "Galle", "places_to_visit": [{"name": "Galle Fort", "distance_from_base_km": 0.5}]},
                {"day": 2, "base": "Galle", "places_to_visit": [{"name": "Unawatuna Beach", "distance_from_base_km": 6.0}]}
            ],
            "additional_recommendations": {"safety_tips": ["Mind the currents"]}
        }
    })
    .to_string()
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

fn client_for(server: &MockServer) -> GeminiClient {
    let config = GeminiConfig::new(API_KEY)
        .with_endpoint(format!("{}/v1beta/models/gemini:generateContent", server.uri()))
        .with_retry_delay(Duration::from_millis(10));
    GeminiClient::new(config).expect("client builds")
}

fn mock_generate() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini:generateContent"))
        .and(query_param("key", API_KEY))
}

#[actix_rt::test]
async fn test_plain_json_response_is_accepted() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&plan_text())))
        .expect(1)
        .mount(&server)
        .await;

    let plan = client_for(&server).generate("Plan a trip to Galle").await.unwrap();
    assert_eq!(plan.total_days(), &json!(2));
    assert_eq!(plan.itinerary().as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_fenced_response_is_accepted() {
    let server = MockServer::start().await;
    let fenced = format!("Here you go:\n```json\n{}\n```", plan_text());
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&fenced)))
        .expect(1)
        .mount(&server)
        .await;

    let plan = client_for(&server).generate("Plan a trip to Galle").await.unwrap();
    assert_eq!(plan.stay_points()[0]["location"], "Galle");
}

#[actix_rt::test]
async fn test_request_carries_wrapped_prompt_and_generation_config() {
    let server = MockServer::start().await;
    mock_generate()
        .and(body_partial_json(json!({
            "generationConfig": {
                "temperature": 0.1,
                "topK": 1,
                "topP": 0.1,
                "maxOutputTokens": 4096
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&plan_text())))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).generate("Plan a trip to Galle").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("You are a travel planning AI assistant."));
    assert!(text.contains("\"Plan a trip to Galle\""));
}

#[actix_rt::test]
async fn test_malformed_json_exhausts_three_attempts() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate("{\"trip_plan\": {\"total_days\": 2, \"stay_points\": [")),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Plan a trip").await.unwrap_err();
    assert!(matches!(err, AiServiceError::GenerationFailed { attempts: 3 }));
}

#[actix_rt::test]
async fn test_missing_required_field_is_retried_then_rejected() {
    let server = MockServer::start().await;
    let incomplete = json!({
        "trip_plan": {
            "total_days": 2,
            "stay_points": [],
            "itinerary": []
        }
    })
    .to_string();
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&incomplete)))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Plan a trip").await.unwrap_err();
    assert!(matches!(err, AiServiceError::GenerationFailed { attempts: 3 }));
}

#[actix_rt::test]
async fn test_server_error_counts_as_failed_attempt() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Plan a trip").await.unwrap_err();
    assert!(matches!(err, AiServiceError::GenerationFailed { .. }));
}

#[actix_rt::test]
async fn test_empty_candidates_count_as_failed_attempt() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(3)
        .mount(&server)
        .await;

    assert!(client_for(&server).generate("Plan a trip").await.is_err());
}

#[actix_rt::test]
async fn test_recovers_on_second_attempt() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("not json at all")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(&plan_text())))
        .expect(1)
        .mount(&server)
        .await;

    let plan = client_for(&server).generate("Plan a trip").await.unwrap();
    assert_eq!(plan.total_days(), &json!(2));
}

#[actix_rt::test]
async fn test_timeouts_exhaust_three_attempts() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate(&plan_text()))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = GeminiConfig::new(API_KEY)
        .with_endpoint(format!("{}/v1beta/models/gemini:generateContent", server.uri()))
        .with_retry_delay(Duration::from_millis(10))
        .with_request_timeout(Duration::from_millis(100));
    let client = GeminiClient::new(config).unwrap();

    let err = client.generate("Plan a trip").await.unwrap_err();
    assert!(matches!(err, AiServiceError::GenerationFailed { attempts: 3 }));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[actix_rt::test]
async fn test_dropping_generate_stops_further_attempts() {
    let server = MockServer::start().await;
    mock_generate()
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("no plan here")))
        .mount(&server)
        .await;

    let config = GeminiConfig::new(API_KEY)
        .with_endpoint(format!("{}/v1beta/models/gemini:generateContent", server.uri()))
        .with_retry_delay(Duration::from_millis(300));
    let client = GeminiClient::new(config).unwrap();

    let result =
        tokio::time::timeout(Duration::from_millis(100), client.generate("Plan a trip")).await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
