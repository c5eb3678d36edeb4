use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;

use trip_planner_api::models::trip::{Trip, TripStatus, TripType};
use trip_planner_api::services::prompt_builder::{
    build_detail_prompt, build_itinerary_prompt, wrap_with_response_format,
};

fn trip() -> Trip {
    Trip {
        id: Some(ObjectId::new()),
        tourist_id: ObjectId::new(),
        start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 13).unwrap(),
        trip_type: TripType::Family,
        destinations: vec![12, 4],
        interests: vec!["beaches".to_string(), "wildlife".to_string()],
        status: TripStatus::Processing,
        is_completed: false,
        created_at: None,
        updated_at: None,
    }
}

fn names() -> Vec<String> {
    vec!["Kandy".to_string(), "Galle".to_string()]
}

#[test]
fn test_detail_prompt_text() {
    let trip = trip();
    let prompt = build_detail_prompt(&trip, &names(), &trip.interests);

    assert_eq!(
        prompt,
        "Analyze the following trip details and provide recommendations for accommodation and general activities: \
         Trip Type: family Destinations: Kandy, Galle Duration: 2025-03-10 to 2025-03-13 Interests: beaches, wildlife \
         Please provide detailed recommendations for: \
         1. Suitable accommodation types and areas \
         2. General activities that match the interests \
         3. Transportation options between destinations \
         4. Any special considerations based on the trip type"
    );
}

#[test]
fn test_itinerary_prompt_embeds_previous_output() {
    let trip = trip();
    let detail_output = r#"{"trip_plan":{"total_days":4}}"#;
    let prompt = build_itinerary_prompt(&trip, &names(), &trip.interests, detail_output);

    assert!(prompt.starts_with(
        "Based on the following trip details and recommendations, create a detailed daily itinerary: \
         Trip Type: family Destinations: Kandy, Galle Duration: 2025-03-10 to 2025-03-13 Interests: beaches, wildlife "
    ));
    assert!(prompt.contains(&format!("Previous Recommendations: {} ", detail_output)));
    assert!(prompt.contains("\"places_to_visit\": [{\"name\": string"));
}

#[test]
fn test_prompts_are_deterministic() {
    let trip = trip();
    assert_eq!(
        build_detail_prompt(&trip, &names(), &trip.interests),
        build_detail_prompt(&trip, &names(), &trip.interests)
    );
    assert_eq!(
        build_itinerary_prompt(&trip, &names(), &trip.interests, "{}"),
        build_itinerary_prompt(&trip, &names(), &trip.interests, "{}")
    );
}

#[test]
fn test_destination_order_follows_input() {
    let trip = trip();
    let reversed = vec!["Galle".to_string(), "Kandy".to_string()];
    let prompt = build_detail_prompt(&trip, &reversed, &trip.interests);
    assert!(prompt.contains("Destinations: Galle, Kandy "));
}

#[test]
fn test_response_format_wrapper() {
    let wrapped = wrap_with_response_format("Plan three days in Kandy");

    assert!(wrapped.starts_with(
        "You are a travel planning AI assistant. Create a detailed trip plan based on the following input:\n\
         \"Plan three days in Kandy\"\n\n"
    ));
    assert!(wrapped.contains("\"additional_recommendations\": {"));
    assert!(wrapped.contains("1. All distances must be realistic and based on actual locations\n"));
    assert!(wrapped.contains("12. Do not include any trailing commas in arrays or objects"));
    assert!(wrapped.ends_with("Do not include any text outside the JSON structure."));
}
