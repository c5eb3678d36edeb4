//! Prompt templates for the two trip planning phases.
//!
//! Every function here is a pure function of its arguments, so identical
//! inputs always produce identical prompts.

use chrono::NaiveDate;

use crate::models::trip::Trip;

const DATE_FORMAT: &str = "%Y-%m-%d";

const ITINERARY_STRUCTURE: &str = concat!(
    "{\"trip_plan\": {\"total_days\": number, \"stay_points\": [{\"location\": string, ",
    "\"stay_duration\": number, \"hotel_suggestion\": string}], ",
    "\"itinerary\": [{\"day\": number, \"base\": string, \"places_to_visit\": [{\"name\": string, ",
    "\"distance_from_base_km\": number, \"activities\": [string], \"time_spent\": string}]}]}}"
);

const RESPONSE_TEMPLATE: &str = r#"{
  "trip_plan": {
    "total_days": <int>,
    "stay_points": [
      {
        "location": <str>,
        "stay_duration": <int>,
        "hotel_suggestion": <str>,
        "area_description": <str>,
        "transportation_options": [<str>]
      }
    ],
    "itinerary": [
      {
        "day": <int>,
        "base": <str>,
        "places_to_visit": [
          {
            "name": <str>,
            "distance_from_base_km": <float>,
            "activities": [<str>],
            "time_spent": <str>,
            "best_time_to_visit": <str>,
            "travel_time": <str>,
            "opening_hours": <str>,
            "entrance_fee": <str>,
            "transportation_to": <str>
          }
        ],
        "meals": {
          "breakfast": <str>,
          "lunch": <str>,
          "dinner": <str>
        }
      }
    ],
    "additional_recommendations": {
      "transportation": [<str>],
      "packing_tips": [<str>],
      "local_customs": [<str>],
      "safety_tips": [<str>],
      "budget_estimates": {
        "accommodation": <str>,
        "meals": <str>,
        "activities": <str>,
        "transportation": <str>
      }
    }
  }
}"#;

const RESPONSE_RULES: [&str; 12] = [
    "All distances must be realistic and based on actual locations",
    "Group nearby attractions together in each day's plan",
    "Include 3-5 attractions per day with logical sequencing",
    "Consider the trip type and interests when planning activities",
    "Include practical information like travel time and best times to visit",
    "Suggest accommodations based on the trip type and budget",
    "Include local transportation options between attractions",
    "Consider opening hours and best visiting times for attractions",
    "Include meal suggestions that match the trip type and interests",
    "Ensure all JSON values are properly formatted (strings in quotes, numbers without quotes)",
    "Make sure to close all JSON objects and arrays properly",
    "Do not include any trailing commas in arrays or objects",
];

/// Phase 1: asks for general recommendations on where to stay, what to do,
/// how to get around, and what to watch out for.
pub fn build_detail_prompt(
    trip: &Trip,
    destination_names: &[String],
    interest_names: &[String],
) -> String {
    format!(
        "Analyze the following trip details and provide recommendations for accommodation and general activities: \
         {summary}\
         Please provide detailed recommendations for: \
         1. Suitable accommodation types and areas \
         2. General activities that match the interests \
         3. Transportation options between destinations \
         4. Any special considerations based on the trip type",
        summary = trip_summary(trip, destination_names, interest_names),
    )
}

/// Phase 2: asks for a day-by-day itinerary in a fixed JSON shape, seeded with
/// the phase 1 output.
pub fn build_itinerary_prompt(
    trip: &Trip,
    destination_names: &[String],
    interest_names: &[String],
    detail_output: &str,
) -> String {
    format!(
        "Based on the following trip details and recommendations, create a detailed daily itinerary: \
         {summary}\
         Previous Recommendations: {detail_output} \
         Please format the response as a JSON object with the following structure: \
         {ITINERARY_STRUCTURE}",
        summary = trip_summary(trip, destination_names, interest_names),
    )
}

/// Envelope applied to every prompt sent to the AI service. It pins the
/// response to the `trip_plan` document the client validates.
pub fn wrap_with_response_format(prompt: &str) -> String {
    let rules: Vec<String> = RESPONSE_RULES
        .iter()
        .enumerate()
        .map(|(index, rule)| format!("{}. {}", index + 1, rule))
        .collect();

    format!(
        "You are a travel planning AI assistant. Create a detailed trip plan based on the following input:\n\
         \"{prompt}\"\n\n\
         IMPORTANT: You MUST respond with a valid JSON object that strictly follows the structure below. \
         Do not include any other text or explanations.\n\n\
         {RESPONSE_TEMPLATE}\n\n\
         Rules for the trip plan:\n\
         {rules}\n\n\
         Remember: Your response must be a valid JSON object that can be parsed by JSON.parse(). \
         Do not include any text outside the JSON structure.",
        rules = rules.join("\n"),
    )
}

fn trip_summary(trip: &Trip, destination_names: &[String], interest_names: &[String]) -> String {
    format!(
        "Trip Type: {} Destinations: {} Duration: {} to {} Interests: {} ",
        trip.trip_type,
        destination_names.join(", "),
        format_date(trip.start_date),
        format_date(trip.end_date),
        interest_names.join(", "),
    )
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
