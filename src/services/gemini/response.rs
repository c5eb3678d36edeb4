use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const PLAN_KEY: &str = "trip_plan";
const REQUIRED_PLAN_FIELDS: [&str; 4] = [
    "total_days",
    "stay_points",
    "itinerary",
    "additional_recommendations",
];

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response text is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("response JSON is missing `{0}`")]
    Schema(String),
}

/// A `trip_plan` document that passed the presence checks.
///
/// Only the top-level `trip_plan` object and its four required fields are
/// checked; the shapes inside them are taken as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredTripPlan {
    document: Value,
}

impl StructuredTripPlan {
    /// Extracts, parses and validates one candidate text.
    pub fn parse(text: &str) -> Result<Self, ResponseError> {
        let json = extract_json_block(text);
        let document: Value = serde_json::from_str(json)?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> Result<Self, ResponseError> {
        let plan = match document.get(PLAN_KEY) {
            Some(plan) if plan.is_object() => plan,
            _ => return Err(ResponseError::Schema(PLAN_KEY.to_string())),
        };

        for field in REQUIRED_PLAN_FIELDS {
            if plan.get(field).map_or(true, Value::is_null) {
                return Err(ResponseError::Schema(format!("{PLAN_KEY}.{field}")));
            }
        }

        Ok(Self { document })
    }

    pub fn total_days(&self) -> &Value {
        &self.document[PLAN_KEY]["total_days"]
    }

    pub fn stay_points(&self) -> &Value {
        &self.document[PLAN_KEY]["stay_points"]
    }

    pub fn itinerary(&self) -> &Value {
        &self.document[PLAN_KEY]["itinerary"]
    }

    /// Compact JSON text of the whole document, as stored on the prompt record.
    pub fn to_json_string(&self) -> String {
        self.document.to_string()
    }
}

/// Returns the body of the first ```` ```json ```` fenced block, or the
/// trimmed text when there is none.
pub fn extract_json_block(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("fence pattern compiles")
    });

    fence
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or(text, |body| body.as_str())
        .trim()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Every text part across all candidates, in response order.
    pub(crate) fn texts(&self) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_json() -> Value {
        json!({
            "trip_plan": {
                "total_days": 2,
                "stay_points": [{"location": "Kandy", "stay_duration": 2, "hotel_suggestion": "Lake View"}],
                "itinerary": [
                    {"day": 1, "base": "Kandy", "places_to_visit": []},
                    {"day": 2, "base": "Kandy", "places_to_visit": []}
                ],
                "additional_recommendations": {"packing_tips": ["rain jacket"]}
            }
        })
    }

    #[test]
    fn test_fenced_and_plain_text_parse_equal() {
        let plain = plan_json().to_string();
        let fenced = format!("```json\n{}\n```", plain);

        let from_plain = StructuredTripPlan::parse(&plain).unwrap();
        let from_fenced = StructuredTripPlan::parse(&fenced).unwrap();
        assert_eq!(from_plain, from_fenced);
        assert_eq!(from_plain.total_days(), &json!(2));
    }

    #[test]
    fn test_fence_with_surrounding_prose() {
        let text = format!(
            "Here is your plan:\n```json\n{}\n```\nEnjoy the trip!",
            serde_json::to_string_pretty(&plan_json()).unwrap()
        );
        assert!(StructuredTripPlan::parse(&text).is_ok());
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let text = format!("\n\n   {}   \n", plan_json());
        assert!(StructuredTripPlan::parse(&text).is_ok());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = StructuredTripPlan::parse("{\"trip_plan\": {\"total_days\": 2,").unwrap_err();
        assert!(matches!(err, ResponseError::Parse(_)));

        let err = StructuredTripPlan::parse("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, ResponseError::Parse(_)));
    }

    #[test]
    fn test_missing_additional_recommendations_is_schema_error() {
        let mut document = plan_json();
        document["trip_plan"]
            .as_object_mut()
            .unwrap()
            .remove("additional_recommendations");

        match StructuredTripPlan::from_value(document) {
            Err(ResponseError::Schema(field)) => {
                assert_eq!(field, "trip_plan.additional_recommendations")
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let mut document = plan_json();
        document["trip_plan"]["itinerary"] = Value::Null;
        assert!(matches!(
            StructuredTripPlan::from_value(document),
            Err(ResponseError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_trip_plan_is_schema_error() {
        let err = StructuredTripPlan::from_value(json!({"plan": {}})).unwrap_err();
        assert!(matches!(err, ResponseError::Schema(ref field) if field == "trip_plan"));

        let err = StructuredTripPlan::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ResponseError::Schema(_)));
    }

    #[test]
    fn test_nested_shapes_are_not_checked() {
        let document = json!({
            "trip_plan": {
                "total_days": "two",
                "stay_points": "somewhere nice",
                "itinerary": {"day": 1},
                "additional_recommendations": []
            }
        });
        assert!(StructuredTripPlan::from_value(document).is_ok());
    }

    #[test]
    fn test_texts_walks_all_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"inlineData": {}}]}},
                {"finishReason": "SAFETY"},
                {"content": {"parts": [{"text": "second"}]}}
            ]
        }))
        .unwrap();

        let texts: Vec<&str> = response.texts().collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
