use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::TripType;

/// Body of `POST /api/trips/plan`. Fields stay loosely typed so that bad input
/// is reported per field instead of as a single deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTripRequest {
    #[serde(default)]
    pub destinations: Option<Vec<i64>>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub trip_type: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
}

/// A plan request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub destinations: Vec<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trip_type: TripType,
    pub interests: Vec<String>,
}

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl PlanTripRequest {
    /// Checks the request against `today`. District existence is checked
    /// separately because it needs the district catalog.
    pub fn validate(self, today: NaiveDate) -> Result<NewTrip, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let destinations = match self.destinations {
            Some(ids) if !ids.is_empty() => dedup_in_order(ids),
            _ => {
                errors.add("destinations", "The destinations field is required.");
                Vec::new()
            }
        };

        let start_date = match self.start_date.as_deref().map(parse_date) {
            Some(Some(date)) if date > today => Some(date),
            Some(Some(_)) => {
                errors.add("startDate", "The start date must be a date after today.");
                None
            }
            Some(None) => {
                errors.add("startDate", "The start date is not a valid date.");
                None
            }
            None => {
                errors.add("startDate", "The start date field is required.");
                None
            }
        };

        let end_date = match self.end_date.as_deref().map(parse_date) {
            Some(Some(date)) => match start_date {
                Some(start) if date <= start => {
                    errors.add("endDate", "The end date must be a date after start date.");
                    None
                }
                _ => Some(date),
            },
            Some(None) => {
                errors.add("endDate", "The end date is not a valid date.");
                None
            }
            None => {
                errors.add("endDate", "The end date field is required.");
                None
            }
        };

        let trip_type = match self.trip_type.as_deref() {
            Some(value) => {
                let parsed = TripType::parse(value);
                if parsed.is_none() {
                    errors.add("tripType", "The selected trip type is invalid.");
                }
                parsed
            }
            None => {
                errors.add("tripType", "The trip type field is required.");
                None
            }
        };

        let interests: Vec<String> = self
            .interests
            .unwrap_or_default()
            .into_iter()
            .map(|interest| interest.trim().to_string())
            .filter(|interest| !interest.is_empty())
            .collect();
        if interests.is_empty() {
            errors.add("interests", "The interests field is required.");
        }

        match (start_date, end_date, trip_type) {
            (Some(start_date), Some(end_date), Some(trip_type)) if errors.is_empty() => {
                Ok(NewTrip {
                    destinations,
                    start_date,
                    end_date,
                    trip_type,
                    interests,
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

fn dedup_in_order(ids: Vec<i64>) -> Vec<i64> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
