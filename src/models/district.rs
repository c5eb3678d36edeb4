use serde::{Deserialize, Serialize};

/// A district from the location catalog. Trip destinations refer to districts by id.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct District {
    pub district_id: i64,
    pub district_name: String,
    pub province: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DistrictSummary {
    pub id: i64,
    pub district: String,
    pub province: Option<String>,
}

impl From<District> for DistrictSummary {
    fn from(district: District) -> Self {
        DistrictSummary {
            id: district.district_id,
            district: district.district_name,
            province: district.province,
        }
    }
}
