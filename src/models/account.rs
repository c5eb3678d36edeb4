use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Tourist,
    Partner,
    Admin,
}

impl UserRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tourist" => Some(UserRole::Tourist),
            "partner" => Some(UserRole::Partner),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Tourist => "tourist",
            UserRole::Partner => "partner",
            UserRole::Admin => "admin",
        }
    }
}
