use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
pub enum ServiceType {
    Health,
    Education,
    Water,
    Electricity,
    Roads,
    Sanitation,
    Security,
    Other,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Health => "health",
            ServiceType::Education => "education",
            ServiceType::Water => "water",
            ServiceType::Electricity => "electricity",
            ServiceType::Roads => "roads",
            ServiceType::Sanitation => "sanitation",
            ServiceType::Security => "security",
            ServiceType::Other => "other",
        }
    }
}

/// Rating-based service review, immutable once created.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub service_type: ServiceType,
    /// Bounded 1..=5, enforced at the boundary and by a CHECK constraint.
    pub rating: i16,
    pub comments: Option<String>,
    pub user_id: Uuid,
    #[sqlx(flatten)]
    pub location: Location,
    pub created_at: DateTime<Utc>,
}
