use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::location::Location;

/// Account role, ordered by rank. Role/location mutation requires a strictly
/// higher-ranked actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Citizen,
    SectorAdmin,
    DistrictAdmin,
    SuperAdmin,
}

impl Role {
    pub fn rank(&self) -> u8 {
        match self {
            Role::Citizen => 0,
            Role::SectorAdmin => 1,
            Role::DistrictAdmin => 2,
            Role::SuperAdmin => 3,
        }
    }

    pub fn is_admin(&self) -> bool {
        !matches!(self, Role::Citizen)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::SectorAdmin => "sector_admin",
            Role::DistrictAdmin => "district_admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[sqlx(flatten)]
    pub location: Location,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_total_order() {
        assert!(Role::SuperAdmin.rank() > Role::DistrictAdmin.rank());
        assert!(Role::DistrictAdmin.rank() > Role::SectorAdmin.rank());
        assert!(Role::SectorAdmin.rank() > Role::Citizen.rank());
    }

    #[test]
    fn password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            role: Role::Citizen,
            location: Location::new("Kigali", "Gasabo", "Remera"),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "citizen");
        assert_eq!(json["location"]["sector"], "Remera");
    }
}
