use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::location::Location;

/// Jurisdiction-scoped community/announcement channel. The creator is always
/// a member and can never leave.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[sqlx(flatten)]
    pub location: Location,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GroupAnnouncement {
    pub id: Uuid,
    pub group_id: Uuid,
    pub message: String,
    pub posted_by: Uuid,
    pub created_at: DateTime<Utc>,
}
