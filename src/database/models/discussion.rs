use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "discussion_status", rename_all = "snake_case")]
pub enum DiscussionStatus {
    Open,
    Resolved,
}

/// Citizen-started public thread, admin-moderated.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Discussion {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
    #[sqlx(flatten)]
    pub location: Location,
    pub tags: Vec<String>,
    pub status: DiscussionStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Append-only thread entry. `is_official_response` is set server-side when
/// the author holds an admin role.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DiscussionComment {
    pub id: Uuid,
    pub discussion_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub is_official_response: bool,
    pub created_at: DateTime<Utc>,
}
