use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "complaint_status", rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    // Declared in the schema; no operation currently transitions into it.
    InProgress,
    Resolved,
    Escalated,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Escalated => "escalated",
        }
    }
}

/// Citizen-reported issue routed through the admin hierarchy.
///
/// Escalation level 0 means the complaint is owned by the assigned sector
/// admin; level 1 adds a district admin assignee. Level 2 is reserved.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Complaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub escalation_level: i16,
    pub user_id: Uuid,
    pub sector_admin_id: Uuid,
    pub district_admin_id: Option<Uuid>,
    #[sqlx(flatten)]
    pub location: Location,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Complaint {
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, ComplaintStatus::Resolved)
    }
}
