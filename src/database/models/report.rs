use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::complaint::ComplaintStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "report_type", rename_all = "snake_case")]
pub enum ReportType {
    Complaints,
    Feedback,
    Engagement,
    Performance,
}

/// Filters captured alongside a snapshot so an export can be traced back to
/// the query that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_level: Option<i16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: ComplaintStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCount {
    pub district: String,
    pub sector: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub service_type: String,
    pub count: i64,
    pub average_rating: f64,
    /// Share of ratings >= 4, in percent.
    pub satisfaction_pct: f64,
}

/// One explicit result shape per report type. The tag is persisted with the
/// payload so exports can be re-rendered without consulting the parent row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportData {
    Complaints {
        total: i64,
        by_status: Vec<StatusCount>,
        by_location: Vec<LocationCount>,
        escalation_rate: f64,
    },
    Feedback {
        total: i64,
        services: Vec<ServiceStats>,
    },
    Engagement {
        discussions_opened: i64,
        discussions_resolved: i64,
        comments: i64,
        official_responses: i64,
        group_memberships: i64,
    },
    Performance {
        total: i64,
        resolved: i64,
        resolution_rate: f64,
        escalated: i64,
        escalation_rate: f64,
        avg_resolution_secs: Option<f64>,
    },
}

impl ReportData {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportData::Complaints { .. } => ReportType::Complaints,
            ReportData::Feedback { .. } => ReportType::Feedback,
            ReportData::Engagement { .. } => ReportType::Engagement,
            ReportData::Performance { .. } => ReportType::Performance,
        }
    }
}

/// Persisted snapshot of an aggregation result.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub report_type: ReportType,
    pub generated_by: Uuid,
    pub filters: sqlx::types::Json<ReportFilters>,
    pub data: sqlx::types::Json<ReportData>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_data_round_trips_with_tag() {
        let data = ReportData::Performance {
            total: 10,
            resolved: 4,
            resolution_rate: 40.0,
            escalated: 2,
            escalation_rate: 20.0,
            avg_resolution_secs: Some(3600.0),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "performance");

        let back: ReportData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
        assert_eq!(back.report_type(), ReportType::Performance);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let json = serde_json::json!({ "type": "sentiment", "total": 1 });
        assert!(serde_json::from_value::<ReportData>(json).is_err());
    }

    #[test]
    fn filters_omit_unset_fields() {
        let filters = ReportFilters {
            district: Some("Gasabo".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["district"], "Gasabo");
        assert!(json.get("sector").is_none());
        assert!(json.get("from").is_none());
    }
}
