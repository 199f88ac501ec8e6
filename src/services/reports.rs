use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{feedback::service_stats, ServiceError};
use crate::database::models::report::{LocationCount, Report, ReportData, ReportFilters, StatusCount};
use crate::database::models::{ComplaintStatus, Role, ServiceType, User};

pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Complaint volume broken down by status and location.
    pub async fn complaints(&self, actor: &User, filters: ReportFilters) -> Result<Report, ServiceError> {
        let filters = scoped_filters(actor, filters);

        let mut qb = scoped_query(
            "SELECT status, COUNT(*) FROM complaints WHERE 1=1",
            &filters,
        );
        qb.push(" GROUP BY status ORDER BY status");
        let status_rows: Vec<(ComplaintStatus, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        let mut qb = scoped_query(
            "SELECT district, sector, COUNT(*) FROM complaints WHERE 1=1",
            &filters,
        );
        qb.push(" GROUP BY district, sector ORDER BY district, sector");
        let location_rows: Vec<(String, String, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        let mut qb = scoped_query(
            "SELECT COUNT(*) FROM complaints WHERE escalation_level >= 1",
            &filters,
        );
        let (escalated,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;

        let total: i64 = status_rows.iter().map(|(_, count)| count).sum();
        let data = ReportData::Complaints {
            total,
            by_status: status_rows
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            by_location: location_rows
                .into_iter()
                .map(|(district, sector, count)| LocationCount { district, sector, count })
                .collect(),
            escalation_rate: rate(escalated, total),
        };

        self.persist(actor, filters, data).await
    }

    /// Per-service-type satisfaction stats.
    pub async fn feedback(&self, actor: &User, filters: ReportFilters) -> Result<Report, ServiceError> {
        let mut filters = scoped_filters(actor, filters);
        // status/escalation filters only apply to the complaint pipeline
        filters.status = None;
        filters.escalation_level = None;

        let mut qb = scoped_query(
            "SELECT service_type, COUNT(*), SUM(rating)::bigint, \
             COUNT(*) FILTER (WHERE rating >= 4) FROM feedback WHERE 1=1",
            &filters,
        );
        qb.push(" GROUP BY service_type ORDER BY service_type");
        let rows: Vec<(ServiceType, i64, i64, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        let total = rows.iter().map(|(_, count, _, _)| count).sum();
        let data = ReportData::Feedback {
            total,
            services: rows
                .into_iter()
                .map(|(service_type, count, sum, high)| {
                    service_stats(service_type, count, sum, high)
                })
                .collect(),
        };

        self.persist(actor, filters, data).await
    }

    /// Discussion, comment and group activity.
    pub async fn engagement(&self, actor: &User, filters: ReportFilters) -> Result<Report, ServiceError> {
        let mut filters = scoped_filters(actor, filters);
        // status/escalation filters only apply to the complaint pipeline
        filters.status = None;
        filters.escalation_level = None;

        let mut qb = scoped_query(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'resolved') \
             FROM discussions WHERE 1=1",
            &filters,
        );
        let (opened, resolved): (i64, i64) = qb.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = scoped_prefixed_query(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE c.is_official_response) \
             FROM discussion_comments c JOIN discussions d ON d.id = c.discussion_id WHERE 1=1",
            "d.",
            &filters,
        );
        let (comments, official): (i64, i64) = qb.build_query_as().fetch_one(&self.pool).await?;

        let mut qb = scoped_prefixed_query(
            "SELECT COUNT(*) FROM group_members m JOIN groups g ON g.id = m.group_id WHERE 1=1",
            "g.",
            &filters,
        );
        let (memberships,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;

        let data = ReportData::Engagement {
            discussions_opened: opened,
            discussions_resolved: resolved,
            comments,
            official_responses: official,
            group_memberships: memberships,
        };

        self.persist(actor, filters, data).await
    }

    /// Resolution and escalation performance over the complaint pipeline.
    pub async fn performance(&self, actor: &User, filters: ReportFilters) -> Result<Report, ServiceError> {
        let filters = scoped_filters(actor, filters);

        let mut qb = scoped_query(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'resolved'), \
             COUNT(*) FILTER (WHERE escalation_level >= 1), \
             AVG(EXTRACT(EPOCH FROM (resolved_at - created_at)))::float8 \
             FROM complaints WHERE 1=1",
            &filters,
        );
        let (total, resolved, escalated, avg_resolution_secs): (i64, i64, i64, Option<f64>) =
            qb.build_query_as().fetch_one(&self.pool).await?;

        let data = ReportData::Performance {
            total,
            resolved,
            resolution_rate: rate(resolved, total),
            escalated,
            escalation_rate: rate(escalated, total),
            avg_resolution_secs,
        };

        self.persist(actor, filters, data).await
    }

    /// Re-render a persisted snapshot as CSV. Only the generating admin or a
    /// super admin may export.
    pub async fn export_csv(&self, actor: &User, report_id: Uuid) -> Result<String, ServiceError> {
        let report: Option<Report> = sqlx::query_as(
            "SELECT id, report_type, generated_by, filters, data, created_at \
             FROM reports WHERE id = $1",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        let report =
            report.ok_or_else(|| ServiceError::NotFound("Report not found".to_string()))?;

        if report.generated_by != actor.id && actor.role != Role::SuperAdmin {
            return Err(ServiceError::Forbidden(
                "You do not have access to this report".to_string(),
            ));
        }

        Ok(render_csv(&report.data.0))
    }

    async fn persist(
        &self,
        actor: &User,
        filters: ReportFilters,
        data: ReportData,
    ) -> Result<Report, ServiceError> {
        let report: Report = sqlx::query_as(
            "INSERT INTO reports (report_type, generated_by, filters, data) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, report_type, generated_by, filters, data, created_at",
        )
        .bind(data.report_type())
        .bind(actor.id)
        .bind(sqlx::types::Json(&filters))
        .bind(sqlx::types::Json(&data))
        .fetch_one(&self.pool)
        .await?;
        Ok(report)
    }
}

/// Fold the actor's jurisdiction into the requested filters. District admins
/// are always pinned to their district, sector admins to their
/// district+sector; super admins keep whatever they asked for.
pub fn scoped_filters(actor: &User, mut filters: ReportFilters) -> ReportFilters {
    match actor.role {
        Role::SectorAdmin => {
            filters.district = Some(actor.location.district.clone());
            filters.sector = Some(actor.location.sector.clone());
        }
        Role::DistrictAdmin => {
            filters.district = Some(actor.location.district.clone());
            filters.sector = None;
        }
        _ => {}
    }
    filters
}

fn scoped_query<'a>(base: &str, filters: &ReportFilters) -> QueryBuilder<'a, Postgres> {
    scoped_prefixed_query(base, "", filters)
}

/// Append filter clauses to a base query. `prefix` qualifies the column
/// names when the location/time columns live on a joined table.
fn scoped_prefixed_query<'a>(
    base: &str,
    prefix: &str,
    filters: &ReportFilters,
) -> QueryBuilder<'a, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(base);

    if let Some(district) = &filters.district {
        qb.push(format!(" AND {prefix}district = "))
            .push_bind(district.clone());
    }
    if let Some(sector) = &filters.sector {
        qb.push(format!(" AND {prefix}sector = "))
            .push_bind(sector.clone());
    }
    if let Some(from) = filters.from {
        qb.push(format!(" AND {prefix}created_at >= ")).push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(format!(" AND {prefix}created_at <= ")).push_bind(to);
    }
    if let Some(status) = filters.status {
        qb.push(format!(" AND {prefix}status = ")).push_bind(status);
    }
    if let Some(level) = filters.escalation_level {
        qb.push(format!(" AND {prefix}escalation_level = ")).push_bind(level);
    }

    qb
}

pub fn rate(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Render a snapshot payload as CSV text.
pub fn render_csv(data: &ReportData) -> String {
    let mut out = String::new();
    match data {
        ReportData::Complaints {
            total,
            by_status,
            by_location,
            escalation_rate,
        } => {
            out.push_str("category,label,value\n");
            out.push_str(&format!("summary,total,{}\n", total));
            out.push_str(&format!("summary,escalation_rate_pct,{:.2}\n", escalation_rate));
            for row in by_status {
                out.push_str(&format!("status,{},{}\n", row.status.as_str(), row.count));
            }
            for row in by_location {
                out.push_str(&format!(
                    "location,{},{}\n",
                    csv_escape(&format!("{}/{}", row.district, row.sector)),
                    row.count
                ));
            }
        }
        ReportData::Feedback { total, services } => {
            out.push_str("service_type,count,average_rating,satisfaction_pct\n");
            for row in services {
                out.push_str(&format!(
                    "{},{},{:.2},{:.2}\n",
                    csv_escape(&row.service_type),
                    row.count,
                    row.average_rating,
                    row.satisfaction_pct
                ));
            }
            out.push_str(&format!("total,{},,\n", total));
        }
        ReportData::Engagement {
            discussions_opened,
            discussions_resolved,
            comments,
            official_responses,
            group_memberships,
        } => {
            out.push_str("metric,value\n");
            out.push_str(&format!("discussions_opened,{}\n", discussions_opened));
            out.push_str(&format!("discussions_resolved,{}\n", discussions_resolved));
            out.push_str(&format!("comments,{}\n", comments));
            out.push_str(&format!("official_responses,{}\n", official_responses));
            out.push_str(&format!("group_memberships,{}\n", group_memberships));
        }
        ReportData::Performance {
            total,
            resolved,
            resolution_rate,
            escalated,
            escalation_rate,
            avg_resolution_secs,
        } => {
            out.push_str("metric,value\n");
            out.push_str(&format!("total,{}\n", total));
            out.push_str(&format!("resolved,{}\n", resolved));
            out.push_str(&format!("resolution_rate_pct,{:.2}\n", resolution_rate));
            out.push_str(&format!("escalated,{}\n", escalated));
            out.push_str(&format!("escalation_rate_pct,{:.2}\n", escalation_rate));
            match avg_resolution_secs {
                Some(secs) => out.push_str(&format!("avg_resolution_secs,{:.0}\n", secs)),
                None => out.push_str("avg_resolution_secs,\n"),
            }
        }
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::report::ServiceStats;
    use crate::database::models::{Location, Role};
    use chrono::Utc;

    fn admin(role: Role, district: &str, sector: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Admin".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            role,
            location: Location::new("Kigali", district, sector),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rates_handle_empty_totals() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(1, 4), 25.0);
        assert_eq!(rate(4, 4), 100.0);
    }

    #[test]
    fn sector_admin_is_pinned_to_sector() {
        let actor = admin(Role::SectorAdmin, "Gasabo", "Remera");
        let filters = scoped_filters(
            &actor,
            ReportFilters {
                district: Some("Nyarugenge".into()),
                sector: Some("Nyamirambo".into()),
                ..Default::default()
            },
        );
        assert_eq!(filters.district.as_deref(), Some("Gasabo"));
        assert_eq!(filters.sector.as_deref(), Some("Remera"));
    }

    #[test]
    fn district_admin_keeps_district_only() {
        let actor = admin(Role::DistrictAdmin, "Gasabo", "Kacyiru");
        let filters = scoped_filters(
            &actor,
            ReportFilters {
                sector: Some("Remera".into()),
                ..Default::default()
            },
        );
        assert_eq!(filters.district.as_deref(), Some("Gasabo"));
        assert!(filters.sector.is_none());
    }

    #[test]
    fn super_admin_filters_pass_through() {
        let actor = admin(Role::SuperAdmin, "", "");
        let filters = scoped_filters(
            &actor,
            ReportFilters {
                district: Some("Gasabo".into()),
                ..Default::default()
            },
        );
        assert_eq!(filters.district.as_deref(), Some("Gasabo"));
    }

    #[test]
    fn feedback_csv_renders_rows() {
        let data = ReportData::Feedback {
            total: 2,
            services: vec![ServiceStats {
                service_type: "health".into(),
                count: 2,
                average_rating: 3.0,
                satisfaction_pct: 50.0,
            }],
        };
        let csv = render_csv(&data);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "service_type,count,average_rating,satisfaction_pct"
        );
        assert_eq!(lines.next().unwrap(), "health,2,3.00,50.00");
        assert_eq!(lines.next().unwrap(), "total,2,,");
    }

    #[test]
    fn csv_escapes_embedded_commas() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
