use serde::Serialize;
use sqlx::{PgPool, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{access, validation, ServiceError};
use crate::database::models::{Complaint, ComplaintStatus, Location, Role, User};
use crate::events::{outbox, DomainEvent};

const COMPLAINT_COLUMNS: &str = "id, title, description, status, escalation_level, user_id, \
     sector_admin_id, district_admin_id, province, district, sector, created_at, resolved_at";

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, province, district, sector, created_at";

pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub location: Location,
}

#[derive(Debug, Serialize)]
pub struct DashboardCounts {
    pub pending: i64,
    pub in_progress: i64,
    pub escalated: i64,
    pub resolved: i64,
    pub total: i64,
}

pub struct ComplaintService {
    pool: PgPool,
}

impl ComplaintService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a complaint and route it to the sector admin matching its
    /// location. Fails 404 when no such admin exists. The assignment and the
    /// notification event commit atomically.
    pub async fn submit(&self, actor: &User, input: NewComplaint) -> Result<Complaint, ServiceError> {
        validation::validate_length("Title", &input.title, 5, 200)
            .map_err(ServiceError::Validation)?;
        validation::validate_length("Description", &input.description, 1, 2000)
            .map_err(ServiceError::Validation)?;

        let sector_admin = self
            .find_admin(Role::SectorAdmin, &input.location.district, Some(&input.location.sector))
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(
                    "No sector administrator is assigned to this location".to_string(),
                )
            })?;

        let mut tx = self.pool.begin().await?;

        let complaint: Complaint = sqlx::query_as(&format!(
            "INSERT INTO complaints \
             (title, description, user_id, sector_admin_id, province, district, sector) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(actor.id)
        .bind(sector_admin.id)
        .bind(&input.location.province)
        .bind(&input.location.district)
        .bind(&input.location.sector)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::ComplaintSubmitted {
                complaint_id: complaint.id,
                title: complaint.title.clone(),
                sector_admin_id: sector_admin.id,
                location: complaint.location.clone(),
            },
        )
        .await?;

        tx.commit().await?;

        info!("Complaint {} routed to sector admin {}", complaint.id, sector_admin.id);
        Ok(complaint)
    }

    /// Hand the complaint to the district tier. The lookup is scoped to the
    /// actor's jurisdiction and to escalation level 0, so cross-jurisdiction
    /// or repeated escalations surface as not-found rather than forbidden.
    pub async fn escalate(&self, actor: &User, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        let complaint: Option<Complaint> = sqlx::query_as(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints \
             WHERE id = $1 AND sector = $2 AND district = $3 AND escalation_level = 0"
        ))
        .bind(complaint_id)
        .bind(&actor.location.sector)
        .bind(&actor.location.district)
        .fetch_optional(&self.pool)
        .await?;

        let complaint = complaint
            .ok_or_else(|| ServiceError::NotFound("Complaint not found".to_string()))?;

        let district_admin = self
            .find_admin(Role::DistrictAdmin, &complaint.location.district, None)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(
                    "No district administrator is assigned to this district".to_string(),
                )
            })?;

        let mut tx = self.pool.begin().await?;

        let complaint: Complaint = sqlx::query_as(&format!(
            "UPDATE complaints SET escalation_level = 1, status = 'escalated', \
             district_admin_id = $2 WHERE id = $1 RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(complaint.id)
        .bind(district_admin.id)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::ComplaintEscalated {
                complaint_id: complaint.id,
                title: complaint.title.clone(),
                district_admin_id: district_admin.id,
                district: complaint.location.district.clone(),
            },
        )
        .await?;

        tx.commit().await?;

        info!("Complaint {} escalated to district admin {}", complaint.id, district_admin.id);
        Ok(complaint)
    }

    /// Close out a complaint. Only the currently-assigned admin for the
    /// actor's tier may resolve, even inside the right jurisdiction.
    pub async fn resolve(&self, actor: &User, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        let complaint: Option<Complaint> = sqlx::query_as(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
        ))
        .bind(complaint_id)
        .fetch_optional(&self.pool)
        .await?;

        let complaint = complaint
            .ok_or_else(|| ServiceError::NotFound("Complaint not found".to_string()))?;

        if complaint.is_resolved() {
            return Err(ServiceError::BadRequest(
                "Complaint is already resolved".to_string(),
            ));
        }

        let assigned = match actor.role {
            Role::SectorAdmin => complaint.sector_admin_id == actor.id,
            Role::DistrictAdmin => complaint.district_admin_id == Some(actor.id),
            _ => false,
        };
        if !assigned {
            return Err(ServiceError::Forbidden(
                "Only the assigned administrator can resolve this complaint".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let complaint: Complaint = sqlx::query_as(&format!(
            "UPDATE complaints SET status = 'resolved', resolved_at = now() \
             WHERE id = $1 RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(complaint.id)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::ComplaintResolved {
                complaint_id: complaint.id,
                title: complaint.title.clone(),
                user_id: complaint.user_id,
                sector_admin_id: complaint.sector_admin_id,
                district_admin_id: complaint.district_admin_id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(complaint)
    }

    /// Complaints assigned to the calling sector admin.
    pub async fn sector_queue(&self, actor: &User) -> Result<Vec<Complaint>, ServiceError> {
        let complaints: Vec<Complaint> = sqlx::query_as(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints \
             WHERE sector_admin_id = $1 ORDER BY created_at DESC"
        ))
        .bind(actor.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(complaints)
    }

    /// Role-scoped listing: citizens their own, sector admins their
    /// sector+district, district admins their district, super admins all.
    pub async fn list_for(
        &self,
        actor: &User,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<Complaint>, ServiceError> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE 1=1"
        ));

        match actor.role {
            Role::Citizen => {
                qb.push(" AND user_id = ").push_bind(actor.id);
            }
            Role::SectorAdmin => {
                qb.push(" AND sector = ").push_bind(&actor.location.sector);
                qb.push(" AND district = ").push_bind(&actor.location.district);
            }
            Role::DistrictAdmin => {
                qb.push(" AND district = ").push_bind(&actor.location.district);
            }
            Role::SuperAdmin => {}
        }

        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }

        qb.push(" ORDER BY created_at DESC");

        let complaints: Vec<Complaint> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(complaints)
    }

    /// Single complaint, gated by the generic ownership/jurisdiction check.
    pub async fn get(&self, actor: &User, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        let complaint: Option<Complaint> = sqlx::query_as(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
        ))
        .bind(complaint_id)
        .fetch_optional(&self.pool)
        .await?;

        let complaint = complaint
            .ok_or_else(|| ServiceError::NotFound("Complaint not found".to_string()))?;

        if !access::can_access(actor, &complaint.location, complaint.user_id) {
            return Err(ServiceError::Forbidden(
                "You do not have access to this complaint".to_string(),
            ));
        }

        Ok(complaint)
    }

    /// System-wide counts by status for the super-admin dashboard.
    pub async fn dashboard(&self) -> Result<DashboardCounts, ServiceError> {
        let rows: Vec<(ComplaintStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM complaints GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = DashboardCounts {
            pending: 0,
            in_progress: 0,
            escalated: 0,
            resolved: 0,
            total: 0,
        };
        for (status, count) in rows {
            counts.total += count;
            match status {
                ComplaintStatus::Pending => counts.pending = count,
                ComplaintStatus::InProgress => counts.in_progress = count,
                ComplaintStatus::Escalated => counts.escalated = count,
                ComplaintStatus::Resolved => counts.resolved = count,
            }
        }
        Ok(counts)
    }

    /// First admin of the given role matching the location, oldest account
    /// first. The tie-break is arbitrary but deterministic.
    async fn find_admin(
        &self,
        role: Role,
        district: &str,
        sector: Option<&str>,
    ) -> Result<Option<User>, ServiceError> {
        let user: Option<User> = match sector {
            Some(sector) => {
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE role = $1 AND district = $2 AND sector = $3 \
                     ORDER BY created_at ASC LIMIT 1"
                ))
                .bind(role)
                .bind(district)
                .bind(sector)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE role = $1 AND district = $2 \
                     ORDER BY created_at ASC LIMIT 1"
                ))
                .bind(role)
                .bind(district)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(user)
    }
}
