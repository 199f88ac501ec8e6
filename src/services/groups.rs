use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{access, validation, ServiceError};
use crate::database::models::{Group, GroupAnnouncement, GroupMember, Role, User};
use crate::events::{outbox, DomainEvent};

const GROUP_COLUMNS: &str =
    "id, name, description, province, district, sector, created_by, created_at";

const ANNOUNCEMENT_COLUMNS: &str = "id, group_id, message, posted_by, created_at";

pub struct NewGroup {
    pub name: String,
    pub description: String,
}

pub struct GroupService {
    pool: PgPool,
}

impl GroupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a jurisdiction-scoped group. The location is copied from the
    /// creating admin, who becomes the first (permanent) member.
    pub async fn create(&self, actor: &User, input: NewGroup) -> Result<Group, ServiceError> {
        validation::validate_length("Name", &input.name, 3, 100)
            .map_err(ServiceError::Validation)?;
        validation::validate_length("Description", &input.description, 1, 1000)
            .map_err(ServiceError::Validation)?;

        let mut tx = self.pool.begin().await?;

        let group: Group = sqlx::query_as(&format!(
            "INSERT INTO groups (name, description, province, district, sector, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {GROUP_COLUMNS}"
        ))
        .bind(input.name.trim())
        .bind(input.description.trim())
        .bind(&actor.location.province)
        .bind(&actor.location.district)
        .bind(&actor.location.sector)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES ($1, $2)")
            .bind(group.id)
            .bind(actor.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Group {} created by {}", group.id, actor.id);
        Ok(group)
    }

    /// Join a group. Rejects double-joins and callers whose location does
    /// not match under the district-admin-relaxed rule.
    pub async fn join(&self, actor: &User, group_id: Uuid) -> Result<GroupMember, ServiceError> {
        let group = self.load(group_id).await?;

        if self.is_member(group.id, actor.id).await? {
            return Err(ServiceError::BadRequest(
                "Already a member of this group".to_string(),
            ));
        }

        if !access::can_join_group(actor, &group.location) {
            return Err(ServiceError::Forbidden(
                "Your assigned location does not match this group".to_string(),
            ));
        }

        let member: GroupMember = sqlx::query_as(
            "INSERT INTO group_members (group_id, user_id) VALUES ($1, $2) \
             RETURNING group_id, user_id, joined_at",
        )
        .bind(group.id)
        .bind(actor.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Leave a group. The creator is a permanent member and can never leave.
    pub async fn leave(&self, actor: &User, group_id: Uuid) -> Result<(), ServiceError> {
        let group = self.load(group_id).await?;

        if group.created_by == actor.id {
            return Err(ServiceError::BadRequest(
                "The group creator cannot leave the group".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group.id)
            .bind(actor.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::BadRequest(
                "Not a member of this group".to_string(),
            ));
        }

        Ok(())
    }

    /// Post an announcement. Creator-only; members are notified through the
    /// group room.
    pub async fn post_announcement(
        &self,
        actor: &User,
        group_id: Uuid,
        message: &str,
    ) -> Result<GroupAnnouncement, ServiceError> {
        validation::validate_length("Message", message, 1, 2000)
            .map_err(ServiceError::Validation)?;

        let group = self.load(group_id).await?;

        if group.created_by != actor.id {
            return Err(ServiceError::Forbidden(
                "Only the group creator can post announcements".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let announcement: GroupAnnouncement = sqlx::query_as(&format!(
            "INSERT INTO group_announcements (group_id, message, posted_by) \
             VALUES ($1, $2, $3) RETURNING {ANNOUNCEMENT_COLUMNS}"
        ))
        .bind(group.id)
        .bind(message.trim())
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::AnnouncementPosted {
                group_id: group.id,
                announcement_id: announcement.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(announcement)
    }

    /// Announcements feed, member-only.
    pub async fn announcements(
        &self,
        actor: &User,
        group_id: Uuid,
    ) -> Result<Vec<GroupAnnouncement>, ServiceError> {
        let group = self.load(group_id).await?;
        self.ensure_member(group.id, actor.id).await?;

        let announcements: Vec<GroupAnnouncement> = sqlx::query_as(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM group_announcements \
             WHERE group_id = $1 ORDER BY created_at DESC"
        ))
        .bind(group.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(announcements)
    }

    /// Group detail with membership, member-only.
    pub async fn get(
        &self,
        actor: &User,
        group_id: Uuid,
    ) -> Result<(Group, Vec<GroupMember>), ServiceError> {
        let group = self.load(group_id).await?;
        self.ensure_member(group.id, actor.id).await?;

        let members: Vec<GroupMember> = sqlx::query_as(
            "SELECT group_id, user_id, joined_at FROM group_members \
             WHERE group_id = $1 ORDER BY joined_at ASC",
        )
        .bind(group.id)
        .fetch_all(&self.pool)
        .await?;

        Ok((group, members))
    }

    /// Groups visible to the caller: those whose location they could join.
    /// Super admins see everything.
    pub async fn list(&self, actor: &User) -> Result<Vec<Group>, ServiceError> {
        let groups: Vec<Group> = match actor.role {
            Role::SuperAdmin => {
                sqlx::query_as(&format!(
                    "SELECT {GROUP_COLUMNS} FROM groups ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            Role::DistrictAdmin => {
                sqlx::query_as(&format!(
                    "SELECT {GROUP_COLUMNS} FROM groups \
                     WHERE province = $1 AND district = $2 ORDER BY created_at DESC"
                ))
                .bind(&actor.location.province)
                .bind(&actor.location.district)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as(&format!(
                    "SELECT {GROUP_COLUMNS} FROM groups \
                     WHERE province = $1 AND district = $2 AND sector = $3 \
                     ORDER BY created_at DESC"
                ))
                .bind(&actor.location.province)
                .bind(&actor.location.district)
                .bind(&actor.location.sector)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(groups)
    }

    async fn load(&self, group_id: Uuid) -> Result<Group, ServiceError> {
        let group: Option<Group> =
            sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"))
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await?;
        group.ok_or_else(|| ServiceError::NotFound("Group not found".to_string()))
    }

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }

    async fn ensure_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        if !self.is_member(group_id, user_id).await? {
            return Err(ServiceError::Forbidden(
                "Only group members can view this group".to_string(),
            ));
        }
        Ok(())
    }
}

/// Enroll a newly-registered citizen into every group matching their full
/// location. Runs inside the registration transaction.
pub async fn auto_enroll(
    tx: &mut Transaction<'_, Postgres>,
    user: &User,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO group_members (group_id, user_id) \
         SELECT id, $1 FROM groups WHERE province = $2 AND district = $3 AND sector = $4 \
         ON CONFLICT DO NOTHING",
    )
    .bind(user.id)
    .bind(&user.location.province)
    .bind(&user.location.district)
    .bind(&user.location.sector)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}
