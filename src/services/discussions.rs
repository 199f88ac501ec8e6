use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use super::{access, validation, ServiceError};
use crate::database::models::{Discussion, DiscussionComment, DiscussionStatus, Role, User};
use crate::events::{outbox, DomainEvent};

const DISCUSSION_COLUMNS: &str = "id, title, description, created_by, province, district, \
     sector, tags, status, created_at, resolved_at";

const COMMENT_COLUMNS: &str =
    "id, discussion_id, user_id, text, is_official_response, created_at";

pub struct NewDiscussion {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DiscussionFilters {
    pub status: Option<DiscussionStatus>,
    pub tag: Option<String>,
}

pub struct DiscussionService {
    pool: PgPool,
}

impl DiscussionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a thread. The location is copied from the author's assignment,
    /// and the sector/district rooms for that location are notified.
    pub async fn create(&self, actor: &User, input: NewDiscussion) -> Result<Discussion, ServiceError> {
        validation::validate_length("Title", &input.title, 5, 200)
            .map_err(ServiceError::Validation)?;
        validation::validate_length("Description", &input.description, 1, 2000)
            .map_err(ServiceError::Validation)?;

        let mut tx = self.pool.begin().await?;

        let discussion: Discussion = sqlx::query_as(&format!(
            "INSERT INTO discussions (title, description, created_by, province, district, sector, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {DISCUSSION_COLUMNS}"
        ))
        .bind(input.title.trim())
        .bind(input.description.trim())
        .bind(actor.id)
        .bind(&actor.location.province)
        .bind(&actor.location.district)
        .bind(&actor.location.sector)
        .bind(&input.tags)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::DiscussionCreated {
                discussion_id: discussion.id,
                title: discussion.title.clone(),
                location: discussion.location.clone(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(discussion)
    }

    /// Thread with its comments, gated like the role-scoped listing.
    pub async fn get(
        &self,
        actor: &User,
        discussion_id: Uuid,
    ) -> Result<(Discussion, Vec<DiscussionComment>), ServiceError> {
        let discussion = self.load(discussion_id).await?;

        let visible = match actor.role {
            Role::Citizen => discussion.created_by == actor.id,
            _ => access::admin_scope_matches(actor, &discussion.location),
        };
        if !visible {
            return Err(ServiceError::Forbidden(
                "You do not have access to this discussion".to_string(),
            ));
        }

        let comments: Vec<DiscussionComment> = sqlx::query_as(&format!(
            "SELECT {COMMENT_COLUMNS} FROM discussion_comments \
             WHERE discussion_id = $1 ORDER BY created_at ASC"
        ))
        .bind(discussion.id)
        .fetch_all(&self.pool)
        .await?;

        Ok((discussion, comments))
    }

    /// Append a comment. Citizens may only comment on their own threads;
    /// sector and district admins only within their jurisdiction. Admin
    /// comments are flagged as official responses.
    pub async fn add_comment(
        &self,
        actor: &User,
        discussion_id: Uuid,
        text: &str,
    ) -> Result<DiscussionComment, ServiceError> {
        validation::validate_length("Comment", text, 1, 2000).map_err(ServiceError::Validation)?;

        let discussion = self.load(discussion_id).await?;

        let allowed = match actor.role {
            Role::Citizen => discussion.created_by == actor.id,
            Role::SectorAdmin | Role::DistrictAdmin => {
                access::admin_scope_matches(actor, &discussion.location)
            }
            Role::SuperAdmin => false,
        };
        if !allowed {
            return Err(ServiceError::Forbidden(
                "You cannot comment on this discussion".to_string(),
            ));
        }

        let is_official = actor.role.is_admin();

        let mut tx = self.pool.begin().await?;

        let comment: DiscussionComment = sqlx::query_as(&format!(
            "INSERT INTO discussion_comments (discussion_id, user_id, text, is_official_response) \
             VALUES ($1, $2, $3, $4) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(discussion.id)
        .bind(actor.id)
        .bind(text.trim())
        .bind(is_official)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::CommentAdded {
                discussion_id: discussion.id,
                comment_id: comment.id,
                is_official_response: comment.is_official_response,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(comment)
    }

    /// Close a thread. Sector/district admins only, within jurisdiction.
    pub async fn resolve(&self, actor: &User, discussion_id: Uuid) -> Result<Discussion, ServiceError> {
        let discussion = self.load(discussion_id).await?;

        let allowed = matches!(actor.role, Role::SectorAdmin | Role::DistrictAdmin)
            && access::admin_scope_matches(actor, &discussion.location);
        if !allowed {
            return Err(ServiceError::Forbidden(
                "You cannot resolve this discussion".to_string(),
            ));
        }

        if discussion.status == DiscussionStatus::Resolved {
            return Err(ServiceError::BadRequest(
                "Discussion is already resolved".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let discussion: Discussion = sqlx::query_as(&format!(
            "UPDATE discussions SET status = 'resolved', resolved_at = now() \
             WHERE id = $1 RETURNING {DISCUSSION_COLUMNS}"
        ))
        .bind(discussion.id)
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::DiscussionResolved {
                discussion_id: discussion.id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(discussion)
    }

    /// Role-scoped listing with optional status and tag filters.
    pub async fn list(
        &self,
        actor: &User,
        filters: DiscussionFilters,
    ) -> Result<Vec<Discussion>, ServiceError> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE 1=1"
        ));

        match actor.role {
            Role::Citizen => {
                qb.push(" AND created_by = ").push_bind(actor.id);
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

        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(tag) = filters.tag {
            qb.push(" AND ").push_bind(tag).push(" = ANY(tags)");
        }

        qb.push(" ORDER BY created_at DESC");

        let discussions: Vec<Discussion> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(discussions)
    }

    async fn load(&self, discussion_id: Uuid) -> Result<Discussion, ServiceError> {
        let discussion: Option<Discussion> = sqlx::query_as(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE id = $1"
        ))
        .bind(discussion_id)
        .fetch_optional(&self.pool)
        .await?;
        discussion.ok_or_else(|| ServiceError::NotFound("Discussion not found".to_string()))
    }
}
