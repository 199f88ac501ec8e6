use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{access, groups, is_unique_violation, validation, ServiceError};
use crate::auth::{self, password, Claims};
use crate::database::models::{Location, Role, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, province, district, sector, created_at";

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub location: Location,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Self-service registration. Always creates a citizen; elevated roles
    /// are provisioned through `bootstrap` or `promote`, never through the
    /// public endpoint. The new citizen is auto-enrolled into every group
    /// matching their location.
    pub async fn register(&self, new_user: NewUser) -> Result<(User, String), ServiceError> {
        validation::validate_name(&new_user.name).map_err(ServiceError::Validation)?;
        validation::validate_email(&new_user.email).map_err(ServiceError::Validation)?;
        validation::validate_password(&new_user.password).map_err(ServiceError::Validation)?;

        if matches!(new_user.role, Some(role) if role != Role::Citizen) {
            return Err(ServiceError::Forbidden(
                "Elevated roles are provisioned by an administrator".to_string(),
            ));
        }

        let password_hash = password::hash_password(&new_user.password)?;

        let mut tx = self.pool.begin().await?;

        let user: User = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash, role, province, district, sector) \
             VALUES ($1, $2, $3, 'citizen', $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.name.trim())
        .bind(new_user.email.to_lowercase())
        .bind(&password_hash)
        .bind(&new_user.location.province)
        .bind(&new_user.location.district)
        .bind(&new_user.location.sector)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("An account with this email already exists".to_string())
            } else {
                ServiceError::Database(e)
            }
        })?;

        let enrolled = groups::auto_enroll(&mut tx, &user).await?;
        tx.commit().await?;

        info!("Registered citizen {} ({} groups auto-joined)", user.id, enrolled);

        let token = auth::generate_token(&Claims::new(user.id))?;
        Ok((user, token))
    }

    /// Credential login. The same generic 401 covers missing input, unknown
    /// email and mismatched password so accounts cannot be enumerated.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), ServiceError> {
        let generic =
            || ServiceError::Unauthorized("Incorrect email or password".to_string());

        if email.is_empty() || password.is_empty() {
            return Err(generic());
        }

        let user: Option<User> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email.to_lowercase())
                .fetch_optional(&self.pool)
                .await?;

        let user = user.ok_or_else(generic)?;

        if !password::verify_password(password, &user.password_hash) {
            return Err(generic());
        }

        let token = auth::generate_token(&Claims::new(user.id))?;
        Ok((user, token))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, ServiceError> {
        let user: Option<User> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        user.ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    /// Role/location mutation. The actor must outrank both the target's
    /// current role and the requested one.
    pub async fn promote(
        &self,
        actor: &User,
        target_id: Uuid,
        new_role: Role,
        new_location: Option<Location>,
    ) -> Result<User, ServiceError> {
        let target = self.find_by_id(target_id).await?;

        if !access::can_change_role(actor, target.role, new_role) {
            return Err(ServiceError::Forbidden(
                "Changing this role requires a higher-ranked administrator".to_string(),
            ));
        }

        let location = new_location.unwrap_or(target.location);
        let user: User = sqlx::query_as(&format!(
            "UPDATE users SET role = $2, province = $3, district = $4, sector = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(target.id)
        .bind(new_role)
        .bind(&location.province)
        .bind(&location.district)
        .bind(&location.sector)
        .fetch_one(&self.pool)
        .await?;

        info!("{} set role of {} to {}", actor.id, user.id, new_role);
        Ok(user)
    }

    /// Seed the very first account as a super admin. A single conditional
    /// insert keeps two concurrent bootstraps from both observing an empty
    /// table.
    pub async fn bootstrap_super_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        location: Location,
    ) -> Result<User, ServiceError> {
        validation::validate_name(name).map_err(ServiceError::Validation)?;
        validation::validate_email(email).map_err(ServiceError::Validation)?;
        validation::validate_password(password).map_err(ServiceError::Validation)?;

        let password_hash = password::hash_password(password)?;

        let user: Option<User> = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash, role, province, district, sector) \
             SELECT $1, $2, $3, 'super_admin', $4, $5, $6 \
             WHERE NOT EXISTS (SELECT 1 FROM users) RETURNING {USER_COLUMNS}"
        ))
        .bind(name.trim())
        .bind(email.to_lowercase())
        .bind(&password_hash)
        .bind(&location.province)
        .bind(&location.district)
        .bind(&location.sector)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| {
            ServiceError::Conflict(
                "Bootstrap is only available on an empty system; users already exist".to_string(),
            )
        })
    }
}
