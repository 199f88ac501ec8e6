use sqlx::{PgPool, QueryBuilder};

use super::ServiceError;
use crate::database::models::report::ServiceStats;
use crate::database::models::{Feedback, Role, ServiceType, User};

const FEEDBACK_COLUMNS: &str =
    "id, service_type, rating, comments, user_id, province, district, sector, created_at";

pub struct NewFeedback {
    pub service_type: ServiceType,
    pub rating: i16,
    pub comments: Option<String>,
}

pub struct FeedbackService {
    pool: PgPool,
}

impl FeedbackService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a service review. Immutable once created; the location is
    /// copied from the author's assignment.
    pub async fn submit(&self, actor: &User, input: NewFeedback) -> Result<Feedback, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if let Some(comments) = &input.comments {
            if comments.len() > 1000 {
                return Err(ServiceError::Validation(
                    "Comments must be at most 1000 characters long".to_string(),
                ));
            }
        }

        let feedback: Feedback = sqlx::query_as(&format!(
            "INSERT INTO feedback (service_type, rating, comments, user_id, province, district, sector) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(input.service_type)
        .bind(input.rating)
        .bind(&input.comments)
        .bind(actor.id)
        .bind(&actor.location.province)
        .bind(&actor.location.district)
        .bind(&actor.location.sector)
        .fetch_one(&self.pool)
        .await?;

        Ok(feedback)
    }

    /// Per-service-type stats, scoped to the caller's jurisdiction: district
    /// admins to their district, sector admins to their sector.
    pub async fn analytics(&self, actor: &User) -> Result<Vec<ServiceStats>, ServiceError> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT service_type, COUNT(*), SUM(rating)::bigint, \
             COUNT(*) FILTER (WHERE rating >= 4) FROM feedback WHERE 1=1",
        );

        match actor.role {
            Role::SectorAdmin => {
                qb.push(" AND sector = ").push_bind(&actor.location.sector);
                qb.push(" AND district = ").push_bind(&actor.location.district);
            }
            Role::DistrictAdmin => {
                qb.push(" AND district = ").push_bind(&actor.location.district);
            }
            _ => {}
        }

        qb.push(" GROUP BY service_type ORDER BY service_type");

        let rows: Vec<(ServiceType, i64, i64, i64)> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(service_type, count, rating_sum, high)| {
                service_stats(service_type, count, rating_sum, high)
            })
            .collect())
    }
}

/// Derive average rating and satisfaction percentage from raw counts.
pub fn service_stats(
    service_type: ServiceType,
    count: i64,
    rating_sum: i64,
    high_ratings: i64,
) -> ServiceStats {
    let (average_rating, satisfaction_pct) = if count == 0 {
        (0.0, 0.0)
    } else {
        (
            rating_sum as f64 / count as f64,
            high_ratings as f64 * 100.0 / count as f64,
        )
    };
    ServiceStats {
        service_type: service_type.as_str().to_string(),
        count,
        average_rating,
        satisfaction_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_two_ratings() {
        // ratings 5 and 1 for the health service
        let stats = service_stats(ServiceType::Health, 2, 6, 1);
        assert_eq!(stats.service_type, "health");
        assert_eq!(stats.count, 2);
        assert!((stats.average_rating - 3.0).abs() < f64::EPSILON);
        assert!((stats.satisfaction_pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_bucket_yields_zeroes() {
        let stats = service_stats(ServiceType::Water, 0, 0, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.satisfaction_pct, 0.0);
    }

    #[test]
    fn all_high_ratings_is_full_satisfaction() {
        let stats = service_stats(ServiceType::Roads, 4, 18, 4);
        assert!((stats.satisfaction_pct - 100.0).abs() < f64::EPSILON);
        assert!((stats.average_rating - 4.5).abs() < f64::EPSILON);
    }
}
