use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub provided: bool,
    pub name: Option<String>,
    pub validity_months: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingCost {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub free: bool,
}

/// Training model - a scheduled course volunteers can register for, with an
/// optional participant cap.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Training {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: String,
    pub instructor_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub status: String,
    pub materials: Json<Vec<Material>>,
    pub prerequisites: Vec<String>,
    pub certification: Json<Certification>,
    pub cost: Json<TrainingCost>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_level() -> String {
    "beginner".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewTraining {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_level")]
    pub level: String,
    pub instructor_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub materials: Json<Vec<Material>>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub certification: Json<Certification>,
    #[serde(default)]
    pub cost: Json<TrainingCost>,
}

impl Training {
    /// `instructor_id` falls back to the creating admin when the payload
    /// omits one.
    pub async fn insert(new: &NewTraining, instructor_id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO trainings (
                title, description, category, level, instructor_id,
                start_date, end_date, duration, location, max_participants,
                materials, prerequisites, certification, cost
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.level)
        .bind(new.instructor_id.unwrap_or(instructor_id))
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.duration)
        .bind(&new.location)
        .bind(new.max_participants)
        .bind(&new.materials)
        .bind(&new.prerequisites)
        .bind(&new.certification)
        .bind(&new.cost)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM trainings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(
        status: Option<&str>,
        category: Option<&str>,
        level: Option<&str>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM trainings
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR category = $2)
               AND ($3::text IS NULL OR level = $3)
             ORDER BY start_date ASC NULLS LAST, created_at DESC",
        )
        .bind(status)
        .bind(category)
        .bind(level)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Claim a participant slot. Returns the updated training, or `None`
    /// when the training is already at capacity.
    pub async fn claim_slot(
        id: Uuid,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE trainings
             SET current_participants = current_participants + 1, updated_at = now()
             WHERE id = $1
               AND (max_participants IS NULL
                    OR current_participants < max_participants)
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Into::into)
    }

    /// Trainings the user has registered for.
    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT t.* FROM trainings t
             JOIN registrations r
               ON r.ref_id = t.id AND r.registration_type = 'training'
             WHERE r.user_id = $1 AND r.status <> 'cancelled'
             ORDER BY t.start_date ASC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_completed(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM trainings WHERE status = 'completed'")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
