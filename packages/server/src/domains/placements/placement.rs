use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Performance {
    pub rating: Option<f64>,
    pub feedback: Option<String>,
    pub last_review: Option<DateTime<Utc>>,
}

/// Placement model - a volunteer's assignment to a hub, optionally tied to
/// the request that prompted it.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Placement {
    pub id: Uuid,
    pub volunteer_id: Uuid,
    pub hub_id: Uuid,
    pub request_id: Option<Uuid>,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub expected_end_date: Option<DateTime<Utc>>,
    pub role: Option<String>,
    pub responsibilities: Vec<String>,
    pub supervisor_id: Option<Uuid>,
    pub performance: Json<Performance>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Self-service placement payload (volunteer applies to a hub).
#[derive(Debug, Deserialize)]
pub struct NewPlacement {
    pub hub_id: Uuid,
    pub request_id: Option<Uuid>,
    pub role: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub expected_end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Placement {
    pub async fn insert(volunteer_id: Uuid, new: &NewPlacement, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO placements (
                volunteer_id, hub_id, request_id, role, responsibilities,
                start_date, expected_end_date, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(volunteer_id)
        .bind(new.hub_id)
        .bind(new.request_id)
        .bind(&new.role)
        .bind(&new.responsibilities)
        .bind(new.start_date)
        .bind(new.expected_end_date)
        .bind(&new.notes)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Placement created through admin match approval. Starts active
    /// immediately with the request's title as the role.
    pub async fn insert_active(
        volunteer_id: Uuid,
        hub_id: Uuid,
        request_id: Uuid,
        role: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO placements (volunteer_id, hub_id, request_id, role, status, start_date)
             VALUES ($1, $2, $3, $4, 'active', now())
             RETURNING *",
        )
        .bind(volunteer_id)
        .bind(hub_id)
        .bind(request_id)
        .bind(role)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM placements WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_for_volunteer(volunteer_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM placements WHERE volunteer_id = $1 ORDER BY created_at DESC",
        )
        .bind(volunteer_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(
        status: Option<&str>,
        hub_id: Option<Uuid>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM placements
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::uuid IS NULL OR hub_id = $2)
             ORDER BY created_at DESC",
        )
        .bind(status)
        .bind(hub_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Status transition. Completing or terminating a placement stamps the
    /// end date.
    pub async fn set_status(id: Uuid, status: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE placements
             SET status = $2,
                 end_date = CASE
                     WHEN $2 IN ('completed', 'terminated') THEN now()
                     ELSE end_date
                 END,
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM placements WHERE status = 'active'")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
