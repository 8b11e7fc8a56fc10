use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Registration model - a user signing up for an event, project or training.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub registration_type: String,
    pub ref_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewRegistration {
    pub registration_type: String,
    pub ref_id: Uuid,
}

impl Registration {
    pub async fn insert(
        user_id: Uuid,
        registration_type: &str,
        ref_id: Uuid,
        status: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO registrations (user_id, registration_type, ref_id, status)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(user_id)
        .bind(registration_type)
        .bind(ref_id)
        .bind(status)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Transactional variant used by training registration so the slot claim
    /// and the registration row commit together.
    pub async fn insert_tx(
        user_id: Uuid,
        registration_type: &str,
        ref_id: Uuid,
        status: &str,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO registrations (user_id, registration_type, ref_id, status)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(user_id)
        .bind(registration_type)
        .bind(ref_id)
        .bind(status)
        .fetch_one(&mut **tx)
        .await
        .map_err(Into::into)
    }

    pub async fn exists(
        user_id: Uuid,
        registration_type: &str,
        ref_id: Uuid,
        pool: &PgPool,
    ) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM registrations
                WHERE user_id = $1
                  AND registration_type = $2
                  AND ref_id = $3
                  AND status <> 'cancelled'
             )",
        )
        .bind(user_id)
        .bind(registration_type)
        .bind(ref_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM registrations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
