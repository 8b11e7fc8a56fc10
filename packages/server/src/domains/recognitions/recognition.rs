use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Figures backing the recognition (hours served, people reached).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionMetrics {
    pub hours: Option<f64>,
    pub activities: Option<i32>,
    pub impact: Option<String>,
}

/// Recognition model - an award or badge issued to a user.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recognition {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recognition_type: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub issued_by: Option<Uuid>,
    pub issued_date: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub featured: bool,
    pub image: Option<String>,
    pub metrics: Json<RecognitionMetrics>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewRecognition {
    pub user_id: Uuid,
    pub recognition_type: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    pub image: Option<String>,
    #[serde(default)]
    pub metrics: Json<RecognitionMetrics>,
}

impl Recognition {
    pub async fn insert(issued_by: Uuid, new: &NewRecognition, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO recognitions (
                user_id, recognition_type, title, description, category,
                issued_by, expires_at, featured, image, metrics
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(&new.recognition_type)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(issued_by)
        .bind(new.expires_at)
        .bind(new.featured)
        .bind(&new.image)
        .bind(&new.metrics)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(
        featured: Option<bool>,
        recognition_type: Option<&str>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM recognitions
             WHERE ($1::boolean IS NULL OR featured = $1)
               AND ($2::text IS NULL OR recognition_type = $2)
             ORDER BY issued_date DESC",
        )
        .bind(featured)
        .bind(recognition_type)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM recognitions WHERE user_id = $1 ORDER BY issued_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_featured(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM recognitions WHERE featured = TRUE")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
