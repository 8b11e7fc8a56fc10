use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub summary: Option<String>,
    pub status: String,
    pub leads: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    "planning".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub summary: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub leads: Vec<Uuid>,
}

impl Project {
    pub async fn insert(new: &NewProject, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO projects (name, summary, status, leads)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new.name)
        .bind(&new.summary)
        .bind(&new.status)
        .bind(&new.leads)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM projects ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
