use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::hub::Coordinates;

/// Matching criteria attached to a volunteer request.
///
/// Age and gender are filtered in SQL; qualification and language overlap
/// are checked by the matching scorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchCriteria {
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    /// any, male, female or other
    pub gender: Option<String>,
    pub qualifications: Vec<String>,
    /// Years of prior experience (informational, not scored)
    pub experience: Option<i32>,
    pub languages: Vec<String>,
    pub availability: Vec<String>,
    pub custom_criteria: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Compensation {
    pub provided: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

/// Volunteer request model - a hub's posting describing needed volunteers.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct VolunteerRequest {
    pub id: Uuid,
    pub hub_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub required_skills: Vec<String>,
    pub criteria: Json<MatchCriteria>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Json<RequestLocation>,
    pub number_of_volunteers: i32,
    pub current_volunteers: i32,
    pub status: String,
    pub filled_by: Option<Uuid>,
    pub filled_at: Option<DateTime<Utc>>,
    pub priority: String,
    pub compensation: Json<Compensation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// Request creation payload (submitted by hubs, reviewed by admins).
#[derive(Debug, Deserialize)]
pub struct NewVolunteerRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub criteria: Json<MatchCriteria>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Json<RequestLocation>,
    pub number_of_volunteers: i32,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub compensation: Json<Compensation>,
}

impl VolunteerRequest {
    pub async fn insert(hub_id: Uuid, new: &NewVolunteerRequest, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO volunteer_requests (
                hub_id, title, description, category, required_skills,
                criteria, start_date, end_date, location,
                number_of_volunteers, priority, compensation
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
        .bind(hub_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.required_skills)
        .bind(&new.criteria)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.location)
        .bind(new.number_of_volunteers)
        .bind(&new.priority)
        .bind(&new.compensation)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM volunteer_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_for_hub(hub_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM volunteer_requests WHERE hub_id = $1 ORDER BY created_at DESC",
        )
        .bind(hub_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(
        status: Option<&str>,
        category: Option<&str>,
        region: Option<&str>,
        hub_id: Option<Uuid>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM volunteer_requests
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR category = $2)
               AND ($3::text IS NULL OR location ->> 'region' = $3)
               AND ($4::uuid IS NULL OR hub_id = $4)
             ORDER BY created_at DESC",
        )
        .bind(status)
        .bind(category)
        .bind(region)
        .bind(hub_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Open requests awaiting admin review, most urgent first.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM volunteer_requests
             WHERE status = 'open'
             ORDER BY CASE priority
                          WHEN 'urgent' THEN 4
                          WHEN 'high' THEN 3
                          WHEN 'medium' THEN 2
                          ELSE 1
                      END DESC,
                      created_at DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Mark a request filled after admin approval.
    pub async fn mark_filled(
        id: Uuid,
        filled_by: Uuid,
        volunteer_count: i32,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE volunteer_requests
             SET status = 'filled',
                 current_volunteers = $3,
                 filled_by = $2,
                 filled_at = now(),
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(filled_by)
        .bind(volunteer_count)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Count a self-service placement against the request; flips the status
    /// to `filled` once the volunteer target is reached.
    pub async fn add_volunteer(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE volunteer_requests
             SET current_volunteers = current_volunteers + 1,
                 status = CASE
                     WHEN current_volunteers + 1 >= number_of_volunteers THEN 'filled'
                     ELSE status
                 END,
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_open(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM volunteer_requests WHERE status = 'open'")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
