use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Duration between two timestamps in hours, rounded to one decimal.
/// Returns `None` when either bound is missing or the interval is negative.
pub fn hours_between(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<f64> {
    let (start, end) = (start?, end?);
    let seconds = (end - start).num_seconds();
    if seconds < 0 {
        return None;
    }
    Some((seconds as f64 / 3600.0 * 10.0).round() / 10.0)
}

/// Activity model - a single unit of volunteer work (or training, meeting,
/// event attendance) logged against a user.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub hub_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub hours: Option<f64>,
    pub status: String,
    pub verified: bool,
    pub verified_by: Option<Uuid>,
    pub notes: Option<String>,
    pub attachments: Json<Vec<Attachment>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    "scheduled".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewActivity {
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub hub_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    pub status: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub attachments: Json<Vec<Attachment>>,
}

/// Partial activity update. Absent fields keep their value; hours are
/// recomputed by the handler when either time bound changes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl Activity {
    pub async fn insert(
        user_id: Uuid,
        new: &NewActivity,
        hours: Option<f64>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO activities (
                user_id, activity_type, title, description, location,
                hub_id, event_id, project_id, start_time, end_time,
                hours, status, notes, attachments
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(user_id)
        .bind(&new.activity_type)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.hub_id)
        .bind(new.event_id)
        .bind(new.project_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(hours)
        .bind(&new.status)
        .bind(&new.notes)
        .bind(&new.attachments)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM activities WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_for_user(
        user_id: Uuid,
        activity_type: Option<&str>,
        status: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM activities
             WHERE user_id = $1
               AND ($2::text IS NULL OR activity_type = $2)
               AND ($3::text IS NULL OR status = $3)
               AND ($4::timestamptz IS NULL OR start_time >= $4)
               AND ($5::timestamptz IS NULL OR start_time <= $5)
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(activity_type)
        .bind(status)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(
        user_id: Option<Uuid>,
        activity_type: Option<&str>,
        status: Option<&str>,
        hub_id: Option<Uuid>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM activities
             WHERE ($1::uuid IS NULL OR user_id = $1)
               AND ($2::text IS NULL OR activity_type = $2)
               AND ($3::text IS NULL OR status = $3)
               AND ($4::uuid IS NULL OR hub_id = $4)
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(activity_type)
        .bind(status)
        .bind(hub_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(
        id: Uuid,
        update: &ActivityUpdate,
        hours: Option<f64>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE activities SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                start_time = COALESCE($5, start_time),
                end_time = COALESCE($6, end_time),
                hours = COALESCE($7, hours),
                status = COALESCE($8, status),
                notes = COALESCE($9, notes),
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.location)
        .bind(update.start_time)
        .bind(update.end_time)
        .bind(hours)
        .bind(&update.status)
        .bind(&update.notes)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn verify(id: Uuid, verified_by: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE activities
             SET verified = TRUE, verified_by = $2, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(verified_by)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn recent_completed(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM activities
             WHERE status = 'completed'
             ORDER BY updated_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_completed(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM activities
             WHERE status = 'completed'
               AND ($1::timestamptz IS NULL OR created_at >= $1)
               AND ($2::timestamptz IS NULL OR created_at <= $2)",
        )
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn sum_hours(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<f64> {
        let (total,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(hours), 0)::double precision FROM activities
             WHERE status = 'completed'
               AND ($1::timestamptz IS NULL OR created_at >= $1)
               AND ($2::timestamptz IS NULL OR created_at <= $2)",
        )
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_hours_between_rounds_to_one_decimal() {
        // 2h 20m = 2.333... hours
        assert_eq!(hours_between(Some(ts(9, 0)), Some(ts(11, 20))), Some(2.3));
    }

    #[test]
    fn test_hours_between_exact() {
        assert_eq!(hours_between(Some(ts(9, 0)), Some(ts(13, 30))), Some(4.5));
    }

    #[test]
    fn test_hours_between_missing_bound() {
        assert_eq!(hours_between(Some(ts(9, 0)), None), None);
        assert_eq!(hours_between(None, Some(ts(9, 0))), None);
    }

    #[test]
    fn test_hours_between_negative_interval() {
        assert_eq!(hours_between(Some(ts(11, 0)), Some(ts(9, 0))), None);
    }

    #[test]
    fn test_hours_between_zero() {
        assert_eq!(hours_between(Some(ts(9, 0)), Some(ts(9, 0))), Some(0.0));
    }
}
