use anyhow::Result;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Membership expiry: `duration` months (or years converted to months) past
/// the start. Falls back to the start itself on calendar overflow.
pub fn membership_expiry(
    start: DateTime<Utc>,
    duration: i32,
    duration_type: &str,
) -> DateTime<Utc> {
    let months = match duration_type {
        "year" => duration.saturating_mul(12),
        _ => duration,
    };
    start
        .checked_add_months(Months::new(months.max(0) as u32))
        .unwrap_or(start)
}

/// Membership type model - a purchasable membership tier.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct MembershipType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub duration: i32,
    pub duration_type: String,
    pub benefits: Vec<String>,
    pub active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "ETB".to_string()
}

fn default_duration_type() -> String {
    "year".to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct NewMembershipType {
    pub name: String,
    pub description: Option<String>,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub duration: i32,
    #[serde(default = "default_duration_type")]
    pub duration_type: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl MembershipType {
    pub async fn insert(new: &NewMembershipType, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO membership_types (
                name, description, amount, currency, duration,
                duration_type, benefits, active, sort_order
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(new.duration)
        .bind(&new.duration_type)
        .bind(&new.benefits)
        .bind(new.active)
        .bind(new.sort_order)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM membership_types WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Active tiers by default; admins may request the full set.
    pub async fn list(include_inactive: bool, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM membership_types
             WHERE ($1 OR active = TRUE)
             ORDER BY sort_order ASC, amount ASC",
        )
        .bind(include_inactive)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Full replacement (PUT semantics).
    pub async fn update(
        id: Uuid,
        new: &NewMembershipType,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE membership_types SET
                name = $2, description = $3, amount = $4, currency = $5,
                duration = $6, duration_type = $7, benefits = $8,
                active = $9, sort_order = $10, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(new.duration)
        .bind(&new.duration_type)
        .bind(&new.benefits)
        .bind(new.active)
        .bind(new.sort_order)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM membership_types WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_expiry_one_year() {
        let expiry = membership_expiry(start(), 1, "year");
        assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_expiry_six_months() {
        let expiry = membership_expiry(start(), 6, "month");
        assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_expiry_clamps_month_end() {
        // Jan 31 + 1 month lands on Feb 28.
        let jan31 = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let expiry = membership_expiry(jan31, 1, "month");
        assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_expiry_negative_duration_is_noop() {
        assert_eq!(membership_expiry(start(), -3, "month"), start());
    }
}
