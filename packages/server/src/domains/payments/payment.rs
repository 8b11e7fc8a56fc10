use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// What the payment relates to (a membership type, event or training).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRelatedTo {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ref_id: Option<Uuid>,
}

/// Generate a transaction id: `TXN` + epoch millis + a uuid fragment.
/// Unique enough for the DB constraint to never trip in practice; the
/// constraint itself is the real guarantee.
pub fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let fragment = Uuid::new_v4().simple().to_string();
    format!("TXN{}{}", now.timestamp_millis(), &fragment[..8].to_uppercase())
}

/// Payment model - donations, membership fees and event/training fees.
/// Gateway handoff is external; this records the ledger side.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub payment_type: String,
    pub amount: f64,
    pub currency: String,
    pub method: String,
    pub transaction_id: Option<String>,
    pub status: String,
    pub payment_provider: Option<String>,
    pub metadata: Json<serde_json::Value>,
    pub receipt: Option<String>,
    pub description: Option<String>,
    pub related_to: Json<PaymentRelatedTo>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "ETB".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewPayment {
    pub payment_type: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub method: String,
    pub payment_provider: Option<String>,
    #[serde(default)]
    pub metadata: Json<serde_json::Value>,
    pub description: Option<String>,
    #[serde(default)]
    pub related_to: Json<PaymentRelatedTo>,
}

impl Payment {
    pub async fn insert(
        user_id: Option<Uuid>,
        new: &NewPayment,
        transaction_id: &str,
        status: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO payments (
                user_id, payment_type, amount, currency, method,
                transaction_id, status, payment_provider, metadata,
                description, related_to
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(user_id)
        .bind(&new.payment_type)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(&new.method)
        .bind(transaction_id)
        .bind(status)
        .bind(&new.payment_provider)
        .bind(&new.metadata)
        .bind(&new.description)
        .bind(&new.related_to)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_transaction_id(
        transaction_id: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM payments WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(
        status: Option<&str>,
        payment_type: Option<&str>,
        method: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM payments
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR payment_type = $2)
               AND ($3::text IS NULL OR method = $3)
               AND ($4::timestamptz IS NULL OR created_at >= $4)
               AND ($5::timestamptz IS NULL OR created_at <= $5)
             ORDER BY created_at DESC",
        )
        .bind(status)
        .bind(payment_type)
        .bind(method)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Sum of completed payment amounts within the same filter window.
    pub async fn completed_amount(
        payment_type: Option<&str>,
        method: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<f64> {
        let (total,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::double precision FROM payments
             WHERE status = 'completed'
               AND ($1::text IS NULL OR payment_type = $1)
               AND ($2::text IS NULL OR method = $2)
               AND ($3::timestamptz IS NULL OR created_at >= $3)
               AND ($4::timestamptz IS NULL OR created_at <= $4)",
        )
        .bind(payment_type)
        .bind(method)
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;
        Ok(total)
    }

    /// Settle a simulated payment.
    pub async fn mark_completed(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE payments
             SET status = 'completed', processed_at = now(), updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_completed_donations(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM payments
             WHERE payment_type = 'donation' AND status = 'completed'",
        )
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transaction_id_format() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let id = generate_transaction_id(now);
        assert!(id.starts_with("TXN"));
        assert!(id.contains(&now.timestamp_millis().to_string()));
        // TXN + 13-digit millis + 8-char fragment
        assert_eq!(id.len(), 3 + 13 + 8);
    }

    #[test]
    fn test_transaction_ids_are_distinct() {
        let now = Utc::now();
        assert_ne!(generate_transaction_id(now), generate_transaction_id(now));
    }
}
