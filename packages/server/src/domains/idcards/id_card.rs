use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Card number: `VN` + card-type prefix + epoch-seconds fragment + random
/// suffix. The DB unique constraint backs the randomness up.
pub fn generate_card_number(card_type: &str, now: DateTime<Utc>) -> String {
    let prefix = match card_type {
        "member" => "MB",
        "staff" => "ST",
        _ => "VL",
    };
    let fragment = Uuid::new_v4().simple().to_string();
    format!(
        "VN{}{}{}",
        prefix,
        now.timestamp() % 1_000_000,
        &fragment[..6].to_uppercase()
    )
}

/// Card type from the holder's role: staff roles get staff cards, members
/// member cards, everyone else volunteer cards.
pub fn card_type_for_role(role: &str) -> &'static str {
    match role {
        "admin" | "hub_coordinator" | "evaluator" => "staff",
        "member" => "member",
        _ => "volunteer",
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardMetadata {
    pub blood_type: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
}

/// ID card model - a printable credential issued to a user.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IdCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub card_number: String,
    pub card_type: String,
    pub status: String,
    pub issued_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub issued_by: Option<Uuid>,
    pub photo: Option<String>,
    pub qr_code: Option<String>,
    pub metadata: Json<CardMetadata>,
    pub print_count: i32,
    pub last_printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subset exposed on the public verification endpoint.
#[derive(Debug, Serialize)]
pub struct PublicCard {
    pub card_number: String,
    pub card_type: String,
    pub status: String,
    pub issued_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub holder_name: String,
}

impl IdCard {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        user_id: Uuid,
        card_number: &str,
        card_type: &str,
        expiry_date: Option<DateTime<Utc>>,
        issued_by: Option<Uuid>,
        photo: Option<&str>,
        qr_code: &str,
        metadata: &Json<CardMetadata>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO id_cards (
                user_id, card_number, card_type, expiry_date,
                issued_by, photo, qr_code, metadata
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(user_id)
        .bind(card_number)
        .bind(card_type)
        .bind(expiry_date)
        .bind(issued_by)
        .bind(photo)
        .bind(qr_code)
        .bind(metadata)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_active_for_user(user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM id_cards
             WHERE user_id = $1 AND status = 'active'
             ORDER BY issued_date DESC
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM id_cards WHERE user_id = $1 ORDER BY issued_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM id_cards ORDER BY issued_date DESC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Public verification lookup joined with the holder's name.
    pub async fn find_public_by_card_number(
        card_number: &str,
        pool: &PgPool,
    ) -> Result<Option<PublicCard>> {
        let row: Option<(String, String, String, DateTime<Utc>, Option<DateTime<Utc>>, String)> =
            sqlx::query_as(
                "SELECT c.card_number, c.card_type, c.status, c.issued_date,
                        c.expiry_date, u.name
                 FROM id_cards c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.card_number = $1",
            )
            .bind(card_number)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(
            |(card_number, card_type, status, issued_date, expiry_date, holder_name)| PublicCard {
                card_number,
                card_type,
                status,
                issued_date,
                expiry_date,
                holder_name,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_number_prefixes() {
        let now = Utc::now();
        assert!(generate_card_number("volunteer", now).starts_with("VNVL"));
        assert!(generate_card_number("member", now).starts_with("VNMB"));
        assert!(generate_card_number("staff", now).starts_with("VNST"));
    }

    #[test]
    fn test_card_numbers_are_distinct() {
        let now = Utc::now();
        assert_ne!(
            generate_card_number("volunteer", now),
            generate_card_number("volunteer", now)
        );
    }

    #[test]
    fn test_card_type_for_role() {
        assert_eq!(card_type_for_role("admin"), "staff");
        assert_eq!(card_type_for_role("hub_coordinator"), "staff");
        assert_eq!(card_type_for_role("evaluator"), "staff");
        assert_eq!(card_type_for_role("member"), "member");
        assert_eq!(card_type_for_role("volunteer"), "volunteer");
    }
}
