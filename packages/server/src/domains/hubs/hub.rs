use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubAddress {
    pub city: Option<String>,
    pub region: Option<String>,
    pub street: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPerson {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub telegram: Option<String>,
    pub facebook: Option<String>,
    pub tiktok: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
}

/// Hub model - a partner organization onboarded into the platform.
///
/// Hubs start `pending` and must be approved by an admin before placements
/// are made against them.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Hub {
    pub id: Uuid,
    pub name: String,
    pub organization_type: String,
    pub email: String,
    pub phone: String,
    pub address: Json<HubAddress>,
    pub contact_person: Json<ContactPerson>,
    pub status: String,
    pub verified: bool,
    pub registration_date: DateTime<Utc>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub social_media: Json<SocialLinks>,
    pub capacity: i32,
    pub active_volunteers: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public hub registration payload.
#[derive(Debug, Deserialize)]
pub struct NewHub {
    pub name: String,
    pub organization_type: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Json<HubAddress>,
    #[serde(default)]
    pub contact_person: Json<ContactPerson>,
    pub description: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub social_media: Json<SocialLinks>,
    #[serde(default)]
    pub capacity: i32,
}

/// Partial hub update. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HubUpdate {
    pub name: Option<String>,
    pub organization_type: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Json<HubAddress>>,
    pub contact_person: Option<Json<ContactPerson>>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub social_media: Option<Json<SocialLinks>>,
    pub capacity: Option<i32>,
}

impl Hub {
    pub async fn insert(new: &NewHub, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO hubs (
                name, organization_type, email, phone, address,
                contact_person, description, website, social_media, capacity
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(&new.name)
        .bind(&new.organization_type)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.contact_person)
        .bind(&new.description)
        .bind(&new.website)
        .bind(&new.social_media)
        .bind(new.capacity)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM hubs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// List hubs, optionally filtered by status, verification and region.
    pub async fn list(
        status: Option<&str>,
        verified: Option<bool>,
        region: Option<&str>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM hubs
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::boolean IS NULL OR verified = $2)
               AND ($3::text IS NULL OR address ->> 'region' = $3)
             ORDER BY created_at DESC",
        )
        .bind(status)
        .bind(verified)
        .bind(region)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(id: Uuid, update: &HubUpdate, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE hubs SET
                name = COALESCE($2, name),
                organization_type = COALESCE($3, organization_type),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                contact_person = COALESCE($6, contact_person),
                description = COALESCE($7, description),
                website = COALESCE($8, website),
                social_media = COALESCE($9, social_media),
                capacity = COALESCE($10, capacity),
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.organization_type)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.contact_person)
        .bind(&update.description)
        .bind(&update.website)
        .bind(&update.social_media)
        .bind(update.capacity)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Admin approval decision. Approving a hub also marks it verified;
    /// any other status clears the flag.
    pub async fn set_status(id: Uuid, status: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE hubs
             SET status = $2, verified = ($2 = 'approved'), updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_by_status(status: &str, pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM hubs WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Hub count per region (for the dashboard distribution chart).
    pub async fn region_distribution(pool: &PgPool) -> Result<Vec<(Option<String>, i64)>> {
        sqlx::query_as(
            "SELECT address ->> 'region' AS region, COUNT(*) AS count
             FROM hubs
             GROUP BY address ->> 'region'
             ORDER BY count DESC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
