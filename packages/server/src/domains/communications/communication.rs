use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

fn default_audience() -> String {
    "all".to_string()
}

/// Who a communication goes to. `audience` selects the resolution strategy;
/// `roles`, `user_ids` and `hub_ids` narrow it for `role` and `custom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipients {
    pub audience: String,
    pub roles: Vec<String>,
    pub user_ids: Vec<Uuid>,
    pub hub_ids: Vec<Uuid>,
}

impl Default for Recipients {
    fn default() -> Self {
        Self {
            audience: default_audience(),
            roles: Vec::new(),
            user_ids: Vec::new(),
            hub_ids: Vec::new(),
        }
    }
}

impl Recipients {
    /// Number of recipients the audience resolves to. Delivery itself is
    /// external; the count feeds `sent_count` when the simulation settles.
    pub async fn resolve_count(&self, pool: &PgPool) -> Result<i64> {
        let count = match self.audience.as_str() {
            "volunteers" => count_users_by_roles(&["volunteer".to_string()], pool).await?,
            "members" => count_users_by_roles(&["member".to_string()], pool).await?,
            "role" => count_users_by_roles(&self.roles, pool).await?,
            "hubs" => {
                let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM hubs")
                    .fetch_one(pool)
                    .await?;
                count
            }
            "custom" => (self.user_ids.len() + self.hub_ids.len()) as i64,
            _ => {
                let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                    .fetch_one(pool)
                    .await?;
                count
            }
        };
        Ok(count)
    }
}

async fn count_users_by_roles(roles: &[String], pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ANY($1)")
        .bind(roles)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Communication model - a mass message queued for delivery over one
/// channel (email, sms, push, telegram, ...).
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Communication {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub channel: String,
    pub subject: Option<String>,
    pub content: String,
    pub recipients: Json<Recipients>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_by: Option<Uuid>,
    pub attachments: Json<Vec<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewCommunication {
    #[serde(rename = "type")]
    pub channel: String,
    pub subject: Option<String>,
    pub content: String,
    #[serde(default)]
    pub recipients: Json<Recipients>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Json<Vec<serde_json::Value>>,
}

impl Communication {
    pub async fn insert(
        created_by: Uuid,
        new: &NewCommunication,
        status: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO communications (
                channel, subject, content, recipients, status,
                scheduled_at, created_by, attachments
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&new.channel)
        .bind(&new.subject)
        .bind(&new.content)
        .bind(&new.recipients)
        .bind(status)
        .bind(new.scheduled_at)
        .bind(created_by)
        .bind(&new.attachments)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM communications ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Record a delivery that could not settle.
    pub async fn mark_failed(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE communications
             SET status = 'failed', updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Settle a simulated delivery.
    pub async fn mark_sent(id: Uuid, sent_count: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE communications
             SET status = 'sent', sent_at = now(), sent_count = $2, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(sent_count as i32)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_uses_type_on_the_wire() {
        let new: NewCommunication = serde_json::from_str(
            r#"{"type": "email", "content": "Volunteer day this Saturday"}"#,
        )
        .unwrap();
        assert_eq!(new.channel, "email");
        assert_eq!(new.recipients.audience, "all");
    }
}
