use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOption {
    pub label: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldValidation {
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

/// Form field model - an admin-configurable field on the volunteer, member
/// or hub registration form.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct FormField {
    pub id: Uuid,
    pub form_type: String,
    pub field_key: String,
    pub field_type: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub options: Json<Vec<FieldOption>>,
    pub validation: Json<FieldValidation>,
    pub default_value: Option<Json<serde_json::Value>>,
    pub sort_order: i32,
    pub section: Option<String>,
    pub is_active: bool,
    pub admin_only: bool,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewFormField {
    pub form_type: String,
    pub field_key: String,
    pub field_type: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Json<Vec<FieldOption>>,
    #[serde(default)]
    pub validation: Json<FieldValidation>,
    pub default_value: Option<Json<serde_json::Value>>,
    #[serde(default)]
    pub sort_order: i32,
    pub section: Option<String>,
    #[serde(default)]
    pub admin_only: bool,
}

/// Partial field update. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FormFieldUpdate {
    pub field_type: Option<String>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Json<Vec<FieldOption>>>,
    pub validation: Option<Json<FieldValidation>>,
    pub default_value: Option<Json<serde_json::Value>>,
    pub sort_order: Option<i32>,
    pub section: Option<String>,
    pub is_active: Option<bool>,
    pub admin_only: Option<bool>,
}

impl FormField {
    pub async fn insert(created_by: Uuid, new: &NewFormField, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO form_fields (
                form_type, field_key, field_type, label, placeholder,
                description, required, options, validation, default_value,
                sort_order, section, admin_only, created_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(&new.form_type)
        .bind(&new.field_key)
        .bind(&new.field_type)
        .bind(&new.label)
        .bind(&new.placeholder)
        .bind(&new.description)
        .bind(new.required)
        .bind(&new.options)
        .bind(&new.validation)
        .bind(&new.default_value)
        .bind(new.sort_order)
        .bind(&new.section)
        .bind(new.admin_only)
        .bind(created_by)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Active fields for the public form, ordered for rendering.
    pub async fn list_active(form_type: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM form_fields
             WHERE form_type = $1 AND is_active = TRUE
             ORDER BY sort_order ASC, created_at ASC",
        )
        .bind(form_type)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// All fields for the admin editor, inactive included.
    pub async fn list_all(form_type: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM form_fields
             WHERE form_type = $1
             ORDER BY sort_order ASC, created_at ASC",
        )
        .bind(form_type)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(
        id: Uuid,
        updated_by: Uuid,
        update: &FormFieldUpdate,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE form_fields SET
                field_type = COALESCE($3, field_type),
                label = COALESCE($4, label),
                placeholder = COALESCE($5, placeholder),
                description = COALESCE($6, description),
                required = COALESCE($7, required),
                options = COALESCE($8, options),
                validation = COALESCE($9, validation),
                default_value = COALESCE($10, default_value),
                sort_order = COALESCE($11, sort_order),
                section = COALESCE($12, section),
                is_active = COALESCE($13, is_active),
                admin_only = COALESCE($14, admin_only),
                updated_by = $2,
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(updated_by)
        .bind(&update.field_type)
        .bind(&update.label)
        .bind(&update.placeholder)
        .bind(&update.description)
        .bind(update.required)
        .bind(&update.options)
        .bind(&update.validation)
        .bind(&update.default_value)
        .bind(update.sort_order)
        .bind(&update.section)
        .bind(update.is_active)
        .bind(update.admin_only)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Soft delete: the field disappears from forms but stays recoverable.
    pub async fn deactivate(id: Uuid, updated_by: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE form_fields
             SET is_active = FALSE, updated_by = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(updated_by)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reassign sort_order to match the given id sequence.
    pub async fn reorder(
        form_type: &str,
        ordered_ids: &[Uuid],
        updated_by: Uuid,
        pool: &PgPool,
    ) -> Result<()> {
        let mut tx = pool.begin().await?;
        for (position, field_id) in ordered_ids.iter().enumerate() {
            sqlx::query(
                "UPDATE form_fields
                 SET sort_order = $3, updated_by = $4, updated_at = now()
                 WHERE id = $1 AND form_type = $2",
            )
            .bind(field_id)
            .bind(form_type)
            .bind(position as i32)
            .bind(updated_by)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
