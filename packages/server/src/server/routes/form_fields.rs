use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::form_fields::{FormField, FormFieldUpdate, NewFormField};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    // GET takes a form type while PUT/DELETE take a field id, so they share
    // one path parameter slot.
    Router::new()
        .route("/", post(create_field_handler))
        .route("/admin/:form_type", get(admin_list_fields_handler))
        .route("/:form_type/reorder", post(reorder_fields_handler))
        .route(
            "/:form_type",
            get(list_fields_handler)
                .put(update_field_handler)
                .delete(delete_field_handler),
        )
}

const FORM_TYPES: [&str; 3] = ["volunteer", "member", "hub"];

fn ensure_form_type(form_type: &str) -> Result<(), ApiError> {
    if FORM_TYPES.contains(&form_type) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid form type: {form_type}"
        )))
    }
}

/// Active fields for rendering a public form.
pub async fn list_fields_handler(
    Extension(state): Extension<AppState>,
    Path(form_type): Path<String>,
) -> Result<Json<Items<FormField>>, ApiError> {
    ensure_form_type(&form_type)?;
    let fields = FormField::list_active(&form_type, &state.db_pool).await?;
    Ok(Json(Items::new(fields)))
}

/// Full field set for the admin form editor, inactive included.
pub async fn admin_list_fields_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(form_type): Path<String>,
) -> Result<Json<Items<FormField>>, ApiError> {
    auth.ensure_coordinator()?;
    ensure_form_type(&form_type)?;
    let fields = FormField::list_all(&form_type, &state.db_pool).await?;
    Ok(Json(Items::new(fields)))
}

/// Create a field; the (form_type, field_key) unique constraint turns
/// duplicates into a 409.
pub async fn create_field_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewFormField>,
) -> Result<Json<Item<FormField>>, ApiError> {
    auth.ensure_coordinator()?;
    ensure_form_type(&new.form_type)?;
    let field = FormField::insert(auth.user_id, &new, &state.db_pool).await?;
    Ok(Json(Item::new(field)))
}

pub async fn update_field_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<FormFieldUpdate>,
) -> Result<Json<Item<FormField>>, ApiError> {
    auth.ensure_coordinator()?;
    let field = FormField::update(id, auth.user_id, &update, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Form field"))?;
    Ok(Json(Item::new(field)))
}

/// Soft delete: deactivates the field so existing submissions stay readable.
pub async fn delete_field_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.ensure_coordinator()?;
    if !FormField::deactivate(id, auth.user_id, &state.db_pool).await? {
        return Err(ApiError::NotFound("Form field"));
    }
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<Uuid>,
}

pub async fn reorder_fields_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(form_type): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Items<FormField>>, ApiError> {
    auth.ensure_coordinator()?;
    ensure_form_type(&form_type)?;

    if req.ordered_ids.is_empty() {
        return Err(ApiError::BadRequest("ordered_ids is empty".to_string()));
    }

    FormField::reorder(&form_type, &req.ordered_ids, auth.user_id, &state.db_pool).await?;
    let fields = FormField::list_all(&form_type, &state.db_pool).await?;
    Ok(Json(Items::new(fields)))
}
