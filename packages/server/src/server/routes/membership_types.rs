use axum::extract::{Extension, Path, Query};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::payments::{MembershipType, NewMembershipType};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_types_handler).post(create_type_handler))
        .route(
            "/:id",
            get(get_type_handler)
                .put(update_type_handler)
                .delete(delete_type_handler),
        )
}

#[derive(Debug, Deserialize)]
pub struct TypeFilter {
    #[serde(default)]
    pub admin: bool,
}

/// Active tiers for the public pricing page; `?admin=true` includes inactive
/// ones for coordinators.
pub async fn list_types_handler(
    Extension(state): Extension<AppState>,
    auth: Option<AuthUser>,
    Query(filter): Query<TypeFilter>,
) -> Result<Json<Items<MembershipType>>, ApiError> {
    let include_inactive =
        filter.admin && auth.as_ref().is_some_and(|a| a.role.is_coordinator());
    let types = MembershipType::list(include_inactive, &state.db_pool).await?;
    Ok(Json(Items::new(types)))
}

pub async fn get_type_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item<MembershipType>>, ApiError> {
    let membership_type = MembershipType::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Membership type"))?;
    Ok(Json(Item::new(membership_type)))
}

pub async fn create_type_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewMembershipType>,
) -> Result<Json<Item<MembershipType>>, ApiError> {
    auth.ensure_coordinator()?;
    if new.amount < 0.0 || new.duration <= 0 {
        return Err(ApiError::BadRequest(
            "amount must be non-negative and duration positive".to_string(),
        ));
    }
    let membership_type = MembershipType::insert(&new, &state.db_pool).await?;
    Ok(Json(Item::new(membership_type)))
}

pub async fn update_type_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewMembershipType>,
) -> Result<Json<Item<MembershipType>>, ApiError> {
    auth.ensure_coordinator()?;
    let membership_type = MembershipType::update(id, &new, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Membership type"))?;
    Ok(Json(Item::new(membership_type)))
}

pub async fn delete_type_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.ensure_coordinator()?;
    if !MembershipType::delete(id, &state.db_pool).await? {
        return Err(ApiError::NotFound("Membership type"));
    }
    Ok(Json(json!({ "deleted": true })))
}
