use axum::extract::{Extension, Path, Query};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::hubs::{Hub, HubUpdate, NewHub, NewVolunteerRequest, VolunteerRequest};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register_hub_handler))
        .route("/register-with-request", post(register_with_request_handler))
        .route("/requests/all", get(list_all_requests_handler))
        .route("/", get(list_hubs_handler))
        .route("/:id", get(get_hub_handler).patch(update_hub_handler))
        .route("/:id/status", patch(set_hub_status_handler))
        .route(
            "/:id/requests",
            get(list_hub_requests_handler).post(create_request_handler),
        )
}

#[derive(Debug, Deserialize)]
pub struct HubFilter {
    pub status: Option<String>,
    pub verified: Option<bool>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub hub_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Public hub onboarding. New hubs wait in `pending` for admin approval.
pub async fn register_hub_handler(
    Extension(state): Extension<AppState>,
    Json(new): Json<NewHub>,
) -> Result<Json<Item<Hub>>, ApiError> {
    let hub = Hub::insert(&new, &state.db_pool).await?;
    tracing::info!(hub_id = %hub.id, name = %hub.name, "Hub registered");
    Ok(Json(Item::new(hub)))
}

#[derive(Debug, Deserialize)]
pub struct HubWithRequest {
    pub hub: NewHub,
    pub request: NewVolunteerRequest,
}

#[derive(Debug, Serialize)]
pub struct HubWithRequestResponse {
    pub hub: Hub,
    pub request: VolunteerRequest,
}

/// Combined onboarding: register a hub and its first volunteer request in
/// one call.
pub async fn register_with_request_handler(
    Extension(state): Extension<AppState>,
    Json(payload): Json<HubWithRequest>,
) -> Result<Json<HubWithRequestResponse>, ApiError> {
    let hub = Hub::insert(&payload.hub, &state.db_pool).await?;
    let request = VolunteerRequest::insert(hub.id, &payload.request, &state.db_pool).await?;
    tracing::info!(hub_id = %hub.id, request_id = %request.id, "Hub registered with request");
    Ok(Json(HubWithRequestResponse { hub, request }))
}

pub async fn list_hubs_handler(
    Extension(state): Extension<AppState>,
    Query(filter): Query<HubFilter>,
) -> Result<Json<Items<Hub>>, ApiError> {
    let hubs = Hub::list(
        filter.status.as_deref(),
        filter.verified,
        filter.region.as_deref(),
        &state.db_pool,
    )
    .await?;
    Ok(Json(Items::new(hubs)))
}

pub async fn get_hub_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Item<Hub>>, ApiError> {
    let hub = Hub::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Hub"))?;
    Ok(Json(Item::new(hub)))
}

/// Hub details may be edited by an admin or by a coordinator affiliated with
/// that hub.
pub async fn update_hub_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<HubUpdate>,
) -> Result<Json<Item<Hub>>, ApiError> {
    if !auth.role.is_admin() {
        auth.ensure_coordinator()?;
        let user = User::find_by_id(auth.user_id, &state.db_pool)
            .await?
            .ok_or(ApiError::NotFound("User"))?;
        if user.hub_affiliation != Some(id) {
            return Err(ApiError::PermissionDenied(
                "not affiliated with this hub".to_string(),
            ));
        }
    }

    let hub = Hub::update(id, &update, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Hub"))?;
    Ok(Json(Item::new(hub)))
}

/// Admin approval decision.
pub async fn set_hub_status_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Item<Hub>>, ApiError> {
    auth.ensure_admin()?;

    let allowed = ["pending", "approved", "suspended", "rejected"];
    if !allowed.contains(&update.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "invalid hub status: {}",
            update.status
        )));
    }

    let hub = Hub::set_status(id, &update.status, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Hub"))?;
    tracing::info!(hub_id = %hub.id, status = %hub.status, "Hub status updated");
    Ok(Json(Item::new(hub)))
}

/// Public request submission: hubs post needs before their account is
/// approved, so this takes no auth.
pub async fn create_request_handler(
    Extension(state): Extension<AppState>,
    Path(hub_id): Path<Uuid>,
    Json(new): Json<NewVolunteerRequest>,
) -> Result<Json<Item<VolunteerRequest>>, ApiError> {
    Hub::find_by_id(hub_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Hub"))?;

    if new.number_of_volunteers <= 0 {
        return Err(ApiError::BadRequest(
            "number_of_volunteers must be positive".to_string(),
        ));
    }

    let request = VolunteerRequest::insert(hub_id, &new, &state.db_pool).await?;
    Ok(Json(Item::new(request)))
}

pub async fn list_hub_requests_handler(
    Extension(state): Extension<AppState>,
    Path(hub_id): Path<Uuid>,
) -> Result<Json<Items<VolunteerRequest>>, ApiError> {
    let requests = VolunteerRequest::list_for_hub(hub_id, &state.db_pool).await?;
    Ok(Json(Items::new(requests)))
}

pub async fn list_all_requests_handler(
    Extension(state): Extension<AppState>,
    Query(filter): Query<RequestFilter>,
) -> Result<Json<Items<VolunteerRequest>>, ApiError> {
    let requests = VolunteerRequest::list(
        filter.status.as_deref(),
        filter.category.as_deref(),
        filter.region.as_deref(),
        filter.hub_id,
        &state.db_pool,
    )
    .await?;
    Ok(Json(Items::new(requests)))
}
