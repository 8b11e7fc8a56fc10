use axum::extract::{Extension, Path, Query};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items, Role};
use crate::domains::hubs::VolunteerRequest;
use crate::domains::placements::{NewPlacement, Placement};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_placement_handler).get(list_placements_handler))
        .route("/my", get(my_placements_handler))
        .route("/:id/status", patch(set_placement_status_handler))
}

#[derive(Debug, Deserialize)]
pub struct PlacementFilter {
    pub status: Option<String>,
    pub hub_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Self-service placement: a volunteer applies to a hub, optionally against
/// one of its open requests.
pub async fn create_placement_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewPlacement>,
) -> Result<Json<Item<Placement>>, ApiError> {
    if auth.role != Role::Volunteer {
        return Err(ApiError::PermissionDenied(
            "only volunteers can create placements".to_string(),
        ));
    }

    if let Some(request_id) = new.request_id {
        let request = VolunteerRequest::find_by_id(request_id, &state.db_pool)
            .await?
            .ok_or(ApiError::NotFound("Volunteer request"))?;
        if request.hub_id != new.hub_id {
            return Err(ApiError::BadRequest(
                "request does not belong to this hub".to_string(),
            ));
        }
        if request.status != "open" {
            return Err(ApiError::BadRequest("Request is not open".to_string()));
        }
    }

    let placement = Placement::insert(auth.user_id, &new, &state.db_pool).await?;

    // Count the placement against the request; flips it to filled at target.
    if let Some(request_id) = new.request_id {
        VolunteerRequest::add_volunteer(request_id, &state.db_pool).await?;
    }

    Ok(Json(Item::new(placement)))
}

pub async fn my_placements_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Placement>>, ApiError> {
    let placements = Placement::list_for_volunteer(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(placements)))
}

pub async fn list_placements_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Query(filter): Query<PlacementFilter>,
) -> Result<Json<Items<Placement>>, ApiError> {
    auth.ensure_coordinator()?;
    let placements =
        Placement::list(filter.status.as_deref(), filter.hub_id, &state.db_pool).await?;
    Ok(Json(Items::new(placements)))
}

/// Status transition by an admin or a coordinator affiliated with the
/// placement's hub.
pub async fn set_placement_status_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Item<Placement>>, ApiError> {
    let allowed = [
        "pending",
        "approved",
        "active",
        "completed",
        "terminated",
        "declined",
    ];
    if !allowed.contains(&update.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "invalid placement status: {}",
            update.status
        )));
    }

    let placement = Placement::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Placement"))?;

    if !auth.role.is_admin() {
        auth.ensure_coordinator()?;
        let user = User::find_by_id(auth.user_id, &state.db_pool)
            .await?
            .ok_or(ApiError::NotFound("User"))?;
        if user.hub_affiliation != Some(placement.hub_id) {
            return Err(ApiError::PermissionDenied(
                "not affiliated with this hub".to_string(),
            ));
        }
    }

    let placement = Placement::set_status(id, &update.status, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Placement"))?;
    Ok(Json(Item::new(placement)))
}
