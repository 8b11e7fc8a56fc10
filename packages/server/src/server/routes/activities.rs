use axum::extract::{Extension, Path, Query};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::activities::{hours_between, Activity, ActivityUpdate, NewActivity};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_activity_handler).get(list_activities_handler))
        .route("/my", get(my_activities_handler))
        .route("/:id", patch(update_activity_handler))
        .route("/:id/verify", patch(verify_activity_handler))
}

#[derive(Debug, Deserialize)]
pub struct MyActivityFilter {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub status: Option<String>,
    pub hub_id: Option<Uuid>,
}

/// Log an activity. Hours come from the time bounds; completed activities
/// count toward the user's stats immediately.
pub async fn create_activity_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewActivity>,
) -> Result<Json<Item<Activity>>, ApiError> {
    let hours = hours_between(new.start_time, new.end_time);

    let activity = Activity::insert(auth.user_id, &new, hours, &state.db_pool).await?;

    if activity.status == "completed" {
        User::add_completed_activity(auth.user_id, activity.hours.unwrap_or(0.0), &state.db_pool)
            .await?;
    }

    Ok(Json(Item::new(activity)))
}

pub async fn my_activities_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Query(filter): Query<MyActivityFilter>,
) -> Result<Json<Items<Activity>>, ApiError> {
    let activities = Activity::list_for_user(
        auth.user_id,
        filter.activity_type.as_deref(),
        filter.status.as_deref(),
        filter.from,
        filter.to,
        &state.db_pool,
    )
    .await?;
    Ok(Json(Items::new(activities)))
}

pub async fn list_activities_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<Items<Activity>>, ApiError> {
    auth.ensure_reviewer()?;
    let activities = Activity::list(
        filter.user_id,
        filter.activity_type.as_deref(),
        filter.status.as_deref(),
        filter.hub_id,
        &state.db_pool,
    )
    .await?;
    Ok(Json(Items::new(activities)))
}

/// Owner-or-admin update. Hours are recomputed when a time bound changes;
/// a transition into `completed` bumps the owner's stats once.
pub async fn update_activity_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ActivityUpdate>,
) -> Result<Json<Item<Activity>>, ApiError> {
    let activity = Activity::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Activity"))?;

    if activity.user_id != auth.user_id && !auth.role.is_admin() {
        return Err(ApiError::PermissionDenied(
            "not the owner of this activity".to_string(),
        ));
    }

    let hours = if update.start_time.is_some() || update.end_time.is_some() {
        hours_between(
            update.start_time.or(activity.start_time),
            update.end_time.or(activity.end_time),
        )
    } else {
        None
    };

    let was_completed = activity.status == "completed";

    let updated = Activity::update(id, &update, hours, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Activity"))?;

    if !was_completed && updated.status == "completed" {
        User::add_completed_activity(
            updated.user_id,
            updated.hours.unwrap_or(0.0),
            &state.db_pool,
        )
        .await?;
    }

    Ok(Json(Item::new(updated)))
}

pub async fn verify_activity_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Item<Activity>>, ApiError> {
    auth.ensure_reviewer()?;
    let activity = Activity::verify(id, auth.user_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Activity"))?;
    Ok(Json(Item::new(activity)))
}
