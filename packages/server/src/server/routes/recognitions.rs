use axum::extract::{Extension, Query};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::common::{ApiError, Item, Items};
use crate::domains::recognitions::{NewRecognition, Recognition};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_recognitions_handler).post(create_recognition_handler),
        )
        .route("/my", get(my_recognitions_handler))
}

#[derive(Debug, Deserialize)]
pub struct RecognitionFilter {
    pub featured: Option<bool>,
    #[serde(rename = "type")]
    pub recognition_type: Option<String>,
}

/// Public wall of recognitions.
pub async fn list_recognitions_handler(
    Extension(state): Extension<AppState>,
    Query(filter): Query<RecognitionFilter>,
) -> Result<Json<Items<Recognition>>, ApiError> {
    let recognitions = Recognition::list(
        filter.featured,
        filter.recognition_type.as_deref(),
        &state.db_pool,
    )
    .await?;
    Ok(Json(Items::new(recognitions)))
}

pub async fn create_recognition_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewRecognition>,
) -> Result<Json<Item<Recognition>>, ApiError> {
    auth.ensure_evaluator()?;

    User::find_by_id(new.user_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let recognition = Recognition::insert(auth.user_id, &new, &state.db_pool).await?;
    User::increment_recognitions(recognition.user_id, &state.db_pool).await?;

    Ok(Json(Item::new(recognition)))
}

pub async fn my_recognitions_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Recognition>>, ApiError> {
    let recognitions = Recognition::list_for_user(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(recognitions)))
}
