use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::programs::Registration;
use crate::domains::trainings::{NewTraining, Training};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_trainings_handler).post(create_training_handler))
        .route("/my", get(my_trainings_handler))
        .route("/:id/register", post(register_training_handler))
}

#[derive(Debug, Deserialize)]
pub struct TrainingFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
}

pub async fn list_trainings_handler(
    Extension(state): Extension<AppState>,
    Query(filter): Query<TrainingFilter>,
) -> Result<Json<Items<Training>>, ApiError> {
    let trainings = Training::list(
        filter.status.as_deref(),
        filter.category.as_deref(),
        filter.level.as_deref(),
        &state.db_pool,
    )
    .await?;
    Ok(Json(Items::new(trainings)))
}

pub async fn create_training_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewTraining>,
) -> Result<Json<Item<Training>>, ApiError> {
    auth.ensure_coordinator()?;
    let training = Training::insert(&new, auth.user_id, &state.db_pool).await?;
    Ok(Json(Item::new(training)))
}

/// Register for a training. Rejected at capacity and on re-registration;
/// the slot claim and the registration row commit in one transaction.
pub async fn register_training_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Item<Training>>, ApiError> {
    Training::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Training"))?;

    if Registration::exists(auth.user_id, "training", id, &state.db_pool).await? {
        return Err(ApiError::Conflict(
            "Already registered for this training".to_string(),
        ));
    }

    let mut tx = state.db_pool.begin().await.map_err(ApiError::Database)?;

    let training = Training::claim_slot(id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::Conflict("Training is full".to_string()))?;

    Registration::insert_tx(auth.user_id, "training", id, "confirmed", &mut tx).await?;

    tx.commit().await.map_err(ApiError::Database)?;

    Ok(Json(Item::new(training)))
}

pub async fn my_trainings_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Training>>, ApiError> {
    let trainings = Training::list_for_user(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(trainings)))
}
