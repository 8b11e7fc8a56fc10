use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::evaluations::{Evaluation, NewEvaluation};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_evaluation_handler))
        .route("/my", get(my_evaluations_handler))
        .route("/user/:user_id", get(user_evaluations_handler))
}

fn valid_rating(value: Option<i32>) -> bool {
    value.map_or(true, |v| (1..=5).contains(&v))
}

pub async fn create_evaluation_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewEvaluation>,
) -> Result<Json<Item<Evaluation>>, ApiError> {
    auth.ensure_evaluator()?;

    let ratings = &new.ratings.0;
    let all_valid = valid_rating(ratings.punctuality)
        && valid_rating(ratings.teamwork)
        && valid_rating(ratings.communication)
        && valid_rating(ratings.problem_solving)
        && valid_rating(ratings.dedication)
        && valid_rating(ratings.overall);
    if !all_valid {
        return Err(ApiError::BadRequest(
            "ratings must be between 1 and 5".to_string(),
        ));
    }

    let evaluation = Evaluation::insert(auth.user_id, &new, &state.db_pool).await?;
    Ok(Json(Item::new(evaluation)))
}

/// Evaluations about the caller.
pub async fn my_evaluations_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Evaluation>>, ApiError> {
    let evaluations = Evaluation::list_for_user(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(evaluations)))
}

/// Evaluations about any user: the subject themself or a reviewer.
pub async fn user_evaluations_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Items<Evaluation>>, ApiError> {
    if auth.user_id != user_id {
        auth.ensure_reviewer()?;
    }
    let evaluations = Evaluation::list_for_user(user_id, &state.db_pool).await?;
    Ok(Json(Items::new(evaluations)))
}
