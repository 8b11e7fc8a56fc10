use axum::extract::Extension;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::common::{ApiError, Item, Items};
use crate::domains::programs::{
    Event, NewEvent, NewProject, NewRegistration, Project, Registration,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Events, projects and generic registrations live at the API root rather
/// than under a shared prefix.
pub fn router() -> Router {
    Router::new()
        .route("/events", get(list_events_handler).post(create_event_handler))
        .route(
            "/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route("/register", post(register_handler))
        .route("/my/registrations", get(my_registrations_handler))
}

pub async fn list_events_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Items<Event>>, ApiError> {
    let events = Event::list(&state.db_pool).await?;
    Ok(Json(Items::new(events)))
}

pub async fn create_event_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewEvent>,
) -> Result<Json<Item<Event>>, ApiError> {
    auth.ensure_coordinator()?;
    let event = Event::insert(&new, auth.user_id, &state.db_pool).await?;
    Ok(Json(Item::new(event)))
}

pub async fn list_projects_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Items<Project>>, ApiError> {
    let projects = Project::list(&state.db_pool).await?;
    Ok(Json(Items::new(projects)))
}

pub async fn create_project_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewProject>,
) -> Result<Json<Item<Project>>, ApiError> {
    auth.ensure_coordinator()?;
    let project = Project::insert(&new, &state.db_pool).await?;
    Ok(Json(Item::new(project)))
}

/// Generic sign-up for an event or project (trainings have their own
/// capacity-aware endpoint).
pub async fn register_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewRegistration>,
) -> Result<Json<Item<Registration>>, ApiError> {
    if !matches!(new.registration_type.as_str(), "event" | "project") {
        return Err(ApiError::BadRequest(format!(
            "invalid registration type: {}",
            new.registration_type
        )));
    }

    if Registration::exists(auth.user_id, &new.registration_type, new.ref_id, &state.db_pool)
        .await?
    {
        return Err(ApiError::Conflict("Already registered".to_string()));
    }

    let registration = Registration::insert(
        auth.user_id,
        &new.registration_type,
        new.ref_id,
        "pending",
        &state.db_pool,
    )
    .await?;
    Ok(Json(Item::new(registration)))
}

pub async fn my_registrations_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Registration>>, ApiError> {
    let registrations = Registration::list_for_user(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(registrations)))
}
