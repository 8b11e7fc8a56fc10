use axum::extract::Extension;
use axum::routing::{patch, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;

use crate::common::{ApiError, Item, Role};
use crate::domains::auth::{hash_password, verify_password};
use crate::domains::payments::{membership_expiry, MembershipType};
use crate::domains::users::{
    Address, Identification, Preferences, ProfileUpdate, User, UserProfile,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/profile", patch(update_profile_handler))
}

fn default_role() -> Role {
    Role::Volunteer
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub phone: String,
    pub alternative_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Jsonb<Address>,
    #[serde(default)]
    pub identification: Jsonb<Identification>,
    #[serde(default)]
    pub profile: Jsonb<UserProfile>,
    #[serde(default)]
    pub preferences: Jsonb<Preferences>,
    pub hub_affiliation: Option<Uuid>,
    /// Members may buy a tier at signup; activates membership immediately.
    pub membership_type_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub membership_status: String,
    pub membership_expiry: Option<DateTime<Utc>>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            membership_status: user.membership_status.clone(),
            membership_expiry: user.membership_expiry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

pub async fn register_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if User::find_by_email(&req.email, &state.db_pool).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let mut membership_status = "none".to_string();
    let mut expiry = None;
    if req.role == Role::Member {
        if let Some(type_id) = req.membership_type_id {
            let membership_type = MembershipType::find_by_id(type_id, &state.db_pool)
                .await?
                .ok_or(ApiError::NotFound("Membership type"))?;
            membership_status = "active".to_string();
            expiry = Some(membership_expiry(
                Utc::now(),
                membership_type.duration,
                &membership_type.duration_type,
            ));
        }
    }

    let user = User {
        id: Uuid::nil(),
        name: req.name,
        email: req.email,
        password_hash,
        role: req.role.as_str().to_string(),
        phone: req.phone,
        alternative_phone: req.alternative_phone,
        date_of_birth: req.date_of_birth,
        gender: req.gender,
        address: req.address,
        identification: req.identification,
        profile: req.profile,
        preferences: req.preferences,
        membership_status,
        membership_expiry: expiry,
        volunteer_status: "active".to_string(),
        total_hours: 0.0,
        activities_completed: 0,
        donations_made: 0,
        trainings_completed: 0,
        recognitions_received: 0,
        verified: false,
        verified_at: None,
        last_login_at: None,
        hub_affiliation: req.hub_affiliation,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let user = user.insert(&state.db_pool).await?;
    let token = state.jwt_service.create_token(user.id, req.role)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

pub async fn login_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = User::find_by_email(&req.email, &state.db_pool)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|e: String| ApiError::Internal(anyhow::anyhow!(e)))?;
    let token = state.jwt_service.create_token(user.id, role)?;

    User::touch_last_login(user.id, &state.db_pool).await?;

    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

pub async fn update_profile_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Item<User>>, ApiError> {
    let user = User::update_profile(auth.user_id, &update, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(Item::new(user)))
}

/// GET /api/me - the caller's own user document.
pub async fn me_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Item<User>>, ApiError> {
    let user = User::find_by_id(auth.user_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(Item::new(user)))
}
