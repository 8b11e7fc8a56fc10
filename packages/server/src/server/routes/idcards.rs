use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Months, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json as Jsonb;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::idcards::id_card::CardMetadata;
use crate::domains::idcards::{card_type_for_role, generate_card_number, IdCard, PublicCard};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Validity of self-issued volunteer cards.
const VOLUNTEER_CARD_MONTHS: u32 = 12;

pub fn router() -> Router {
    Router::new()
        .route("/", post(issue_card_handler).get(list_cards_handler))
        .route("/member", post(self_issue_member_handler))
        .route("/volunteer", post(self_issue_volunteer_handler))
        .route("/my", get(my_cards_handler))
        .route("/card/:card_number", get(verify_card_handler))
}

fn qr_payload(card_number: &str, user: &User, card_type: &str) -> String {
    json!({
        "card_number": card_number,
        "user_id": user.id,
        "name": user.name,
        "type": card_type,
        "issued": Utc::now().to_rfc3339(),
    })
    .to_string()
}

async fn ensure_no_active_card(user_id: Uuid, state: &AppState) -> Result<(), ApiError> {
    if IdCard::find_active_for_user(user_id, &state.db_pool)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User already has an active ID card".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct IssueCardRequest {
    pub user_id: Uuid,
    pub expiry_date: Option<DateTime<Utc>>,
    pub photo: Option<String>,
    #[serde(default)]
    pub metadata: Jsonb<CardMetadata>,
}

/// Admin issuance for any user. Card type follows the holder's role.
pub async fn issue_card_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(req): Json<IssueCardRequest>,
) -> Result<Json<Item<IdCard>>, ApiError> {
    auth.ensure_admin()?;

    let user = User::find_by_id(req.user_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    ensure_no_active_card(user.id, &state).await?;

    let card_type = card_type_for_role(&user.role);
    let card_number = generate_card_number(card_type, Utc::now());
    let qr_code = qr_payload(&card_number, &user, card_type);
    let photo = req.photo.or_else(|| user.profile.photo.clone());

    let card = IdCard::insert(
        user.id,
        &card_number,
        card_type,
        req.expiry_date,
        Some(auth.user_id),
        photo.as_deref(),
        &qr_code,
        &req.metadata,
        &state.db_pool,
    )
    .await?;

    tracing::info!(card_number = %card.card_number, user_id = %user.id, "ID card issued");
    Ok(Json(Item::new(card)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelfIssueRequest {
    pub photo: Option<String>,
    pub metadata: Jsonb<CardMetadata>,
}

async fn self_issue(
    state: &AppState,
    auth: &AuthUser,
    req: SelfIssueRequest,
    expected_type: &'static str,
    expiry: impl FnOnce(&User) -> Option<DateTime<Utc>>,
) -> Result<IdCard, ApiError> {
    let user = User::find_by_id(auth.user_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    if card_type_for_role(&user.role) != expected_type {
        return Err(ApiError::PermissionDenied(format!(
            "{expected_type} card requires the {expected_type} role"
        )));
    }

    // A card is unusable without a photo.
    let photo = req
        .photo
        .clone()
        .or_else(|| user.profile.photo.clone())
        .ok_or_else(|| ApiError::BadRequest("A photo is required for an ID card".to_string()))?;

    if let Some(new_photo) = &req.photo {
        User::set_profile_photo(user.id, new_photo, &state.db_pool).await?;
    }

    ensure_no_active_card(user.id, state).await?;

    let card_number = generate_card_number(expected_type, Utc::now());
    let qr_code = qr_payload(&card_number, &user, expected_type);
    let expiry_date = expiry(&user);

    IdCard::insert(
        user.id,
        &card_number,
        expected_type,
        expiry_date,
        None,
        Some(&photo),
        &qr_code,
        &req.metadata,
        &state.db_pool,
    )
    .await
    .map_err(Into::into)
}

/// Member self-service issuance; the card expires with the membership.
pub async fn self_issue_member_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(req): Json<SelfIssueRequest>,
) -> Result<Json<Item<IdCard>>, ApiError> {
    let card = self_issue(&state, &auth, req, "member", |user| user.membership_expiry).await?;
    Ok(Json(Item::new(card)))
}

/// Volunteer self-service issuance with a fixed validity window.
pub async fn self_issue_volunteer_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(req): Json<SelfIssueRequest>,
) -> Result<Json<Item<IdCard>>, ApiError> {
    let card = self_issue(&state, &auth, req, "volunteer", |_| {
        Utc::now().checked_add_months(Months::new(VOLUNTEER_CARD_MONTHS))
    })
    .await?;
    Ok(Json(Item::new(card)))
}

pub async fn my_cards_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<IdCard>>, ApiError> {
    let cards = IdCard::list_for_user(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(cards)))
}

/// Public card verification: anyone scanning a card can confirm it.
pub async fn verify_card_handler(
    Extension(state): Extension<AppState>,
    Path(card_number): Path<String>,
) -> Result<Json<Item<PublicCard>>, ApiError> {
    let card = IdCard::find_public_by_card_number(&card_number, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("ID card"))?;
    Ok(Json(Item::new(card)))
}

pub async fn list_cards_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<IdCard>>, ApiError> {
    auth.ensure_admin()?;
    let cards = IdCard::list(&state.db_pool).await?;
    Ok(Json(Items::new(cards)))
}
