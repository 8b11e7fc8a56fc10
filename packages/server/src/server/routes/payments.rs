use std::time::Duration;

use axum::extract::{Extension, Path, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as Jsonb;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::payments::{
    generate_transaction_id, MembershipType, NewPayment, Payment,
};
use crate::domains::payments::payment::PaymentRelatedTo;
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Fixed processing fee recorded against membership payments.
const MEMBERSHIP_PROCESSING_FEE: f64 = 2.0;

/// Delay before a simulated payment settles.
const SETTLEMENT_DELAY: Duration = Duration::from_secs(2);

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_payment_handler).get(list_payments_handler))
        .route("/my", get(my_payments_handler))
        .route("/transaction/:transaction_id", get(transaction_handler))
        .route("/membership", post(membership_payment_handler))
        .route("/donation", post(donation_handler))
}

#[derive(Debug, Deserialize)]
pub struct PaymentFilter {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
    pub method: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub items: Vec<Payment>,
    pub completed_amount: f64,
}

/// Settle a simulated payment: stamp it completed and bump the payer's
/// donation counter. Anonymous payments have no payer to credit.
pub async fn settle_payment(
    payment_id: Uuid,
    payer: Option<Uuid>,
    pool: &PgPool,
) -> Result<(), ApiError> {
    match Payment::mark_completed(payment_id, pool).await? {
        Some(_) => {
            tracing::info!(payment_id = %payment_id, "Payment settled");
            if let Some(user_id) = payer {
                User::increment_donations(user_id, pool).await?;
            }
        }
        None => tracing::warn!(payment_id = %payment_id, "Payment vanished before settlement"),
    }
    Ok(())
}

/// Settle after a short delay.
fn spawn_settlement(pool: PgPool, payment_id: Uuid, payer: Option<Uuid>) {
    tokio::spawn(async move {
        tokio::time::sleep(SETTLEMENT_DELAY).await;
        if let Err(e) = settle_payment(payment_id, payer, &pool).await {
            tracing::error!(error = %e, "Failed to settle payment");
        }
    });
}

/// Record a payment and settle it asynchronously.
pub async fn create_payment_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewPayment>,
) -> Result<Json<Item<Payment>>, ApiError> {
    if new.amount <= 0.0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }

    let transaction_id = generate_transaction_id(Utc::now());
    let payment = Payment::insert(
        Some(auth.user_id),
        &new,
        &transaction_id,
        "processing",
        &state.db_pool,
    )
    .await?;

    spawn_settlement(state.db_pool.clone(), payment.id, payment.user_id);

    Ok(Json(Item::new(payment)))
}

pub async fn my_payments_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Payment>>, ApiError> {
    let payments = Payment::list_for_user(auth.user_id, &state.db_pool).await?;
    Ok(Json(Items::new(payments)))
}

/// Admin ledger view with a completed-amount summary over the same window.
pub async fn list_payments_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<PaymentListResponse>, ApiError> {
    auth.ensure_admin()?;

    let items = Payment::list(
        filter.status.as_deref(),
        filter.payment_type.as_deref(),
        filter.method.as_deref(),
        filter.from,
        filter.to,
        &state.db_pool,
    )
    .await?;

    let completed_amount = Payment::completed_amount(
        filter.payment_type.as_deref(),
        filter.method.as_deref(),
        filter.from,
        filter.to,
        &state.db_pool,
    )
    .await?;

    Ok(Json(PaymentListResponse {
        items,
        completed_amount,
    }))
}

pub async fn transaction_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<String>,
) -> Result<Json<Item<Payment>>, ApiError> {
    let payment = Payment::find_by_transaction_id(&transaction_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Payment"))?;

    if payment.user_id != Some(auth.user_id) && !auth.role.is_admin() {
        return Err(ApiError::PermissionDenied(
            "not the owner of this payment".to_string(),
        ));
    }

    Ok(Json(Item::new(payment)))
}

#[derive(Debug, Deserialize)]
pub struct MembershipPaymentRequest {
    pub membership_type_id: Uuid,
    pub method: String,
}

/// Record a pending membership fee. The gateway handoff happens outside this
/// API; the record carries the fixed processing fee for reconciliation.
pub async fn membership_payment_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(req): Json<MembershipPaymentRequest>,
) -> Result<Json<Item<Payment>>, ApiError> {
    let membership_type = MembershipType::find_by_id(req.membership_type_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Membership type"))?;

    if !membership_type.active {
        return Err(ApiError::BadRequest(
            "Membership type is not active".to_string(),
        ));
    }

    let new = NewPayment {
        payment_type: "membership_fee".to_string(),
        amount: membership_type.amount,
        currency: membership_type.currency.clone(),
        method: req.method,
        payment_provider: None,
        metadata: Jsonb(json!({
            "membership_type": membership_type.name,
            "processing_fee": MEMBERSHIP_PROCESSING_FEE,
        })),
        description: Some(format!("Membership fee: {}", membership_type.name)),
        related_to: Jsonb(PaymentRelatedTo {
            kind: Some("membership".to_string()),
            ref_id: Some(membership_type.id),
        }),
    };

    let transaction_id = generate_transaction_id(Utc::now());
    let payment = Payment::insert(
        Some(auth.user_id),
        &new,
        &transaction_id,
        "pending",
        &state.db_pool,
    )
    .await?;

    Ok(Json(Item::new(payment)))
}

#[derive(Debug, Deserialize)]
pub struct DonationRequest {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub method: String,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub description: Option<String>,
}

fn default_currency() -> String {
    "ETB".to_string()
}

#[derive(Debug, Serialize)]
pub struct DonationResponse {
    pub transaction_id: String,
    pub status: String,
    pub amount: f64,
    pub currency: String,
}

/// Public donation intake: no account needed, donor details live in
/// metadata.
pub async fn donation_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<DonationRequest>,
) -> Result<Json<DonationResponse>, ApiError> {
    if req.amount <= 0.0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }

    let new = NewPayment {
        payment_type: "donation".to_string(),
        amount: req.amount,
        currency: req.currency,
        method: req.method,
        payment_provider: None,
        metadata: Jsonb(json!({
            "donor_name": req.donor_name,
            "donor_email": req.donor_email,
        })),
        description: req.description,
        related_to: Jsonb(PaymentRelatedTo::default()),
    };

    let transaction_id = generate_transaction_id(Utc::now());
    let payment = Payment::insert(None, &new, &transaction_id, "pending", &state.db_pool).await?;

    Ok(Json(DonationResponse {
        transaction_id,
        status: payment.status,
        amount: payment.amount,
        currency: payment.currency,
    }))
}
