use std::time::Duration;

use axum::extract::Extension;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{ApiError, Item, Items};
use crate::domains::communications::{Communication, NewCommunication, Recipients};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Delay before a simulated delivery settles.
const DELIVERY_DELAY: Duration = Duration::from_secs(2);

pub fn router() -> Router {
    Router::new().route(
        "/",
        get(list_communications_handler).post(create_communication_handler),
    )
}

/// Mark a queued communication sent after resolving its audience.
fn spawn_delivery(pool: PgPool, communication_id: Uuid, recipients: Recipients) {
    tokio::spawn(async move {
        tokio::time::sleep(DELIVERY_DELAY).await;

        let sent_count = match recipients.resolve_count(&pool).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve communication audience");
                if let Err(e) = Communication::mark_failed(communication_id, &pool).await {
                    tracing::error!(error = %e, "Failed to mark communication failed");
                }
                return;
            }
        };

        match Communication::mark_sent(communication_id, sent_count, &pool).await {
            Ok(Some(_)) => {
                tracing::info!(
                    communication_id = %communication_id,
                    sent_count,
                    "Communication sent"
                );
            }
            Ok(None) => {
                tracing::warn!(communication_id = %communication_id, "Communication vanished")
            }
            Err(e) => tracing::error!(error = %e, "Failed to mark communication sent"),
        }
    });
}

/// Queue a mass communication; a background task resolves the audience and
/// marks it sent.
pub async fn create_communication_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(new): Json<NewCommunication>,
) -> Result<Json<Item<Communication>>, ApiError> {
    auth.ensure_coordinator()?;

    let allowed = ["email", "sms", "push", "telegram", "facebook", "whatsapp"];
    if !allowed.contains(&new.channel.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "invalid communication type: {}",
            new.channel
        )));
    }

    let communication =
        Communication::insert(auth.user_id, &new, "sending", &state.db_pool).await?;

    spawn_delivery(
        state.db_pool.clone(),
        communication.id,
        communication.recipients.0.clone(),
    );

    Ok(Json(Item::new(communication)))
}

pub async fn list_communications_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<Communication>>, ApiError> {
    auth.ensure_admin()?;
    let communications = Communication::list(&state.db_pool).await?;
    Ok(Json(Items::new(communications)))
}
