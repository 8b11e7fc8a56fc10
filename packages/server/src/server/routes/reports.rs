use axum::extract::{Extension, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::reports::DashboardReport;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/custom", post(custom_report_handler))
}

#[derive(Debug, Deserialize)]
pub struct DateWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub async fn dashboard_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Query(window): Query<DateWindow>,
) -> Result<Json<DashboardReport>, ApiError> {
    auth.ensure_coordinator()?;
    let report = DashboardReport::build(window.from, window.to, &state.db_pool).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct CustomReportRequest {
    pub report_type: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filters: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CustomReportResponse {
    pub report_type: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub filters: serde_json::Value,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub status: String,
}

/// Accept a custom report request. Generation runs in an external pipeline;
/// this endpoint validates and echoes the accepted parameters.
pub async fn custom_report_handler(
    auth: AuthUser,
    Json(req): Json<CustomReportRequest>,
) -> Result<Json<CustomReportResponse>, ApiError> {
    auth.ensure_admin()?;

    if req.report_type.is_empty() {
        return Err(ApiError::BadRequest("report_type is required".to_string()));
    }

    Ok(Json(CustomReportResponse {
        report_type: req.report_type,
        from: req.from,
        to: req.to,
        filters: req.filters,
        requested_by: auth.user_id,
        requested_at: Utc::now(),
        status: "accepted".to_string(),
    }))
}
