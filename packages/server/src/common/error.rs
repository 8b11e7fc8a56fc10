use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// API errors for the VolNet platform.
///
/// Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl maps
/// each variant to a status code and a JSON `{"error": "..."}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin access required")]
    AdminRequired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

/// Model methods return `anyhow::Result`; recover the underlying sqlx error
/// so constraint violations keep their 404/409 mapping.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(db) => ApiError::Database(db),
            Err(other) => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::AuthenticationRequired
            | ApiError::InvalidToken
            | ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::AdminRequired | ApiError::PermissionDenied(_) => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Database(e) => {
                if matches!(e, sqlx::Error::RowNotFound) {
                    (StatusCode::NOT_FOUND, "Resource not found".to_string())
                } else if e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    (
                        StatusCode::CONFLICT,
                        "Duplicate value for a unique field".to_string(),
                    )
                } else {
                    tracing::error!(error = %e, "Database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_401() {
        let response = ApiError::AuthenticationRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_permission_errors_map_to_403() {
        let response = ApiError::AdminRequired.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ApiError::PermissionDenied("volunteers only".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::NotFound("Hub").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let response = ApiError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_anyhow_wrapped_sqlx_error_recovered() {
        let err: anyhow::Error = sqlx::Error::RowNotFound.into();
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::Database(sqlx::Error::RowNotFound)));

        let err = anyhow::anyhow!("not a database error");
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::Internal(_)));
    }
}
