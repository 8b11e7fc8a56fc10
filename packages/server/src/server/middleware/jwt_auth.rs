use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

use crate::common::{ApiError, Role};
use crate::domains::auth::JwtService;

/// Authenticated user information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn ensure_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::AdminRequired)
        }
    }

    /// Admin or hub coordinator.
    pub fn ensure_coordinator(&self) -> Result<(), ApiError> {
        if self.role.is_coordinator() {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied(
                "admin or hub coordinator access required".to_string(),
            ))
        }
    }

    /// Admin or evaluator.
    pub fn ensure_reviewer(&self) -> Result<(), ApiError> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied(
                "admin or evaluator access required".to_string(),
            ))
        }
    }

    /// Admin, evaluator or hub coordinator.
    pub fn ensure_evaluator(&self) -> Result<(), ApiError> {
        if self.role.can_evaluate() {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied(
                "evaluator access required".to_string(),
            ))
        }
    }
}

/// JWT authentication middleware
///
/// Extracts the JWT from the Authorization header, verifies it, and adds
/// AuthUser to request extensions. If no token or invalid token, the request
/// continues without AuthUser (public access); protected handlers reject via
/// the AuthUser extractor.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!("Authenticated user: {} ({})", user.user_id, user.role);
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        user_id: claims.user_id,
        role: claims.role,
    })
}

/// Required-auth extractor: pulls the AuthUser the middleware inserted, or
/// rejects with 401.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let user_id = Uuid::new_v4();
        let token = jwt_service.create_token(user_id, Role::Admin).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert!(auth_user.is_some());
        assert_eq!(auth_user.unwrap().user_id, user_id);
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let user_id = Uuid::new_v4();
        let token = jwt_service.create_token(user_id, Role::Volunteer).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", token)
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service);
        assert!(auth_user.is_some());
        assert_eq!(auth_user.unwrap().role, Role::Volunteer);
    }

    #[test]
    fn test_extract_rejects_garbage_token() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());

        let request = axum::http::Request::builder()
            .header("authorization", "Bearer not-a-token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &jwt_service).is_none());
    }

    #[test]
    fn test_missing_header_yields_none() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());

        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &jwt_service).is_none());
    }

    #[test]
    fn test_role_guards() {
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(admin.ensure_admin().is_ok());
        assert!(admin.ensure_coordinator().is_ok());
        assert!(admin.ensure_reviewer().is_ok());

        let volunteer = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Volunteer,
        };
        assert!(volunteer.ensure_admin().is_err());
        assert!(volunteer.ensure_coordinator().is_err());
        assert!(volunteer.ensure_evaluator().is_err());

        let coordinator = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::HubCoordinator,
        };
        assert!(coordinator.ensure_coordinator().is_ok());
        assert!(coordinator.ensure_reviewer().is_err());
        assert!(coordinator.ensure_evaluator().is_ok());
    }
}
