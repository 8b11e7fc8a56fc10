//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, jwt_secret: &str, jwt_issuer: String) -> Router {
    let jwt_service = Arc::new(JwtService::new(jwt_secret, jwt_issuer));

    let app_state = AppState {
        db_pool: pool,
        jwt_service: jwt_service.clone(),
    };

    // CORS configuration - the API serves browser clients on other origins
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let api = Router::new()
        .route("/me", get(routes::auth::me_handler))
        .nest("/auth", routes::auth::router())
        .nest("/hubs", routes::hubs::router())
        .nest("/volunteer-matching", routes::matching::router())
        .nest("/placement", routes::placements::router())
        .nest("/activities", routes::activities::router())
        .nest("/training", routes::trainings::router())
        .nest("/evaluation", routes::evaluations::router())
        .nest("/recognition", routes::recognitions::router())
        .nest("/payments", routes::payments::router())
        .nest("/membership-types", routes::membership_types::router())
        .nest("/communication", routes::communications::router())
        .nest("/idcards", routes::idcards::router())
        .nest("/reports", routes::reports::router())
        .nest("/form-fields", routes::form_fields::router())
        .merge(routes::programs::router());

    Router::new()
        .route("/", get(routes::health::root_handler))
        .route("/health", get(routes::health::health_handler))
        .nest("/api", api)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
