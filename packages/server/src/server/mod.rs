// HTTP server setup (Axum + REST routes)
pub mod app;
pub mod middleware;
pub mod routes;

pub use app::*;
