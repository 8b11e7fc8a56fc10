// Common types and utilities shared across the application

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::*;
