// VolNet - NGO volunteer and member management API.
//
// This crate provides the REST backend for registering volunteers, members
// and partner hubs, matching volunteers to hub requests, and tracking
// placements, activities, trainings, payments and recognitions.

pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
