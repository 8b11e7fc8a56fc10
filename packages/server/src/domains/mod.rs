// Domain modules: each owns its models and persistence layer.

pub mod activities;
pub mod auth;
pub mod communications;
pub mod evaluations;
pub mod form_fields;
pub mod hubs;
pub mod idcards;
pub mod matching;
pub mod payments;
pub mod placements;
pub mod programs;
pub mod recognitions;
pub mod reports;
pub mod trainings;
pub mod users;
