// REST route handlers, one module per resource
pub mod activities;
pub mod auth;
pub mod communications;
pub mod evaluations;
pub mod form_fields;
pub mod health;
pub mod hubs;
pub mod idcards;
pub mod matching;
pub mod membership_types;
pub mod payments;
pub mod placements;
pub mod programs;
pub mod recognitions;
pub mod reports;
pub mod trainings;
