pub mod hub;
pub mod volunteer_request;

pub use hub::{Hub, HubUpdate, NewHub};
pub use volunteer_request::{MatchCriteria, NewVolunteerRequest, VolunteerRequest};
