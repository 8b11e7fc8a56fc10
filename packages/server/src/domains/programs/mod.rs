pub mod event;
pub mod project;
pub mod registration;

pub use event::{Event, NewEvent};
pub use project::{NewProject, Project};
pub use registration::{NewRegistration, Registration};
