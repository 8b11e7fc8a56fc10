pub mod activity;

pub use activity::{hours_between, Activity, ActivityUpdate, NewActivity};
