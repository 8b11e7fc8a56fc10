pub mod training;

pub use training::{NewTraining, Training};
