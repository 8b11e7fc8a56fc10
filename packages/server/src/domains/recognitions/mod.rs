pub mod recognition;

pub use recognition::{NewRecognition, Recognition};
