pub mod communication;

pub use communication::{Communication, NewCommunication, Recipients};
