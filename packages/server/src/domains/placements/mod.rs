pub mod placement;

pub use placement::{NewPlacement, Placement};
