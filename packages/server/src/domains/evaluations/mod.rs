pub mod evaluation;

pub use evaluation::{Evaluation, NewEvaluation};
