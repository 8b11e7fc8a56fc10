pub mod scorer;

pub use scorer::{rank_candidates, CandidateProfile, ScoredCandidate};
