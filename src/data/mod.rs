pub mod candidate;
pub mod loader;
pub mod rng;
pub mod synthetic;
pub mod validate;

pub use candidate::{Candidate, CandidateId, Category};
