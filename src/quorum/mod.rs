// Quorum module - approval policy and the pure evaluation over it

mod engine;
mod policy;

pub use engine::{evaluate, QuorumDecision, Tally};
pub use policy::QuorumPolicy;
