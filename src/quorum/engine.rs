// Quorum evaluation - pure function of a tally and a frozen policy

use crate::quorum::QuorumPolicy;
use serde::{Deserialize, Serialize};

/// Accumulated vote weight for one proposal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub approve: u64,
    pub reject: u64,
    pub total: u64,
}

impl Tally {
    pub fn new(approve: u64, reject: u64, total: u64) -> Self {
        Self {
            approve,
            reject,
            total,
        }
    }

    /// Weight of eligible voters who have not voted yet
    pub fn outstanding(&self) -> u64 {
        self.total
            .saturating_sub(self.approve.saturating_add(self.reject))
    }
}

/// Outcome of evaluating a tally against its policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuorumDecision {
    Pending,
    Approved,
    Rejected,
}

/// Evaluate a tally against a policy
///
/// Approved once approve weight reaches the threshold (equality approves).
/// Rejected as soon as the threshold is out of reach even if every
/// outstanding voter approves. Otherwise still pending.
pub fn evaluate(tally: &Tally, policy: &QuorumPolicy) -> QuorumDecision {
    let threshold = policy.threshold();

    if tally.approve >= threshold {
        return QuorumDecision::Approved;
    }

    let best_case = tally.approve.saturating_add(tally.outstanding());
    if best_case < threshold {
        return QuorumDecision::Rejected;
    }

    QuorumDecision::Pending
}
