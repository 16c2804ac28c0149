use crate::identity::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Approval policy: required weight plus the eligible voters and their weights
///
/// A proposal carries its own copy taken at creation, so later custody
/// changes never affect how an in-flight proposal is counted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    threshold: u64,
    weights: BTreeMap<ParticipantId, u64>,
}

impl QuorumPolicy {
    pub fn new(threshold: u64, weights: BTreeMap<ParticipantId, u64>) -> Self {
        Self { threshold, weights }
    }

    /// Every participant carries weight 1
    pub fn unweighted<I>(threshold: u64, participants: I) -> Self
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        Self {
            threshold,
            weights: participants.into_iter().map(|p| (p, 1)).collect(),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn weights(&self) -> &BTreeMap<ParticipantId, u64> {
        &self.weights
    }

    pub fn is_eligible(&self, participant: &ParticipantId) -> bool {
        self.weights.contains_key(participant)
    }

    /// Weight of a voter, zero when not eligible
    pub fn weight_of(&self, participant: &ParticipantId) -> u64 {
        self.weights.get(participant).copied().unwrap_or(0)
    }

    pub fn total_weight(&self) -> u64 {
        self.weights
            .values()
            .fold(0u64, |acc, w| acc.saturating_add(*w))
    }

    pub fn participant_count(&self) -> usize {
        self.weights.len()
    }

    /// A policy is usable when someone can vote and the threshold can be met
    pub fn is_satisfiable(&self) -> bool {
        self.threshold > 0 && !self.weights.is_empty() && self.threshold <= self.total_weight()
    }

    pub(crate) fn weights_mut(&mut self) -> &mut BTreeMap<ParticipantId, u64> {
        &mut self.weights
    }

    pub(crate) fn set_threshold(&mut self, threshold: u64) {
        self.threshold = threshold;
    }
}
