use crate::identity::{ParticipantId, WalletId};
use crate::msg::EffectDescriptor;
use crate::proposal::ProposalId;
use crate::quorum::QuorumPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record of an executed action the wallet authorized
///
/// Kept in its own keyspace so the custody record stays a fixed-size
/// configuration regardless of how much the wallet has spent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub wallet: WalletId,
    pub proposal_id: ProposalId,
    pub height: u64,
    pub effect: EffectDescriptor,
}

/// Current custody configuration of a shared wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyRecord {
    wallet: WalletId,
    /// Participants, their weights and the approval threshold
    policy: QuorumPolicy,
    /// Next sequence number used to derive a proposal id
    sequence: u64,
    /// Bumped on every structural change to `policy`
    config_version: u64,
    balances: BTreeMap<String, u64>,
    created_height: u64,
    updated_height: u64,
}

impl CustodyRecord {
    pub fn new(
        wallet: WalletId,
        policy: QuorumPolicy,
        balances: BTreeMap<String, u64>,
        height: u64,
    ) -> Self {
        Self {
            wallet,
            policy,
            sequence: 0,
            config_version: 0,
            balances,
            created_height: height,
            updated_height: height,
        }
    }

    pub fn wallet(&self) -> &WalletId {
        &self.wallet
    }

    pub fn policy(&self) -> &QuorumPolicy {
        &self.policy
    }

    pub fn is_participant(&self, participant: &ParticipantId) -> bool {
        self.policy.is_eligible(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.policy.weights().keys()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn config_version(&self) -> u64 {
        self.config_version
    }

    pub fn balances(&self) -> &BTreeMap<String, u64> {
        &self.balances
    }

    pub fn balance(&self, denom: &str) -> u64 {
        self.balances.get(denom).copied().unwrap_or(0)
    }

    pub fn created_height(&self) -> u64 {
        self.created_height
    }

    pub fn updated_height(&self) -> u64 {
        self.updated_height
    }

    /// Hand out the current sequence number and advance it
    pub(crate) fn take_sequence(&mut self) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    pub(crate) fn policy_mut(&mut self) -> &mut QuorumPolicy {
        &mut self.policy
    }

    pub(crate) fn bump_config_version(&mut self) {
        self.config_version += 1;
    }

    pub(crate) fn balances_mut(&mut self) -> &mut BTreeMap<String, u64> {
        &mut self.balances
    }

    pub(crate) fn touch(&mut self, height: u64) {
        self.updated_height = height;
    }
}
