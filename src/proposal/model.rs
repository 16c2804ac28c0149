use crate::identity::{ParticipantId, WalletId};
use crate::msg::EffectDescriptor;
use crate::quorum::QuorumPolicy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid proposal id: {0}")]
pub struct ProposalIdError(pub String);

/// Unique identifier for a proposal
///
/// SHA256 over (wallet, creator, wallet sequence), so every node derives the
/// same id for the same transaction and a replayed creation can never collide
/// with an earlier proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId([u8; 32]);

impl ProposalId {
    /// Derive the identifier for a new proposal
    pub fn derive(wallet: &WalletId, creator: &ParticipantId, sequence: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"proposal:");
        hasher.update((wallet.as_str().len() as u32).to_le_bytes());
        hasher.update(wallet.as_str().as_bytes());
        hasher.update((creator.as_str().len() as u32).to_le_bytes());
        hasher.update(creator.as_str().as_bytes());
        hasher.update(sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&hash);
        Self(id)
    }

    /// Create a ProposalId from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 64-character hex form
    pub fn from_hex(s: &str) -> Result<Self, ProposalIdError> {
        let bytes = hex::decode(s).map_err(|e| ProposalIdError(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ProposalIdError(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ProposalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for ProposalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            ProposalId::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(ProposalId)
        }
    }
}

/// Lifecycle status of a proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    /// Quorum reached; execution happens in the same transaction
    Approved,
    Rejected,
    Expired,
    Executed,
}

impl ProposalStatus {
    /// No transition may leave a final status
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Rejected | ProposalStatus::Expired | ProposalStatus::Executed
        )
    }

    /// Anything but Pending counts as decided for voting purposes
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    /// Allowed forward transitions
    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Expired)
                | (Approved, Executed)
                | (Approved, Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
            ProposalStatus::Executed => "executed",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to change custody or act on behalf of a shared wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    wallet: WalletId,
    creator: ParticipantId,
    payload: EffectDescriptor,
    sequence: u64,
    created_height: u64,
    expiry_height: u64,
    status: ProposalStatus,
    policy: QuorumPolicy,
    config_version: u64,
    updated_height: u64,
}

impl Proposal {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ProposalId,
        wallet: WalletId,
        creator: ParticipantId,
        payload: EffectDescriptor,
        sequence: u64,
        created_height: u64,
        expiry_height: u64,
        policy: QuorumPolicy,
        config_version: u64,
    ) -> Self {
        Self {
            id,
            wallet,
            creator,
            payload,
            sequence,
            created_height,
            expiry_height,
            status: ProposalStatus::Pending,
            policy,
            config_version,
            updated_height: created_height,
        }
    }

    pub fn id(&self) -> &ProposalId {
        &self.id
    }

    pub fn wallet(&self) -> &WalletId {
        &self.wallet
    }

    pub fn creator(&self) -> &ParticipantId {
        &self.creator
    }

    pub fn payload(&self) -> &EffectDescriptor {
        &self.payload
    }

    /// Wallet sequence number the id was derived from
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn created_height(&self) -> u64 {
        self.created_height
    }

    pub fn expiry_height(&self) -> u64 {
        self.expiry_height
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    /// Policy frozen at creation
    pub fn policy(&self) -> &QuorumPolicy {
        &self.policy
    }

    /// Custody configuration version the proposal was created against
    pub fn config_version(&self) -> u64 {
        self.config_version
    }

    pub fn updated_height(&self) -> u64 {
        self.updated_height
    }

    /// Past its deadline at `height` (the expiry height itself is still open)
    pub fn is_expired_at(&self, height: u64) -> bool {
        height > self.expiry_height
    }

    pub(crate) fn set_status(&mut self, status: ProposalStatus, height: u64) {
        self.status = status;
        self.updated_height = height;
    }
}
