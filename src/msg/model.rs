use crate::identity::{ParticipantId, PublicKey, Signature, WalletId};
use crate::msg::EffectDescriptor;
use crate::proposal::ProposalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const CREATE_PROPOSAL_TYPE_URL: &str = "/custody.v1.MsgCreateProposal";
pub const VOTE_TYPE_URL: &str = "/custody.v1.MsgVote";

/// Tag identifying which command a message carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgKind {
    CreateProposal,
    Vote,
}

impl MsgKind {
    pub fn type_url(&self) -> &'static str {
        match self {
            MsgKind::CreateProposal => CREATE_PROPOSAL_TYPE_URL,
            MsgKind::Vote => VOTE_TYPE_URL,
        }
    }

    pub fn from_type_url(type_url: &str) -> Option<Self> {
        match type_url {
            CREATE_PROPOSAL_TYPE_URL => Some(MsgKind::CreateProposal),
            VOTE_TYPE_URL => Some(MsgKind::Vote),
            _ => None,
        }
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgKind::CreateProposal => f.write_str("create_proposal"),
            MsgKind::Vote => f.write_str("vote"),
        }
    }
}

/// Raw transaction message as delivered by the runtime: a type tag and an
/// encoded body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMessage {
    type_url: String,
    value: Vec<u8>,
}

impl TxMessage {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

// ============================================================================
// WIRE BODIES
// ============================================================================

/// Body of a create-proposal message, before validation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateProposal {
    pub wallet: String,
    pub creator: String,
    pub kind: String,
    pub params: BTreeMap<String, String>,
    pub expiry_height: u64,
}

/// Body of a vote message, before validation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    pub proposal_id: String,
    pub voter: String,
    pub decision: String,
}

// ============================================================================
// TYPED COMMANDS
// ============================================================================

/// A voter's decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(Decision::Approve),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateProposal {
    pub wallet: WalletId,
    pub creator: ParticipantId,
    pub payload: EffectDescriptor,
    pub expiry_height: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastVote {
    pub proposal_id: ProposalId,
    pub voter: ParticipantId,
    pub decision: Decision,
}

/// Well-formed command ready for dispatch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CreateProposal(CreateProposal),
    Vote(CastVote),
}

impl Command {
    pub fn kind(&self) -> MsgKind {
        match self {
            Command::CreateProposal(_) => MsgKind::CreateProposal,
            Command::Vote(_) => MsgKind::Vote,
        }
    }

    /// Participant who must have signed the transaction
    pub fn signer(&self) -> &ParticipantId {
        match self {
            Command::CreateProposal(c) => &c.creator,
            Command::Vote(v) => &v.voter,
        }
    }
}

impl From<&CreateProposal> for MsgCreateProposal {
    fn from(cmd: &CreateProposal) -> Self {
        Self {
            wallet: cmd.wallet.to_string(),
            creator: cmd.creator.to_string(),
            kind: cmd.payload.kind.clone(),
            params: cmd.payload.params.clone(),
            expiry_height: cmd.expiry_height,
        }
    }
}

impl From<&CastVote> for MsgVote {
    fn from(cmd: &CastVote) -> Self {
        Self {
            proposal_id: cmd.proposal_id.to_hex(),
            voter: cmd.voter.to_string(),
            decision: cmd.decision.as_str().to_string(),
        }
    }
}

/// Message plus the signer's key and signature over the encoded message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    msg: TxMessage,
    public_key: PublicKey,
    signature: Signature,
}

impl SignedTx {
    pub fn from_parts(msg: TxMessage, public_key: PublicKey, signature: Signature) -> Self {
        Self {
            msg,
            public_key,
            signature,
        }
    }

    pub fn msg(&self) -> &TxMessage {
        &self.msg
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}
