use crate::identity::{ParticipantId, WalletId};
use crate::msg::{Decision, EffectDescriptor};
use crate::proposal::ProposalId;
use crate::quorum::Tally;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a proposal ended up rejected
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Remaining voters cannot reach the threshold
    QuorumUnreachable,
    /// The wallet's configuration changed after the proposal was created
    StaleCustodyState { expected: u64, found: u64 },
    /// The wallet cannot cover the spend
    InsufficientBalance {
        denom: String,
        available: u64,
        required: u64,
    },
    /// The effect no longer applies to the current custody record
    EffectNotApplicable { reason: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::QuorumUnreachable => write!(f, "quorum unreachable"),
            RejectReason::StaleCustodyState { expected, found } => write!(
                f,
                "stale custody state: created against version {}, wallet at {}",
                expected, found
            ),
            RejectReason::InsufficientBalance {
                denom,
                available,
                required,
            } => write!(
                f,
                "insufficient {} balance: available {}, required {}",
                denom, available, required
            ),
            RejectReason::EffectNotApplicable { reason } => write!(f, "{}", reason),
        }
    }
}

/// Events attached to a transaction receipt, in emission order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ProposalCreated {
        id: ProposalId,
        wallet: WalletId,
        creator: ParticipantId,
        expiry_height: u64,
    },
    VoteRecorded {
        proposal_id: ProposalId,
        voter: ParticipantId,
        decision: Decision,
        tally: Tally,
    },
    ProposalExpired {
        id: ProposalId,
    },
    ProposalExecuted {
        id: ProposalId,
        effect: EffectDescriptor,
    },
    ProposalRejected {
        id: ProposalId,
        reason: RejectReason,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProposalCreated { .. } => "proposal_created",
            Event::VoteRecorded { .. } => "vote_recorded",
            Event::ProposalExpired { .. } => "proposal_expired",
            Event::ProposalExecuted { .. } => "proposal_executed",
            Event::ProposalRejected { .. } => "proposal_rejected",
        }
    }
}
