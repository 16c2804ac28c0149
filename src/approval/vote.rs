use crate::identity::ParticipantId;
use crate::msg::Decision;
use crate::proposal::ProposalId;
use crate::quorum::Tally;
use serde::{Deserialize, Serialize};

/// A participant's recorded decision on a proposal. Written once, never
/// changed or removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalVote {
    pub proposal_id: ProposalId,
    pub voter: ParticipantId,
    pub decision: Decision,
    pub height: u64,
}

/// Result of a successfully recorded vote
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    pub vote: ApprovalVote,
    /// Tally including this vote
    pub tally: Tally,
}
