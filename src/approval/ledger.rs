// Approval Ledger - (proposal, participant) -> vote
//
// At most one vote per pair. A second vote is refused whatever its decision,
// so a replayed or revised vote can never shift a tally.

use crate::approval::{ApprovalVote, VoteOutcome};
use crate::identity::ParticipantId;
use crate::module::{Context, Event};
use crate::msg::{CastVote, Decision};
use crate::proposal::{Proposal, ProposalId, ProposalRegistry, ProposalStatus, RegistryError};
use crate::quorum::Tally;
use crate::storage::{decode_record, encode_record, keys, KvRead, StoreError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Proposal {id} is {status}, not pending")]
    ProposalNotPending { id: ProposalId, status: ProposalStatus },

    #[error("Proposal {id} expired at height {expiry_height}")]
    ProposalExpired { id: ProposalId, expiry_height: u64 },

    #[error("{voter} is not an eligible voter on proposal {id}")]
    NotAnEligibleVoter { id: ProposalId, voter: ParticipantId },

    #[error("{voter} already voted on proposal {id}")]
    DuplicateVote { id: ProposalId, voter: ParticipantId },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct ApprovalLedger;

impl ApprovalLedger {
    /// Record a vote and return the updated tally
    ///
    /// A vote arriving past the proposal's expiry height first moves the
    /// proposal to Expired (and emits ProposalExpired) before failing with
    /// `ProposalExpired`. Those writes belong to the transaction.
    pub fn record_vote(ctx: &mut Context<'_>, cmd: &CastVote) -> Result<VoteOutcome, LedgerError> {
        let id = cmd.proposal_id;
        let height = ctx.height();

        let proposal = ProposalRegistry::get(ctx.store(), &id)?
            .ok_or(LedgerError::ProposalNotFound(id))?;

        if proposal.status() != ProposalStatus::Pending {
            return Err(LedgerError::ProposalNotPending {
                id,
                status: proposal.status(),
            });
        }

        if proposal.is_expired_at(height) {
            ProposalRegistry::set_status(ctx, &id, ProposalStatus::Expired)?;
            info!(
                proposal = %id,
                expiry_height = proposal.expiry_height(),
                height,
                "Proposal expired"
            );
            ctx.emit(Event::ProposalExpired { id });
            return Err(LedgerError::ProposalExpired {
                id,
                expiry_height: proposal.expiry_height(),
            });
        }

        if !proposal.policy().is_eligible(&cmd.voter) {
            return Err(LedgerError::NotAnEligibleVoter {
                id,
                voter: cmd.voter.clone(),
            });
        }

        let key = keys::vote_key(id.as_bytes(), cmd.voter.as_str());
        if ctx.store().get(&key)?.is_some() {
            return Err(LedgerError::DuplicateVote {
                id,
                voter: cmd.voter.clone(),
            });
        }

        let vote = ApprovalVote {
            proposal_id: id,
            voter: cmd.voter.clone(),
            decision: cmd.decision,
            height,
        };
        ctx.store_mut().set(key, encode_record(&vote)?);

        let tally = Self::tally(ctx.store(), &proposal)?;

        debug!(
            proposal = %id,
            voter = %vote.voter,
            decision = %vote.decision,
            approve = tally.approve,
            reject = tally.reject,
            total = tally.total,
            "Vote recorded"
        );

        ctx.emit(Event::VoteRecorded {
            proposal_id: id,
            voter: vote.voter.clone(),
            decision: vote.decision,
            tally,
        });

        Ok(VoteOutcome { vote, tally })
    }

    /// Weigh the recorded votes against the proposal's frozen policy
    pub fn tally<R: KvRead + ?Sized>(kv: &R, proposal: &Proposal) -> Result<Tally, StoreError> {
        let policy = proposal.policy();
        let mut tally = Tally::new(0, 0, policy.total_weight());

        for vote in Self::votes(kv, proposal.id())? {
            let weight = policy.weight_of(&vote.voter);
            match vote.decision {
                Decision::Approve => tally.approve = tally.approve.saturating_add(weight),
                Decision::Reject => tally.reject = tally.reject.saturating_add(weight),
            }
        }

        Ok(tally)
    }

    /// Votes on a proposal in voter order
    pub fn votes<R: KvRead + ?Sized>(kv: &R, id: &ProposalId) -> Result<Vec<ApprovalVote>, StoreError> {
        kv.scan_prefix(&keys::votes_prefix(id.as_bytes()))?
            .into_iter()
            .map(|(_, bytes)| decode_record(&bytes))
            .collect()
    }

    pub fn get<R: KvRead + ?Sized>(
        kv: &R,
        id: &ProposalId,
        voter: &ParticipantId,
    ) -> Result<Option<ApprovalVote>, StoreError> {
        match kv.get(&keys::vote_key(id.as_bytes(), voter.as_str()))? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }
}
