// Read-only queries over committed state

use crate::approval::{ApprovalLedger, ApprovalVote};
use crate::custody::{Authorization, CustodyRecord, CustodyStore};
use crate::identity::WalletId;
use crate::proposal::{Proposal, ProposalId, ProposalRegistry};
use crate::quorum::{evaluate, QuorumDecision, Tally};
use crate::storage::{KvRead, StoreError};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TallyResponse {
    pub proposal_id: ProposalId,
    pub tally: Tally,
    pub threshold: u64,
    /// What the quorum engine makes of the tally right now
    pub decision: QuorumDecision,
}

pub struct CustodyQuery;

impl CustodyQuery {
    pub fn proposal<R: KvRead + ?Sized>(kv: &R, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        ProposalRegistry::get(kv, id)
    }

    /// Proposals still open for voting at `height`
    pub fn pending<R: KvRead + ?Sized>(
        kv: &R,
        wallet: &WalletId,
        height: u64,
    ) -> Result<Vec<Proposal>, StoreError> {
        ProposalRegistry::pending_for_wallet(kv, wallet, height)
    }

    pub fn custody<R: KvRead + ?Sized>(
        kv: &R,
        wallet: &WalletId,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        CustodyStore::get(kv, wallet)
    }

    /// Spends and contract actions the wallet executed, oldest first
    pub fn authorizations<R: KvRead + ?Sized>(
        kv: &R,
        wallet: &WalletId,
    ) -> Result<Vec<Authorization>, StoreError> {
        CustodyStore::authorizations(kv, wallet)
    }

    pub fn tally<R: KvRead + ?Sized>(
        kv: &R,
        id: &ProposalId,
    ) -> Result<Option<TallyResponse>, StoreError> {
        let proposal = match ProposalRegistry::get(kv, id)? {
            Some(proposal) => proposal,
            None => return Ok(None),
        };
        let tally = ApprovalLedger::tally(kv, &proposal)?;
        Ok(Some(TallyResponse {
            proposal_id: *id,
            tally,
            threshold: proposal.policy().threshold(),
            decision: evaluate(&tally, proposal.policy()),
        }))
    }

    pub fn votes<R: KvRead + ?Sized>(kv: &R, id: &ProposalId) -> Result<Vec<ApprovalVote>, StoreError> {
        ApprovalLedger::votes(kv, id)
    }
}
