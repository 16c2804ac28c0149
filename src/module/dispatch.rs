// Dispatch - command kind -> handler
//
// Closed table: every command kind maps to exactly one handler with the same
// signature. Handlers run against the transaction context and never commit.

use crate::approval::ApprovalLedger;
use crate::executor::{ExecutionOutcome, Executor};
use crate::module::{Context, Event, ModuleError, RejectReason};
use crate::msg::{Command, MsgKind};
use crate::proposal::{ProposalId, ProposalRegistry, ProposalStatus};
use crate::quorum::{evaluate, QuorumDecision, Tally};
use serde::Serialize;
use tracing::info;

/// What a committed transaction did
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TxOutcome {
    Created {
        proposal_id: ProposalId,
    },
    /// Vote counted; `status` is where the proposal ended up
    Voted {
        proposal_id: ProposalId,
        tally: Tally,
        status: ProposalStatus,
    },
    /// The vote arrived after the deadline and expired the proposal instead
    Expired {
        proposal_id: ProposalId,
    },
}

pub type Handler = fn(&mut Context<'_>, &Command) -> Result<TxOutcome, ModuleError>;

pub fn handler_for(kind: MsgKind) -> Handler {
    match kind {
        MsgKind::CreateProposal => handle_create_proposal,
        MsgKind::Vote => handle_vote,
    }
}

pub fn dispatch(ctx: &mut Context<'_>, cmd: &Command) -> Result<TxOutcome, ModuleError> {
    handler_for(cmd.kind())(ctx, cmd)
}

fn handle_create_proposal(ctx: &mut Context<'_>, cmd: &Command) -> Result<TxOutcome, ModuleError> {
    let Command::CreateProposal(create) = cmd else {
        return Err(handler_mismatch(cmd));
    };

    let proposal_id = ProposalRegistry::create(ctx, create)?;
    Ok(TxOutcome::Created { proposal_id })
}

fn handle_vote(ctx: &mut Context<'_>, cmd: &Command) -> Result<TxOutcome, ModuleError> {
    let Command::Vote(vote) = cmd else {
        return Err(handler_mismatch(cmd));
    };
    let id = vote.proposal_id;

    // a late vote fails with ProposalExpired after the ledger wrote the
    // expiry; the keeper commits that as TxOutcome::Expired
    let recorded = ApprovalLedger::record_vote(ctx, vote)?;

    let proposal = ProposalRegistry::require(ctx.store(), &id)?;

    let status = match evaluate(&recorded.tally, proposal.policy()) {
        QuorumDecision::Pending => ProposalStatus::Pending,
        QuorumDecision::Approved => {
            ProposalRegistry::set_status(ctx, &id, ProposalStatus::Approved)?;
            info!(
                proposal = %id,
                approve = recorded.tally.approve,
                threshold = proposal.policy().threshold(),
                "Quorum reached"
            );

            match Executor::execute(ctx, &id)? {
                ExecutionOutcome::Executed => ProposalStatus::Executed,
                ExecutionOutcome::Rejected(_) => ProposalStatus::Rejected,
                ExecutionOutcome::Skipped(status) => {
                    return Err(ModuleError::Invariant(format!(
                        "proposal {} approved in this transaction but already {}",
                        id, status
                    )))
                }
            }
        }
        QuorumDecision::Rejected => {
            ProposalRegistry::set_status(ctx, &id, ProposalStatus::Rejected)?;
            info!(
                proposal = %id,
                approve = recorded.tally.approve,
                outstanding = recorded.tally.outstanding(),
                threshold = proposal.policy().threshold(),
                "Quorum unreachable"
            );
            ctx.emit(Event::ProposalRejected {
                id,
                reason: RejectReason::QuorumUnreachable,
            });
            ProposalStatus::Rejected
        }
    };

    Ok(TxOutcome::Voted {
        proposal_id: id,
        tally: recorded.tally,
        status,
    })
}

fn handler_mismatch(cmd: &Command) -> ModuleError {
    ModuleError::Invariant(format!("handler received a {} command", cmd.kind()))
}
