// State Transition Executor - applies an approved proposal to its wallet
//
// The custody mutation and the move to Executed land in the same write
// buffer, so either both commit with the transaction or neither does. An
// effect that no longer fits the wallet rejects the proposal instead.

use crate::custody::{Authorization, CustodyRecord, CustodyStore};
use crate::identity::{ParticipantId, WalletId};
use crate::module::{Context, Event, Params, RejectReason};
use crate::msg::{Effect, EffectError};
use crate::proposal::{Proposal, ProposalId, ProposalRegistry, ProposalStatus, RegistryError};
use crate::storage::StoreError;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Custody state changed since proposal creation (version {expected}, now {found})")]
    StaleCustodyState { expected: u64, found: u64 },

    #[error("Insufficient {denom} balance: available {available}, required {required}")]
    InsufficientBalance {
        denom: String,
        available: u64,
        required: u64,
    },

    #[error("{0} is already a participant")]
    AlreadyParticipant(ParticipantId),

    #[error("{0} is not a participant")]
    UnknownParticipant(ParticipantId),

    #[error("Threshold {threshold} cannot be met by total weight {total_weight}")]
    UnsatisfiablePolicy { threshold: u64, total_weight: u64 },

    #[error("Wallet would exceed {max} participants")]
    TooManyParticipants { max: usize },

    #[error("Stored payload no longer parses: {0}")]
    InvalidPayload(#[from] EffectError),

    #[error("Custody record missing for wallet {0}")]
    CustodyMissing(WalletId),

    #[error("Proposal {id} is {status}, expected approved")]
    NotApproved { id: ProposalId, status: ProposalStatus },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ExecutionError {
    /// How the failure is reported when it rejects the proposal. `None` means
    /// the failure is not a lifecycle outcome and must abort the transaction.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            ExecutionError::StaleCustodyState { expected, found } => {
                Some(RejectReason::StaleCustodyState {
                    expected: *expected,
                    found: *found,
                })
            }
            ExecutionError::InsufficientBalance {
                denom,
                available,
                required,
            } => Some(RejectReason::InsufficientBalance {
                denom: denom.clone(),
                available: *available,
                required: *required,
            }),
            ExecutionError::AlreadyParticipant(_)
            | ExecutionError::UnknownParticipant(_)
            | ExecutionError::UnsatisfiablePolicy { .. }
            | ExecutionError::TooManyParticipants { .. }
            | ExecutionError::InvalidPayload(_) => Some(RejectReason::EffectNotApplicable {
                reason: self.to_string(),
            }),
            ExecutionError::CustodyMissing(_)
            | ExecutionError::NotApproved { .. }
            | ExecutionError::Registry(_)
            | ExecutionError::Store(_) => None,
        }
    }
}

/// What `Executor::execute` did with a proposal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Executed,
    Rejected(RejectReason),
    /// Already final; nothing was applied again
    Skipped(ProposalStatus),
}

pub struct Executor;

impl Executor {
    /// Apply an approved proposal's effect
    ///
    /// Runs at most once per proposal: anything already final is skipped
    /// untouched. Calling it on a proposal still pending is an internal error.
    pub fn execute(ctx: &mut Context<'_>, id: &ProposalId) -> Result<ExecutionOutcome, ExecutionError> {
        let proposal = ProposalRegistry::require(ctx.store(), id)?;

        match proposal.status() {
            ProposalStatus::Approved => {}
            status if status.is_final() => return Ok(ExecutionOutcome::Skipped(status)),
            status => return Err(ExecutionError::NotApproved { id: *id, status }),
        }

        let custody = CustodyStore::get(ctx.store(), proposal.wallet())?
            .ok_or_else(|| ExecutionError::CustodyMissing(proposal.wallet().clone()))?;

        let mut updated = custody.clone();
        match Self::apply(&mut updated, &proposal, ctx.height(), ctx.params()) {
            Ok(authorization) => {
                CustodyStore::save(ctx.store_mut(), &updated)?;
                if let Some(authorization) = authorization {
                    CustodyStore::record_authorization(ctx.store_mut(), &authorization)?;
                }
                ProposalRegistry::set_status(ctx, id, ProposalStatus::Executed)?;

                info!(
                    proposal = %id,
                    wallet = %proposal.wallet(),
                    kind = %proposal.payload().kind,
                    config_version = updated.config_version(),
                    "Proposal executed"
                );

                ctx.emit(Event::ProposalExecuted {
                    id: *id,
                    effect: proposal.payload().clone(),
                });
                Ok(ExecutionOutcome::Executed)
            }
            Err(err) => {
                let reason = match err.reject_reason() {
                    Some(reason) => reason,
                    None => return Err(err),
                };
                ProposalRegistry::set_status(ctx, id, ProposalStatus::Rejected)?;

                warn!(proposal = %id, wallet = %proposal.wallet(), %reason, "Proposal rejected at execution");

                ctx.emit(Event::ProposalRejected {
                    id: *id,
                    reason: reason.clone(),
                });
                Ok(ExecutionOutcome::Rejected(reason))
            }
        }
    }

    /// Interpret the proposal's effect against `custody`
    ///
    /// Spends and contract actions come back as the authorization to record.
    /// On error `custody` may be partially modified; callers work on a copy.
    fn apply(
        custody: &mut CustodyRecord,
        proposal: &Proposal,
        height: u64,
        params: &Params,
    ) -> Result<Option<Authorization>, ExecutionError> {
        if custody.config_version() != proposal.config_version() {
            return Err(ExecutionError::StaleCustodyState {
                expected: proposal.config_version(),
                found: custody.config_version(),
            });
        }

        let effect = Effect::parse(proposal.payload())?;

        match &effect {
            Effect::AddParticipant {
                participant,
                weight,
            } => {
                if custody.is_participant(participant) {
                    return Err(ExecutionError::AlreadyParticipant(participant.clone()));
                }
                let max = params.max_participants;
                if max > 0 && custody.policy().participant_count() >= max {
                    return Err(ExecutionError::TooManyParticipants { max });
                }
                custody
                    .policy_mut()
                    .weights_mut()
                    .insert(participant.clone(), *weight);
            }
            Effect::RemoveParticipant { participant } => {
                if custody
                    .policy_mut()
                    .weights_mut()
                    .remove(participant)
                    .is_none()
                {
                    return Err(ExecutionError::UnknownParticipant(participant.clone()));
                }
            }
            Effect::ChangeThreshold { threshold } => {
                custody.policy_mut().set_threshold(*threshold);
            }
            Effect::SetWeight {
                participant,
                weight,
            } => match custody.policy_mut().weights_mut().get_mut(participant) {
                Some(current) => *current = *weight,
                None => return Err(ExecutionError::UnknownParticipant(participant.clone())),
            },
            Effect::Send { denom, amount, .. } => {
                let available = custody.balance(denom);
                if available < *amount {
                    return Err(ExecutionError::InsufficientBalance {
                        denom: denom.clone(),
                        available,
                        required: *amount,
                    });
                }
                custody
                    .balances_mut()
                    .insert(denom.clone(), available - *amount);
            }
            Effect::Contract { .. } => {}
        }

        let authorization = if effect.is_structural() {
            let policy = custody.policy();
            if !policy.is_satisfiable() {
                return Err(ExecutionError::UnsatisfiablePolicy {
                    threshold: policy.threshold(),
                    total_weight: policy.total_weight(),
                });
            }
            custody.bump_config_version();
            None
        } else {
            Some(Authorization {
                wallet: custody.wallet().clone(),
                proposal_id: *proposal.id(),
                height,
                effect: proposal.payload().clone(),
            })
        };

        custody.touch(height);
        Ok(authorization)
    }
}
