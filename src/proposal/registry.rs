// Proposal Registry - proposal id -> proposal record
//
// Owns the proposal lifecycle. Creation snapshots the wallet's policy and
// configuration version; status changes only move forward.

use crate::custody::CustodyStore;
use crate::identity::{ParticipantId, WalletId};
use crate::module::{Context, Event};
use crate::msg::CreateProposal;
use crate::proposal::{Proposal, ProposalId, ProposalStatus};
use crate::storage::{decode_record, encode_record, keys, KvRead, StoreError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown wallet: {0}")]
    UnknownWallet(WalletId),

    #[error("{participant} is not a participant of wallet {wallet}")]
    NotAParticipant {
        wallet: WalletId,
        participant: ParticipantId,
    },

    #[error("Expiry height {expiry} must be above current height {height}")]
    InvalidExpiry { expiry: u64, height: u64 },

    #[error("Expiry height {expiry} is more than {max_window} blocks past height {height}")]
    ExpiryTooFar {
        expiry: u64,
        height: u64,
        max_window: u64,
    },

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct ProposalRegistry;

impl ProposalRegistry {
    /// Register a new pending proposal against a shared wallet
    pub fn create(ctx: &mut Context<'_>, cmd: &CreateProposal) -> Result<ProposalId, RegistryError> {
        let height = ctx.height();

        let mut custody = CustodyStore::get(ctx.store(), &cmd.wallet)?
            .ok_or_else(|| RegistryError::UnknownWallet(cmd.wallet.clone()))?;

        if !custody.is_participant(&cmd.creator) {
            return Err(RegistryError::NotAParticipant {
                wallet: cmd.wallet.clone(),
                participant: cmd.creator.clone(),
            });
        }

        if cmd.expiry_height <= height {
            return Err(RegistryError::InvalidExpiry {
                expiry: cmd.expiry_height,
                height,
            });
        }

        let max_window = ctx.params().max_expiry_window;
        if max_window > 0 && cmd.expiry_height - height > max_window {
            return Err(RegistryError::ExpiryTooFar {
                expiry: cmd.expiry_height,
                height,
                max_window,
            });
        }

        let sequence = custody.take_sequence();
        let id = ProposalId::derive(&cmd.wallet, &cmd.creator, sequence);

        let proposal = Proposal::new(
            id,
            cmd.wallet.clone(),
            cmd.creator.clone(),
            cmd.payload.clone(),
            sequence,
            height,
            cmd.expiry_height,
            custody.policy().clone(),
            custody.config_version(),
        );

        custody.touch(height);
        CustodyStore::save(ctx.store_mut(), &custody)?;
        Self::save(ctx, &proposal)?;
        ctx.store_mut().set(
            keys::pending_key(cmd.wallet.as_str(), id.as_bytes()),
            Vec::new(),
        );

        info!(
            proposal = %id,
            wallet = %cmd.wallet,
            creator = %cmd.creator,
            kind = %cmd.payload.kind,
            sequence,
            expiry_height = cmd.expiry_height,
            "Proposal created"
        );

        ctx.emit(Event::ProposalCreated {
            id,
            wallet: cmd.wallet.clone(),
            creator: cmd.creator.clone(),
            expiry_height: cmd.expiry_height,
        });

        Ok(id)
    }

    pub fn get<R: KvRead + ?Sized>(kv: &R, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        match kv.get(&keys::proposal_key(id.as_bytes()))? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Like `get`, but a missing proposal is an error
    pub fn require<R: KvRead + ?Sized>(kv: &R, id: &ProposalId) -> Result<Proposal, RegistryError> {
        Self::get(kv, id)?.ok_or(RegistryError::ProposalNotFound(*id))
    }

    /// Proposals of a wallet still open for voting at `height`, in id order
    ///
    /// Expiry is applied lazily, so the index can still hold proposals whose
    /// deadline passed without anyone touching them; those are filtered out.
    pub fn pending_for_wallet<R: KvRead + ?Sized>(
        kv: &R,
        wallet: &WalletId,
        height: u64,
    ) -> Result<Vec<Proposal>, StoreError> {
        let prefix = keys::pending_prefix(wallet.as_str());
        let mut proposals = Vec::new();

        for (key, _) in kv.scan_prefix(&prefix)? {
            let raw = &key[prefix.len()..];
            let mut id = [0u8; 32];
            if raw.len() != id.len() {
                return Err(StoreError::DeserializationFailed(format!(
                    "malformed pending index entry: {} id bytes, expected {}",
                    raw.len(),
                    id.len()
                )));
            }
            id.copy_from_slice(raw);

            let proposal = Self::get(kv, &ProposalId::from_bytes(id))?.ok_or_else(|| {
                StoreError::DeserializationFailed(format!(
                    "pending index points at missing proposal {}",
                    hex::encode(id)
                ))
            })?;

            if proposal.status() == ProposalStatus::Pending && !proposal.is_expired_at(height) {
                proposals.push(proposal);
            }
        }

        Ok(proposals)
    }

    /// Every stored proposal in id order
    pub fn list<R: KvRead + ?Sized>(kv: &R) -> Result<Vec<Proposal>, StoreError> {
        kv.scan_prefix(keys::PROPOSAL_PREFIX)?
            .into_iter()
            .map(|(_, bytes)| decode_record(&bytes))
            .collect()
    }

    /// Move a proposal to a new status
    ///
    /// Only forward transitions are accepted. Leaving Pending drops the
    /// proposal from its wallet's pending index.
    pub(crate) fn set_status(
        ctx: &mut Context<'_>,
        id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<Proposal, RegistryError> {
        let mut proposal = Self::require(ctx.store(), id)?;
        let from = proposal.status();

        if !from.can_transition_to(status) {
            return Err(RegistryError::InvalidStatusTransition { from, to: status });
        }

        proposal.set_status(status, ctx.height());
        Self::save(ctx, &proposal)?;

        if from == ProposalStatus::Pending {
            ctx.store_mut()
                .delete(keys::pending_key(proposal.wallet().as_str(), id.as_bytes()));
        }

        debug!(proposal = %id, from = %from, to = %status, "Proposal status changed");

        Ok(proposal)
    }

    fn save(ctx: &mut Context<'_>, proposal: &Proposal) -> Result<(), StoreError> {
        ctx.store_mut().set(
            keys::proposal_key(proposal.id().as_bytes()),
            encode_record(proposal)?,
        );
        Ok(())
    }
}
