// Module errors - one classification for everything a handler can return
//
// The keeper decides what to do with a failed transaction from `kind()`
// alone: malformed and precondition failures discard the transaction's
// writes, lifecycle outcomes commit them as a successful outcome, invariant
// and storage failures stop the host.

use crate::approval::LedgerError;
use crate::executor::ExecutionError;
use crate::module::TxOutcome;
use crate::msg::ValidationError;
use crate::proposal::RegistryError;
use crate::storage::StoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before state was touched
    Malformed,
    /// Transaction failure, nothing committed
    Precondition,
    /// Reported through events, state changes committed
    Lifecycle,
    /// Internal consistency broken; the host must stop
    Invariant,
    /// The backing store failed; the host must stop
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Malformed => "malformed",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Lifecycle => "lifecycle",
            ErrorKind::Invariant => "invariant",
            ErrorKind::Storage => "storage",
        };
        f.write_str(s)
    }
}

// Stable result codes reported in failed receipts
pub const CODE_MALFORMED: u32 = 1;
pub const CODE_UNKNOWN_WALLET: u32 = 2;
pub const CODE_NOT_A_PARTICIPANT: u32 = 3;
pub const CODE_INVALID_EXPIRY: u32 = 4;
pub const CODE_PROPOSAL_NOT_FOUND: u32 = 5;
pub const CODE_PROPOSAL_NOT_PENDING: u32 = 6;
pub const CODE_PROPOSAL_EXPIRED: u32 = 7;
pub const CODE_NOT_AN_ELIGIBLE_VOTER: u32 = 8;
pub const CODE_DUPLICATE_VOTE: u32 = 9;
pub const CODE_INVARIANT: u32 = 100;
pub const CODE_STORAGE: u32 = 101;

#[derive(Error, Debug)]
pub enum ModuleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl ModuleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModuleError::Validation(_) => ErrorKind::Malformed,
            ModuleError::Registry(e) => registry_kind(e),
            ModuleError::Ledger(e) => match e {
                LedgerError::ProposalNotFound(_)
                | LedgerError::ProposalNotPending { .. }
                | LedgerError::NotAnEligibleVoter { .. }
                | LedgerError::DuplicateVote { .. } => ErrorKind::Precondition,
                LedgerError::ProposalExpired { .. } => ErrorKind::Lifecycle,
                LedgerError::Registry(e) => registry_kind(e),
                LedgerError::Store(_) => ErrorKind::Storage,
            },
            // the executor turns inapplicable effects into rejections itself,
            // so anything else escaping it is an internal failure
            ModuleError::Execution(e) => match e {
                ExecutionError::Registry(e) => registry_kind(e),
                ExecutionError::Store(_) => ErrorKind::Storage,
                _ => ErrorKind::Invariant,
            },
            ModuleError::Store(_) => ErrorKind::Storage,
            ModuleError::Invariant(_) => ErrorKind::Invariant,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            ModuleError::Validation(_) => CODE_MALFORMED,
            ModuleError::Registry(e) | ModuleError::Ledger(LedgerError::Registry(e)) => {
                registry_code(e)
            }
            ModuleError::Ledger(e) => match e {
                LedgerError::ProposalNotFound(_) => CODE_PROPOSAL_NOT_FOUND,
                LedgerError::ProposalNotPending { .. } => CODE_PROPOSAL_NOT_PENDING,
                LedgerError::ProposalExpired { .. } => CODE_PROPOSAL_EXPIRED,
                LedgerError::NotAnEligibleVoter { .. } => CODE_NOT_AN_ELIGIBLE_VOTER,
                LedgerError::DuplicateVote { .. } => CODE_DUPLICATE_VOTE,
                LedgerError::Registry(e) => registry_code(e),
                LedgerError::Store(_) => CODE_STORAGE,
            },
            ModuleError::Execution(e) => match e {
                ExecutionError::Registry(e) => registry_code(e),
                ExecutionError::Store(_) => CODE_STORAGE,
                _ => CODE_INVARIANT,
            },
            ModuleError::Store(_) => CODE_STORAGE,
            ModuleError::Invariant(_) => CODE_INVARIANT,
        }
    }

    /// The committed outcome a lifecycle error stands for
    pub fn lifecycle_outcome(&self) -> Option<TxOutcome> {
        match self {
            ModuleError::Ledger(LedgerError::ProposalExpired { id, .. }) => {
                Some(TxOutcome::Expired { proposal_id: *id })
            }
            _ => None,
        }
    }
}

fn registry_kind(err: &RegistryError) -> ErrorKind {
    match err {
        RegistryError::UnknownWallet(_)
        | RegistryError::NotAParticipant { .. }
        | RegistryError::InvalidExpiry { .. }
        | RegistryError::ExpiryTooFar { .. }
        | RegistryError::ProposalNotFound(_) => ErrorKind::Precondition,
        RegistryError::InvalidStatusTransition { .. } => ErrorKind::Invariant,
        RegistryError::Store(_) => ErrorKind::Storage,
    }
}

fn registry_code(err: &RegistryError) -> u32 {
    match err {
        RegistryError::UnknownWallet(_) => CODE_UNKNOWN_WALLET,
        RegistryError::NotAParticipant { .. } => CODE_NOT_A_PARTICIPANT,
        RegistryError::InvalidExpiry { .. } | RegistryError::ExpiryTooFar { .. } => {
            CODE_INVALID_EXPIRY
        }
        RegistryError::ProposalNotFound(_) => CODE_PROPOSAL_NOT_FOUND,
        RegistryError::InvalidStatusTransition { .. } => CODE_INVARIANT,
        RegistryError::Store(_) => CODE_STORAGE,
    }
}

/// Errors the host must stop on
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("Invariant violated (code {code}): {message}")]
    Invariant { code: u32, message: String },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for FatalError {
    fn from(err: StoreError) -> Self {
        FatalError::Storage(err.to_string())
    }
}
