// Approval module - one vote per participant per proposal

mod ledger;
mod vote;

pub use ledger::{ApprovalLedger, LedgerError};
pub use vote::{ApprovalVote, VoteOutcome};
