// custody - shared wallet custody for a replicated ledger node
//
// Proposals to change custody of, or spend from, a shared wallet are
// executed only once enough registered participants approve them. Every
// state transition is deterministic so all nodes replaying the same
// transactions agree bit for bit.

pub mod ante;
pub mod approval;
pub mod custody;
pub mod executor;
pub mod identity;
pub mod module;
pub mod msg;
pub mod proposal;
pub mod quorum;
pub mod storage;

pub use module::{AppModule, CustodyModule, TxReceipt};
