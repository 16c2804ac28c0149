// Proposal module - proposal records and their lifecycle

mod model;
mod registry;

pub use model::{Proposal, ProposalId, ProposalIdError, ProposalStatus};
pub use registry::{ProposalRegistry, RegistryError};
