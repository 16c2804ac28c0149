// Module layer - transaction context, dispatch, keeper, queries and genesis

mod context;
mod dispatch;
mod error;
mod events;
mod genesis;
mod keeper;
mod query;

pub use context::Context;
pub use dispatch::{dispatch, handler_for, Handler, TxOutcome};
pub use error::*;
pub use events::{Event, RejectReason};
pub use genesis::{
    export_genesis, init_genesis, ExportedState, GenesisError, GenesisParticipant, GenesisState,
    GenesisWallet, Params,
};
pub use keeper::{AppModule, CustodyModule, DeliverResult, TxReceipt};
pub use query::{CustodyQuery, TallyResponse};
