// Custody module - who controls a shared wallet and under what policy

mod record;
mod store;

pub use record::{Authorization, CustodyRecord};
pub use store::CustodyStore;
