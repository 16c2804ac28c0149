// Identity module - signer keys and the addresses derived from them

mod address;
mod keypair;
mod signer;

pub use address::*;
pub use keypair::*;
pub use signer::*;
