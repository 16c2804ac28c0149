// Ante module - signature and signer checks ahead of delivery

mod handler;
mod verifier;

pub use handler::{AnteError, AnteHandler};
pub use verifier::{Ed25519Verifier, SignatureVerifier};
