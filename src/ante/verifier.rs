use crate::identity::{PublicKey, Signature, Signer};

/// Signature verification supplied by the host
pub trait SignatureVerifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

/// Ed25519 over the encoded transaction message
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        Signer::verify(public_key, message, signature)
    }
}
