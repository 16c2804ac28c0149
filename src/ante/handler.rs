// Ante handler - authenticates a signed transaction before it reaches the module

use crate::ante::{Ed25519Verifier, SignatureVerifier};
use crate::identity::ParticipantId;
use crate::msg::{CodecError, Command, MsgValidator, SignedTx, TxCodec, ValidationError};
use thiserror::Error;

/// Errors that can occur when authenticating a transaction
#[derive(Error, Debug)]
pub enum AnteError {
    #[error("Invalid signature: signature does not match the message content")]
    InvalidSignature,

    #[error("Signer mismatch: key belongs to {signer}, message is from {sender}")]
    SignerMismatch {
        signer: ParticipantId,
        sender: ParticipantId,
    },

    #[error("Malformed message: {0}")]
    Malformed(#[from] ValidationError),

    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),
}

pub struct AnteHandler<V = Ed25519Verifier> {
    verifier: V,
}

impl<V: SignatureVerifier> AnteHandler<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Authenticate a signed transaction and decode its command
    ///
    /// The signature must cover the encoded message, and the key's address
    /// must be the proposal creator or the voter named in the message.
    pub fn check(&self, tx: &SignedTx) -> Result<Command, AnteError> {
        let sign_bytes = TxCodec::encode(tx.msg())?;
        if !self
            .verifier
            .verify(tx.public_key(), &sign_bytes, tx.signature())
        {
            return Err(AnteError::InvalidSignature);
        }

        let cmd = MsgValidator::validate(tx.msg())?;

        let signer = ParticipantId::from_public_key(tx.public_key());
        if &signer != cmd.signer() {
            return Err(AnteError::SignerMismatch {
                signer,
                sender: cmd.signer().clone(),
            });
        }

        Ok(cmd)
    }
}

impl Default for AnteHandler<Ed25519Verifier> {
    fn default() -> Self {
        Self::new(Ed25519Verifier)
    }
}
