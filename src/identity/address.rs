// Addresses - wallet and participant identifiers
//
// Both are opaque strings to the custody core. Participants are normally
// derived from an Ed25519 public key, wallets are named at genesis.

use crate::identity::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Longest identifier accepted anywhere in the module
pub const MAX_ID_LEN: usize = 128;

/// Number of hash bytes kept when deriving a participant address
const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Identifier too long: {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("Identifier contains invalid character {0:?}")]
    InvalidCharacter(char),
}

fn check_identifier(s: &str) -> Result<(), AddressError> {
    if s.is_empty() {
        return Err(AddressError::Empty);
    }
    if s.len() > MAX_ID_LEN {
        return Err(AddressError::TooLong {
            len: s.len(),
            max: MAX_ID_LEN,
        });
    }
    if let Some(c) = s.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(AddressError::InvalidCharacter(c));
    }
    Ok(())
}

/// Identifier of a shared wallet
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct WalletId(String);

impl WalletId {
    /// Parse and check a wallet identifier
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        Self::try_from(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WalletId {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        check_identifier(&s)?;
        Ok(Self(s))
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a custody participant (public-key-derived address)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Derive the address of a public key: base58(sha256("participant:" || key)[..20])
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"participant:");
        hasher.update(public_key.as_bytes());
        let digest = hasher.finalize();
        Self(bs58::encode(&digest[..ADDRESS_LEN]).into_string())
    }

    /// Parse and check a participant identifier
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        Self::try_from(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        check_identifier(&s)?;
        Ok(Self(s))
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
