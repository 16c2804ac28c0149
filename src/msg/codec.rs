use crate::msg::{Command, MsgCreateProposal, MsgKind, MsgVote, SignedTx, TxMessage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode message: {0}")]
    EncodeError(String),

    #[error("Failed to decode message: {0}")]
    DecodeError(String),

    #[error("Trailing bytes after message: {0}")]
    TrailingBytes(usize),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Strict postcard decode: leftover input is an error so that one message
/// has exactly one encoding
fn decode_exact<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (value, rest) =
        postcard::take_from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()));
    }
    Ok(value)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(|e| CodecError::EncodeError(e.to_string()))
}

/// Codec for custody transaction messages
pub struct TxCodec;

impl TxCodec {
    /// Encode a message envelope to binary bytes (postcard)
    pub fn encode(msg: &TxMessage) -> Result<Vec<u8>, CodecError> {
        encode(msg)
    }

    /// Decode a message envelope from binary bytes
    pub fn decode(bytes: &[u8]) -> Result<TxMessage, CodecError> {
        decode_exact(bytes)
    }

    /// Wrap a create-proposal body in its envelope
    pub fn pack_create_proposal(body: &MsgCreateProposal) -> Result<TxMessage, CodecError> {
        Ok(TxMessage::new(MsgKind::CreateProposal.type_url(), encode(body)?))
    }

    /// Wrap a vote body in its envelope
    pub fn pack_vote(body: &MsgVote) -> Result<TxMessage, CodecError> {
        Ok(TxMessage::new(MsgKind::Vote.type_url(), encode(body)?))
    }

    /// Wrap an already-typed command back into its wire form
    pub fn pack(cmd: &Command) -> Result<TxMessage, CodecError> {
        match cmd {
            Command::CreateProposal(c) => Self::pack_create_proposal(&MsgCreateProposal::from(c)),
            Command::Vote(v) => Self::pack_vote(&MsgVote::from(v)),
        }
    }

    pub fn unpack_create_proposal(msg: &TxMessage) -> Result<MsgCreateProposal, CodecError> {
        decode_exact(msg.value())
    }

    pub fn unpack_vote(msg: &TxMessage) -> Result<MsgVote, CodecError> {
        decode_exact(msg.value())
    }

    /// Encode a signed transaction
    pub fn encode_signed(tx: &SignedTx) -> Result<Vec<u8>, CodecError> {
        encode(tx)
    }

    /// Decode a signed transaction
    pub fn decode_signed(bytes: &[u8]) -> Result<SignedTx, CodecError> {
        decode_exact(bytes)
    }

    /// Encode a signed transaction to hex
    pub fn encode_signed_hex(tx: &SignedTx) -> Result<String, CodecError> {
        Ok(hex::encode(Self::encode_signed(tx)?))
    }

    /// Decode a signed transaction from hex
    pub fn decode_signed_hex(hex_str: &str) -> Result<SignedTx, CodecError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode_signed(&bytes)
    }

    /// Encode a message envelope to base64 (URL-safe, no padding)
    pub fn encode_base64(msg: &TxMessage) -> Result<String, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        Ok(URL_SAFE_NO_PAD.encode(Self::encode(msg)?))
    }

    /// Decode a message envelope from base64
    pub fn decode_base64(b64_str: &str) -> Result<TxMessage, CodecError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str.trim())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}
