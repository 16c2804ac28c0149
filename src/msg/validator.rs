use crate::identity::{AddressError, ParticipantId, WalletId};
use crate::msg::{
    CastVote, CodecError, Command, CreateProposal, Decision, Effect, EffectDescriptor,
    EffectError, MsgCreateProposal, MsgKind, MsgVote, TxCodec, TxMessage,
};
use crate::proposal::ProposalId;
use thiserror::Error;

/// Most parameters a single effect may carry
pub const MAX_EFFECT_PARAMS: usize = 32;

/// Longest parameter key or value
pub const MAX_PARAM_LEN: usize = 256;

/// Errors that make a message malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown message type '{0}'")]
    UnknownMessageType(String),

    #[error("Undecodable message body: {0}")]
    Decode(#[from] CodecError),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid {field}: {source}")]
    InvalidAddress {
        field: &'static str,
        source: AddressError,
    },

    #[error("Invalid proposal id: {0}")]
    InvalidProposalId(String),

    #[error("Invalid vote decision '{0}': expected 'approve' or 'reject'")]
    InvalidDecision(String),

    #[error("Invalid effect payload: {0}")]
    InvalidEffect(#[from] EffectError),

    #[error("Too many effect parameters: {count} (max {max})")]
    TooManyParams { count: usize, max: usize },

    #[error("Effect parameter '{0}' exceeds the length limit")]
    ParamTooLong(String),
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

fn wallet(value: &str) -> Result<WalletId, ValidationError> {
    WalletId::parse(required("wallet", value)?).map_err(|source| {
        ValidationError::InvalidAddress {
            field: "wallet",
            source,
        }
    })
}

fn participant(field: &'static str, value: &str) -> Result<ParticipantId, ValidationError> {
    ParticipantId::parse(required(field, value)?)
        .map_err(|source| ValidationError::InvalidAddress { field, source })
}

/// Stateless well-formedness checks for custody messages
///
/// Signatures are the runtime's ante step and state lookups belong to the
/// handlers; nothing here touches state.
pub struct MsgValidator;

impl MsgValidator {
    /// Decode and check a raw message, producing a typed command
    pub fn validate(msg: &TxMessage) -> Result<Command, ValidationError> {
        let kind = MsgKind::from_type_url(msg.type_url())
            .ok_or_else(|| ValidationError::UnknownMessageType(msg.type_url().to_string()))?;

        match kind {
            MsgKind::CreateProposal => {
                let body = TxCodec::unpack_create_proposal(msg)?;
                Self::validate_create_proposal(&body).map(Command::CreateProposal)
            }
            MsgKind::Vote => {
                let body = TxCodec::unpack_vote(msg)?;
                Self::validate_vote(&body).map(Command::Vote)
            }
        }
    }

    /// Check a create-proposal body
    ///
    /// This performs:
    /// - Wallet and creator presence and shape
    /// - Expiry height presence
    /// - Parameter count and size limits
    /// - Effect tag recognition and parameter parsing
    pub fn validate_create_proposal(
        body: &MsgCreateProposal,
    ) -> Result<CreateProposal, ValidationError> {
        let wallet = wallet(&body.wallet)?;
        let creator = participant("creator", &body.creator)?;
        required("kind", &body.kind)?;

        if body.expiry_height == 0 {
            return Err(ValidationError::MissingField("expiry_height"));
        }

        if body.params.len() > MAX_EFFECT_PARAMS {
            return Err(ValidationError::TooManyParams {
                count: body.params.len(),
                max: MAX_EFFECT_PARAMS,
            });
        }
        if let Some((key, _)) = body
            .params
            .iter()
            .find(|(k, v)| k.len() > MAX_PARAM_LEN || v.len() > MAX_PARAM_LEN)
        {
            return Err(ValidationError::ParamTooLong(key.clone()));
        }

        let payload = EffectDescriptor {
            kind: body.kind.clone(),
            params: body.params.clone(),
        };
        Effect::parse(&payload)?;

        Ok(CreateProposal {
            wallet,
            creator,
            payload,
            expiry_height: body.expiry_height,
        })
    }

    /// Check a vote body
    pub fn validate_vote(body: &MsgVote) -> Result<CastVote, ValidationError> {
        let proposal_id = ProposalId::from_hex(required("proposal_id", &body.proposal_id)?)
            .map_err(|e| ValidationError::InvalidProposalId(e.0))?;
        let voter = participant("voter", &body.voter)?;
        let decision = Decision::parse(required("decision", &body.decision)?)
            .ok_or_else(|| ValidationError::InvalidDecision(body.decision.clone()))?;

        Ok(CastVote {
            proposal_id,
            voter,
            decision,
        })
    }
}
