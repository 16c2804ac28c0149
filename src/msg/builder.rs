use crate::identity::{Keypair, ParticipantId, Signer};
use crate::msg::{
    CodecError, Decision, EffectDescriptor, MsgCreateProposal, MsgVote, SignedTx, TxCodec,
    TxMessage,
};
use crate::proposal::ProposalId;
use thiserror::Error;

/// Errors that can occur when building a custody transaction
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing signer: signer keypair is required")]
    MissingSigner,

    #[error("Missing wallet: wallet identifier is required")]
    MissingWallet,

    #[error("Missing effect: effect descriptor is required")]
    MissingEffect,

    #[error("Missing expiry: expiry height is required")]
    MissingExpiry,

    #[error("Missing proposal: proposal id is required")]
    MissingProposal,

    #[error("Missing decision: approve or reject is required")]
    MissingDecision,

    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),
}

fn sign(keypair: &Keypair, msg: TxMessage) -> Result<SignedTx, BuildError> {
    let sign_bytes = TxCodec::encode(&msg)?;
    let signature = Signer::sign(keypair, &sign_bytes);
    Ok(SignedTx::from_parts(msg, keypair.public_key(), signature))
}

/// Builder for signed create-proposal transactions
///
/// The creator is always the address of the signing key.
pub struct ProposalBuilder<'a> {
    signer: Option<&'a Keypair>,
    wallet: Option<String>,
    effect: Option<EffectDescriptor>,
    expiry_height: Option<u64>,
}

impl<'a> ProposalBuilder<'a> {
    pub fn new() -> Self {
        Self {
            signer: None,
            wallet: None,
            effect: None,
            expiry_height: None,
        }
    }

    /// Set the signing participant (required)
    pub fn signer(mut self, keypair: &'a Keypair) -> Self {
        self.signer = Some(keypair);
        self
    }

    /// Set the wallet (required)
    pub fn wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = Some(wallet.into());
        self
    }

    /// Set the proposed effect (required)
    pub fn effect(mut self, effect: EffectDescriptor) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Set the expiry height (required)
    pub fn expiry_height(mut self, height: u64) -> Self {
        self.expiry_height = Some(height);
        self
    }

    /// Build and sign the transaction
    pub fn build(self) -> Result<SignedTx, BuildError> {
        let keypair = self.signer.ok_or(BuildError::MissingSigner)?;
        let wallet = self.wallet.ok_or(BuildError::MissingWallet)?;
        let effect = self.effect.ok_or(BuildError::MissingEffect)?;
        let expiry_height = self.expiry_height.ok_or(BuildError::MissingExpiry)?;

        let body = MsgCreateProposal {
            wallet,
            creator: ParticipantId::from_public_key(&keypair.public_key()).to_string(),
            kind: effect.kind,
            params: effect.params,
            expiry_height,
        };
        sign(keypair, TxCodec::pack_create_proposal(&body)?)
    }
}

impl<'a> Default for ProposalBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for signed vote transactions
pub struct VoteBuilder<'a> {
    signer: Option<&'a Keypair>,
    proposal_id: Option<ProposalId>,
    decision: Option<Decision>,
}

impl<'a> VoteBuilder<'a> {
    pub fn new() -> Self {
        Self {
            signer: None,
            proposal_id: None,
            decision: None,
        }
    }

    /// Set the voting participant (required)
    pub fn signer(mut self, keypair: &'a Keypair) -> Self {
        self.signer = Some(keypair);
        self
    }

    /// Set the proposal being voted on (required)
    pub fn proposal(mut self, id: ProposalId) -> Self {
        self.proposal_id = Some(id);
        self
    }

    /// Set the decision (required)
    pub fn decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn build(self) -> Result<SignedTx, BuildError> {
        let keypair = self.signer.ok_or(BuildError::MissingSigner)?;
        let proposal_id = self.proposal_id.ok_or(BuildError::MissingProposal)?;
        let decision = self.decision.ok_or(BuildError::MissingDecision)?;

        let body = MsgVote {
            proposal_id: proposal_id.to_hex(),
            voter: ParticipantId::from_public_key(&keypair.public_key()).to_string(),
            decision: decision.as_str().to_string(),
        };
        sign(keypair, TxCodec::pack_vote(&body)?)
    }
}

impl<'a> Default for VoteBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}
