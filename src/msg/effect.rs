// Effect payloads - what an approved proposal does to a wallet
//
// Proposals store the descriptor verbatim. The typed view is produced on
// demand: by the validator to reject unusable payloads early, and by the
// executor when the proposal is finally applied.

use crate::identity::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Denomination used when a `send` does not name one
pub const DEFAULT_DENOM: &str = "upaxi";

pub const KIND_ADD_PARTICIPANT: &str = "add_participant";
pub const KIND_REMOVE_PARTICIPANT: &str = "remove_participant";
pub const KIND_CHANGE_THRESHOLD: &str = "change_threshold";
pub const KIND_SET_WEIGHT: &str = "set_weight";
pub const KIND_SEND: &str = "send";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("Unrecognized effect kind '{0}'")]
    UnknownKind(String),

    #[error("Effect '{kind}' requires parameter '{param}'")]
    MissingParam { kind: String, param: &'static str },

    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParam { param: String, reason: String },

    #[error("Effect '{kind}' does not accept parameter '{param}'")]
    UnexpectedParam { kind: String, param: String },
}

/// Wire/storage form of a proposal payload: a type tag plus string parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl EffectDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn add_participant(participant: &ParticipantId, weight: u64) -> Self {
        Self::new(KIND_ADD_PARTICIPANT)
            .with_param("participant", participant.as_str())
            .with_param("weight", weight.to_string())
    }

    pub fn remove_participant(participant: &ParticipantId) -> Self {
        Self::new(KIND_REMOVE_PARTICIPANT).with_param("participant", participant.as_str())
    }

    pub fn change_threshold(threshold: u64) -> Self {
        Self::new(KIND_CHANGE_THRESHOLD).with_param("threshold", threshold.to_string())
    }

    pub fn send(recipient: &str, denom: &str, amount: u64) -> Self {
        Self::new(KIND_SEND)
            .with_param("recipient", recipient)
            .with_param("denom", denom)
            .with_param("amount", amount.to_string())
    }
}

/// Token and liquidity operations carried out by an external relayer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractAction {
    SendToken,
    DeployToken,
    MintToken,
    BurnToken,
    AddLiquidity,
    RemoveLiquidity,
    UpdateMetadata,
    RenounceMinter,
}

impl ContractAction {
    pub const ALL: [ContractAction; 8] = [
        ContractAction::SendToken,
        ContractAction::DeployToken,
        ContractAction::MintToken,
        ContractAction::BurnToken,
        ContractAction::AddLiquidity,
        ContractAction::RemoveLiquidity,
        ContractAction::UpdateMetadata,
        ContractAction::RenounceMinter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractAction::SendToken => "send_token",
            ContractAction::DeployToken => "deploy_token",
            ContractAction::MintToken => "mint_token",
            ContractAction::BurnToken => "burn_token",
            ContractAction::AddLiquidity => "add_liquidity",
            ContractAction::RemoveLiquidity => "remove_liquidity",
            ContractAction::UpdateMetadata => "update_metadata",
            ContractAction::RenounceMinter => "renounce_minter",
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == kind)
    }

    /// Every action except deployment targets an existing contract
    pub fn requires_contract(&self) -> bool {
        !matches!(self, ContractAction::DeployToken)
    }
}

impl fmt::Display for ContractAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed interpretation of an `EffectDescriptor`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    AddParticipant {
        participant: ParticipantId,
        weight: u64,
    },
    RemoveParticipant {
        participant: ParticipantId,
    },
    ChangeThreshold {
        threshold: u64,
    },
    SetWeight {
        participant: ParticipantId,
        weight: u64,
    },
    Send {
        recipient: String,
        denom: String,
        amount: u64,
        memo: Option<String>,
    },
    Contract {
        action: ContractAction,
        contract: Option<String>,
        params: BTreeMap<String, String>,
    },
}

struct ParamReader<'a> {
    kind: &'a str,
    params: &'a BTreeMap<String, String>,
}

impl<'a> ParamReader<'a> {
    fn only(&self, allowed: &[&str]) -> Result<(), EffectError> {
        match self.params.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(extra) => Err(EffectError::UnexpectedParam {
                kind: self.kind.to_string(),
                param: extra.clone(),
            }),
            None => Ok(()),
        }
    }

    fn optional(&self, param: &str) -> Option<&'a str> {
        self.params.get(param).map(String::as_str)
    }

    fn required(&self, param: &'static str) -> Result<&'a str, EffectError> {
        match self.optional(param) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(EffectError::MissingParam {
                kind: self.kind.to_string(),
                param,
            }),
        }
    }

    fn participant(&self, param: &'static str) -> Result<ParticipantId, EffectError> {
        ParticipantId::parse(self.required(param)?).map_err(|e| EffectError::InvalidParam {
            param: param.to_string(),
            reason: e.to_string(),
        })
    }

    fn positive(&self, param: &'static str, value: &str) -> Result<u64, EffectError> {
        let invalid = |reason: String| EffectError::InvalidParam {
            param: param.to_string(),
            reason,
        };
        let n: u64 = value.parse().map_err(|_| invalid(format!("'{}' is not a number", value)))?;
        if n == 0 {
            return Err(invalid("must be greater than zero".to_string()));
        }
        Ok(n)
    }
}

impl Effect {
    /// Interpret a descriptor, checking its parameters
    pub fn parse(descriptor: &EffectDescriptor) -> Result<Self, EffectError> {
        let p = ParamReader {
            kind: &descriptor.kind,
            params: &descriptor.params,
        };

        match descriptor.kind.as_str() {
            KIND_ADD_PARTICIPANT => {
                p.only(&["participant", "weight"])?;
                let weight = match p.optional("weight") {
                    Some(w) => p.positive("weight", w)?,
                    None => 1,
                };
                Ok(Effect::AddParticipant {
                    participant: p.participant("participant")?,
                    weight,
                })
            }
            KIND_REMOVE_PARTICIPANT => {
                p.only(&["participant"])?;
                Ok(Effect::RemoveParticipant {
                    participant: p.participant("participant")?,
                })
            }
            KIND_CHANGE_THRESHOLD => {
                p.only(&["threshold"])?;
                let threshold = p.positive("threshold", p.required("threshold")?)?;
                Ok(Effect::ChangeThreshold { threshold })
            }
            KIND_SET_WEIGHT => {
                p.only(&["participant", "weight"])?;
                Ok(Effect::SetWeight {
                    participant: p.participant("participant")?,
                    weight: p.positive("weight", p.required("weight")?)?,
                })
            }
            KIND_SEND => {
                p.only(&["recipient", "amount", "denom", "memo"])?;
                Ok(Effect::Send {
                    recipient: p.required("recipient")?.to_string(),
                    denom: p.optional("denom").unwrap_or(DEFAULT_DENOM).to_string(),
                    amount: p.positive("amount", p.required("amount")?)?,
                    memo: p.optional("memo").map(str::to_string),
                })
            }
            other => {
                let action = ContractAction::from_kind(other)
                    .ok_or_else(|| EffectError::UnknownKind(other.to_string()))?;
                let contract = if action.requires_contract() {
                    Some(p.required("contract")?.to_string())
                } else {
                    p.optional("contract").map(str::to_string)
                };
                let params = descriptor
                    .params
                    .iter()
                    .filter(|(k, _)| k.as_str() != "contract")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok(Effect::Contract {
                    action,
                    contract,
                    params,
                })
            }
        }
    }

    /// Structural effects change who votes or how much approval is needed
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Effect::AddParticipant { .. }
                | Effect::RemoveParticipant { .. }
                | Effect::ChangeThreshold { .. }
                | Effect::SetWeight { .. }
        )
    }
}
