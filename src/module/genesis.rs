// Genesis - module params and the wallets that start out under shared custody
//
// Custody sharing is first established here. Everything after genesis goes
// through proposals.

use crate::approval::ApprovalVote;
use crate::custody::{Authorization, CustodyRecord, CustodyStore};
use crate::identity::{ParticipantId, WalletId};
use crate::proposal::{Proposal, ProposalRegistry};
use crate::quorum::QuorumPolicy;
use crate::storage::{
    decode_record, encode_record, keys, KvRead, KvStore, StoreError, TxCache,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum GenesisError {
    #[error("Failed to read genesis file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid genesis JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store already initialized")]
    AlreadyInitialized,

    #[error("Duplicate wallet in genesis: {0}")]
    DuplicateWallet(WalletId),

    #[error("Wallet {wallet} lists participant {participant} twice")]
    DuplicateParticipant {
        wallet: WalletId,
        participant: ParticipantId,
    },

    #[error("Wallet {0} has no participants")]
    EmptyParticipants(WalletId),

    #[error("Wallet {wallet} gives participant {participant} zero weight")]
    ZeroWeight {
        wallet: WalletId,
        participant: ParticipantId,
    },

    #[error("Wallet {0} has a zero threshold")]
    ZeroThreshold(WalletId),

    #[error("Wallet {wallet} threshold {threshold} exceeds total weight {total_weight}")]
    ThresholdTooHigh {
        wallet: WalletId,
        threshold: u64,
        total_weight: u64,
    },

    #[error("Wallet {wallet} has {count} participants, limit is {max}")]
    TooManyParticipants {
        wallet: WalletId,
        count: usize,
        max: usize,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Module parameters, fixed at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Furthest a proposal's expiry may lie past its creation height (0 = no limit)
    pub max_expiry_window: u64,
    /// Largest participant set a wallet may grow to (0 = no limit)
    pub max_participants: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_expiry_window: 0,
            max_participants: 64,
        }
    }
}

impl Params {
    /// Params stored at genesis, or the defaults on an uninitialized store
    pub fn load<R: KvRead + ?Sized>(kv: &R) -> Result<Self, StoreError> {
        match kv.get(keys::PARAMS)? {
            Some(bytes) => decode_record(&bytes),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParticipant {
    pub id: ParticipantId,
    #[serde(default = "default_weight")]
    pub weight: u64,
}

fn default_weight() -> u64 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisWallet {
    pub wallet: WalletId,
    pub threshold: u64,
    pub participants: Vec<GenesisParticipant>,
    #[serde(default)]
    pub balances: BTreeMap<String, u64>,
}

impl GenesisWallet {
    /// Equal-weight wallet, mostly for tests and the CLI
    pub fn unweighted<I>(wallet: WalletId, threshold: u64, participants: I) -> Self
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        Self {
            wallet,
            threshold,
            participants: participants
                .into_iter()
                .map(|id| GenesisParticipant { id, weight: 1 })
                .collect(),
            balances: BTreeMap::new(),
        }
    }

    pub fn with_balance(mut self, denom: impl Into<String>, amount: u64) -> Self {
        self.balances.insert(denom.into(), amount);
        self
    }

    fn validate(&self, params: &Params) -> Result<QuorumPolicy, GenesisError> {
        if self.participants.is_empty() {
            return Err(GenesisError::EmptyParticipants(self.wallet.clone()));
        }
        if params.max_participants > 0 && self.participants.len() > params.max_participants {
            return Err(GenesisError::TooManyParticipants {
                wallet: self.wallet.clone(),
                count: self.participants.len(),
                max: params.max_participants,
            });
        }

        let mut weights = BTreeMap::new();
        for p in &self.participants {
            if p.weight == 0 {
                return Err(GenesisError::ZeroWeight {
                    wallet: self.wallet.clone(),
                    participant: p.id.clone(),
                });
            }
            if weights.insert(p.id.clone(), p.weight).is_some() {
                return Err(GenesisError::DuplicateParticipant {
                    wallet: self.wallet.clone(),
                    participant: p.id.clone(),
                });
            }
        }

        let policy = QuorumPolicy::new(self.threshold, weights);
        if self.threshold == 0 {
            return Err(GenesisError::ZeroThreshold(self.wallet.clone()));
        }
        if self.threshold > policy.total_weight() {
            return Err(GenesisError::ThresholdTooHigh {
                wallet: self.wallet.clone(),
                threshold: self.threshold,
                total_weight: policy.total_weight(),
            });
        }
        Ok(policy)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub wallets: Vec<GenesisWallet>,
}

impl GenesisState {
    pub fn from_json(json: &str) -> Result<Self, GenesisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GenesisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, GenesisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Establish params and custody records on an empty store
///
/// All wallets are validated before anything is written; the records land in
/// one batch.
pub fn init_genesis<S: KvStore>(
    store: &mut S,
    genesis: &GenesisState,
    height: u64,
) -> Result<(), GenesisError> {
    if store.get(keys::PARAMS)?.is_some() {
        return Err(GenesisError::AlreadyInitialized);
    }

    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(genesis.wallets.len());
    for wallet in &genesis.wallets {
        if !seen.insert(wallet.wallet.clone()) {
            return Err(GenesisError::DuplicateWallet(wallet.wallet.clone()));
        }
        let policy = wallet.validate(&genesis.params)?;
        records.push(CustodyRecord::new(
            wallet.wallet.clone(),
            policy,
            wallet.balances.clone(),
            height,
        ));
    }

    let batch = {
        let mut cache = TxCache::new(&*store);
        cache.set(keys::PARAMS.to_vec(), encode_record(&genesis.params)?);
        for record in &records {
            CustodyStore::save(&mut cache, record)?;
        }
        cache.into_batch()
    };
    store.apply_batch(batch)?;

    info!(
        wallets = records.len(),
        max_expiry_window = genesis.params.max_expiry_window,
        max_participants = genesis.params.max_participants,
        "Genesis initialized"
    );

    Ok(())
}

/// Full module state, for snapshots and replay comparison
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportedState {
    pub params: Params,
    pub custody: Vec<CustodyRecord>,
    pub proposals: Vec<Proposal>,
    pub votes: Vec<ApprovalVote>,
    pub authorizations: Vec<Authorization>,
}

pub fn export_genesis<R: KvRead + ?Sized>(kv: &R) -> Result<ExportedState, StoreError> {
    let votes = kv
        .scan_prefix(keys::VOTE_PREFIX)?
        .into_iter()
        .map(|(_, bytes)| decode_record(&bytes))
        .collect::<Result<Vec<ApprovalVote>, _>>()?;

    Ok(ExportedState {
        params: Params::load(kv)?,
        custody: CustodyStore::list(kv)?,
        proposals: ProposalRegistry::list(kv)?,
        votes,
        authorizations: CustodyStore::all_authorizations(kv)?,
    })
}
