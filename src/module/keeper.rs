// Custody keeper - the module surface the host calls into
//
// One call per transaction, in consensus order. Each transaction runs against
// a fresh write buffer; the buffer is committed or dropped as a whole.

use crate::module::{
    dispatch, Context, ErrorKind, Event, FatalError, ModuleError, Params, TxOutcome, CODE_INVARIANT,
};
use crate::msg::{Command, MsgValidator, TxMessage};
use crate::storage::{KvStore, StoreError};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Result of delivering one transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliverResult {
    Committed {
        #[serde(flatten)]
        outcome: TxOutcome,
    },
    Failed {
        code: u32,
        kind: ErrorKind,
        message: String,
    },
}

/// Receipt handed back to the host for every non-fatal transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub height: u64,
    pub result: DeliverResult,
    /// Events in emission order; empty when nothing was committed
    pub events: Vec<Event>,
}

impl TxReceipt {
    pub fn is_committed(&self) -> bool {
        matches!(self.result, DeliverResult::Committed { .. })
    }

    pub fn outcome(&self) -> Option<&TxOutcome> {
        match &self.result {
            DeliverResult::Committed { outcome } => Some(outcome),
            DeliverResult::Failed { .. } => None,
        }
    }

    pub fn code(&self) -> u32 {
        match &self.result {
            DeliverResult::Committed { .. } => 0,
            DeliverResult::Failed { code, .. } => *code,
        }
    }
}

/// Capability surface of an application module
pub trait AppModule {
    fn name(&self) -> &'static str;

    /// Stateless decoding and well-formedness checks
    fn validate(&self, msg: &TxMessage) -> Result<Command, ModuleError>;

    /// Execute a validated command at `height` and commit its effects
    fn deliver<S: KvStore>(
        &self,
        store: &mut S,
        height: u64,
        cmd: &Command,
    ) -> Result<TxReceipt, FatalError>;

    /// Validate then deliver a raw message
    fn deliver_msg<S: KvStore>(
        &self,
        store: &mut S,
        height: u64,
        msg: &TxMessage,
    ) -> Result<TxReceipt, FatalError> {
        match self.validate(msg) {
            Ok(cmd) => self.deliver(store, height, &cmd),
            Err(err) => {
                warn!(module = self.name(), height, error = %err, "Malformed transaction");
                Ok(failed_receipt(height, &err))
            }
        }
    }
}

pub struct CustodyModule {
    params: Params,
}

impl CustodyModule {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Build the module from the params stored at genesis
    pub fn load<S: KvStore>(store: &S) -> Result<Self, StoreError> {
        Ok(Self::new(Params::load(store)?))
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl AppModule for CustodyModule {
    fn name(&self) -> &'static str {
        "custody"
    }

    fn validate(&self, msg: &TxMessage) -> Result<Command, ModuleError> {
        Ok(MsgValidator::validate(msg)?)
    }

    fn deliver<S: KvStore>(
        &self,
        store: &mut S,
        height: u64,
        cmd: &Command,
    ) -> Result<TxReceipt, FatalError> {
        let (result, batch, events) = {
            let mut ctx = Context::new(height, &self.params, &*store);
            let result = dispatch(&mut ctx, cmd);
            let (batch, events) = ctx.finish();
            (result, batch, events)
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => match err.kind() {
                ErrorKind::Malformed | ErrorKind::Precondition => {
                    warn!(
                        height,
                        signer = %cmd.signer(),
                        code = err.code(),
                        error = %err,
                        "Transaction rejected"
                    );
                    return Ok(failed_receipt(height, &err));
                }
                ErrorKind::Lifecycle => match err.lifecycle_outcome() {
                    Some(outcome) => {
                        debug!(height, reason = %err, "Lifecycle outcome");
                        outcome
                    }
                    None => {
                        error!(height, error = %err, "Lifecycle error without an outcome");
                        return Err(FatalError::Invariant {
                            code: CODE_INVARIANT,
                            message: err.to_string(),
                        });
                    }
                },
                ErrorKind::Invariant => {
                    error!(height, code = err.code(), error = %err, "Invariant violation");
                    return Err(FatalError::Invariant {
                        code: err.code(),
                        message: err.to_string(),
                    });
                }
                ErrorKind::Storage => {
                    error!(height, error = %err, "Storage failure");
                    return Err(FatalError::Storage(err.to_string()));
                }
            },
        };

        debug!(height, writes = batch.len(), events = events.len(), "Committing transaction");
        store.apply_batch(batch)?;
        Ok(TxReceipt {
            height,
            result: DeliverResult::Committed { outcome },
            events,
        })
    }
}

fn failed_receipt(height: u64, err: &ModuleError) -> TxReceipt {
    TxReceipt {
        height,
        result: DeliverResult::Failed {
            code: err.code(),
            kind: err.kind(),
            message: err.to_string(),
        },
        events: Vec::new(),
    }
}
