// Per-transaction execution context
//
// Bundles the block height, module params, the transaction's write buffer
// over committed state and the events emitted so far. Every state-touching
// operation takes one of these; nothing is global.

use crate::module::{Event, Params};
use crate::storage::{KvRead, TxCache, WriteBatch};

pub struct Context<'a> {
    height: u64,
    params: &'a Params,
    cache: TxCache<'a>,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    pub fn new(height: u64, params: &'a Params, committed: &'a dyn KvRead) -> Self {
        Self {
            height,
            params,
            cache: TxCache::new(committed),
            events: Vec::new(),
        }
    }

    /// Height of the block containing the transaction
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn params(&self) -> &Params {
        self.params
    }

    /// State as seen by this transaction (committed state plus own writes)
    pub fn store(&self) -> &TxCache<'a> {
        &self.cache
    }

    pub(crate) fn store_mut(&mut self) -> &mut TxCache<'a> {
        &mut self.cache
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consume the context into the writes to commit and the events to report
    pub fn finish(self) -> (WriteBatch, Vec<Event>) {
        (self.cache.into_batch(), self.events)
    }
}
