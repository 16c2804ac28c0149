// Storage module - PERSISTENCE
// Generic key-value collaborator, per-transaction write buffering and key layout

mod cache;
pub mod keys;
mod record;
mod store;

pub use cache::TxCache;
pub use record::{decode_record, encode_record, RECORD_VERSION};
pub use store::{KvRead, KvStore, MemStore, SledStore, StorageStats, StoreError, WriteBatch};
