// Versioned record envelope for everything the module persists

use crate::storage::StoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Current on-disk record version
pub const RECORD_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct Versioned<T> {
    version: u16,
    record: T,
}

/// Encode a record with its version header (postcard)
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(&Versioned {
        version: RECORD_VERSION,
        record,
    })
    .map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

/// Decode a record, refusing versions this build does not understand
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    let (version, rest): (u16, &[u8]) = postcard::take_from_bytes(bytes)
        .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
    if version != RECORD_VERSION {
        return Err(StoreError::UnsupportedVersion {
            expected: RECORD_VERSION,
            found: version,
        });
    }
    postcard::from_bytes(rest).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
}
