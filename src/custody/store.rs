// Custody Record Store - wallet id -> custody configuration
//
// Writes are crate-private: only genesis, the proposal registry (sequence
// bump) and the executor may change a record. Authorizations live next to
// the records under their own prefix and are append-only.

use crate::custody::{Authorization, CustodyRecord};
use crate::identity::WalletId;
use crate::storage::{decode_record, encode_record, keys, KvRead, StoreError, TxCache};

pub struct CustodyStore;

impl CustodyStore {
    /// Load the custody record of a wallet
    pub fn get<R: KvRead + ?Sized>(
        kv: &R,
        wallet: &WalletId,
    ) -> Result<Option<CustodyRecord>, StoreError> {
        match kv.get(&keys::custody_key(wallet.as_str()))? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn exists<R: KvRead + ?Sized>(kv: &R, wallet: &WalletId) -> Result<bool, StoreError> {
        Ok(kv.get(&keys::custody_key(wallet.as_str()))?.is_some())
    }

    /// All custody records in wallet order
    pub fn list<R: KvRead + ?Sized>(kv: &R) -> Result<Vec<CustodyRecord>, StoreError> {
        kv.scan_prefix(keys::CUSTODY_PREFIX)?
            .into_iter()
            .map(|(_, bytes)| decode_record(&bytes))
            .collect()
    }

    pub(crate) fn save(cache: &mut TxCache<'_>, record: &CustodyRecord) -> Result<(), StoreError> {
        cache.set(
            keys::custody_key(record.wallet().as_str()),
            encode_record(record)?,
        );
        Ok(())
    }

    /// Authorizations of one wallet, oldest first
    pub fn authorizations<R: KvRead + ?Sized>(
        kv: &R,
        wallet: &WalletId,
    ) -> Result<Vec<Authorization>, StoreError> {
        kv.scan_prefix(&keys::authorizations_prefix(wallet.as_str()))?
            .into_iter()
            .map(|(_, bytes)| decode_record(&bytes))
            .collect()
    }

    /// Every authorization, grouped by wallet
    pub fn all_authorizations<R: KvRead + ?Sized>(kv: &R) -> Result<Vec<Authorization>, StoreError> {
        kv.scan_prefix(keys::AUTH_PREFIX)?
            .into_iter()
            .map(|(_, bytes)| decode_record(&bytes))
            .collect()
    }

    pub(crate) fn record_authorization(
        cache: &mut TxCache<'_>,
        authorization: &Authorization,
    ) -> Result<(), StoreError> {
        cache.set(
            keys::authorization_key(
                authorization.wallet.as_str(),
                authorization.height,
                authorization.proposal_id.as_bytes(),
            ),
            encode_record(authorization)?,
        );
        Ok(())
    }
}
