use rami_ledger::{LedgerError, LedgerRecord};
use rami_types::GameId;

use crate::error::{StoreError, StoreResult};

/// Encode a record in the saved-game format.
pub fn encode(record: &LedgerRecord) -> StoreResult<String> {
    record.to_json_pretty().map_err(|e| match e {
        LedgerError::Serialization(reason) => StoreError::Serialization(reason),
        other => StoreError::Serialization(other.to_string()),
    })
}

/// Decode a saved game; any failure is reported as corruption of `id`.
pub fn decode(id: &GameId, text: &str) -> StoreResult<LedgerRecord> {
    LedgerRecord::from_json(text).map_err(|e| StoreError::Corrupt {
        id: id.clone(),
        reason: e.to_string(),
    })
}
