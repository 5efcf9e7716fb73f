use std::sync::Arc;

use rami_ledger::LedgerRecord;
use rami_types::GameId;

use crate::error::StoreResult;

/// Key-value persistence for saved games.
///
/// All implementations must satisfy these invariants:
/// - `load` of an id that was never saved (or was deleted) returns
///   [`StoreError::NotFound`](crate::StoreError::NotFound).
/// - `load` returns exactly the record last passed to `save` for that id.
/// - Data that cannot be decoded is reported as [`StoreError::Corrupt`](crate::StoreError::Corrupt).
pub trait GameStore: Send + Sync {
    /// Save (create or overwrite) the record for `id`.
    fn save(&self, id: &GameId, record: &LedgerRecord) -> StoreResult<()>;

    /// Load the record for `id`.
    fn load(&self, id: &GameId) -> StoreResult<LedgerRecord>;

    /// Check whether a game is saved under `id`.
    fn exists(&self, id: &GameId) -> StoreResult<bool>;

    /// Delete a saved game. Returns `true` if it existed.
    fn delete(&self, id: &GameId) -> StoreResult<bool>;

    /// Sorted ids of every saved game.
    fn list(&self) -> StoreResult<Vec<GameId>>;

    /// Like [`load`](Self::load), but a missing game is `Ok(None)`.
    fn load_optional(&self, id: &GameId) -> StoreResult<Option<LedgerRecord>> {
        match self.load(id) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: GameStore + ?Sized> GameStore for Arc<T> {
    fn save(&self, id: &GameId, record: &LedgerRecord) -> StoreResult<()> {
        (**self).save(id, record)
    }

    fn load(&self, id: &GameId) -> StoreResult<LedgerRecord> {
        (**self).load(id)
    }

    fn exists(&self, id: &GameId) -> StoreResult<bool> {
        (**self).exists(id)
    }

    fn delete(&self, id: &GameId) -> StoreResult<bool> {
        (**self).delete(id)
    }

    fn list(&self) -> StoreResult<Vec<GameId>> {
        (**self).list()
    }
}
