use std::collections::HashMap;
use std::sync::RwLock;

use rami_ledger::LedgerRecord;
use rami_types::GameId;
use tracing::debug;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::traits::GameStore;

/// In-memory, HashMap-based game store.
///
/// Intended for tests and embedding. Records are kept as encoded JSON text
/// so that every save and load goes through the real saved-game format.
pub struct InMemoryGameStore {
    games: RwLock<HashMap<GameId, String>>,
}

impl InMemoryGameStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
        }
    }

    /// Number of saved games.
    pub fn len(&self) -> usize {
        self.games.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Returns `true` if no game is saved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store raw text under `id`, bypassing encoding. Used to simulate
    /// damaged saves.
    pub fn insert_raw(&self, id: GameId, text: impl Into<String>) -> StoreResult<()> {
        self.write_lock()?.insert(id, text.into());
        Ok(())
    }

    fn read_lock(
        &self,
    ) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<GameId, String>>> {
        self.games
            .read()
            .map_err(|_| StoreError::Unavailable("game store read lock poisoned".into()))
    }

    fn write_lock(
        &self,
    ) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<GameId, String>>> {
        self.games
            .write()
            .map_err(|_| StoreError::Unavailable("game store write lock poisoned".into()))
    }
}

impl Default for InMemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore for InMemoryGameStore {
    fn save(&self, id: &GameId, record: &LedgerRecord) -> StoreResult<()> {
        let text = codec::encode(record)?;
        self.write_lock()?.insert(id.clone(), text);
        debug!(game = %id, rounds = record.round_history.len(), "game saved in memory");
        Ok(())
    }

    fn load(&self, id: &GameId) -> StoreResult<LedgerRecord> {
        let games = self.read_lock()?;
        let text = games
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        codec::decode(id, text)
    }

    fn exists(&self, id: &GameId) -> StoreResult<bool> {
        Ok(self.read_lock()?.contains_key(id))
    }

    fn delete(&self, id: &GameId) -> StoreResult<bool> {
        Ok(self.write_lock()?.remove(id).is_some())
    }

    fn list(&self) -> StoreResult<Vec<GameId>> {
        let mut ids: Vec<GameId> = self.read_lock()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryGameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGameStore")
            .field("game_count", &self.len())
            .finish()
    }
}
