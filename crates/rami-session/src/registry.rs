use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rami_ledger::ScoreLedger;
use rami_store::GameStore;
use rami_types::{GameId, PlayerRoster};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::session::GameSession;

/// Outcome of saving every open session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub saved: usize,
    pub failed: usize,
}

/// Open game sessions keyed by game id, all saving to one store.
pub struct SessionRegistry {
    store: Arc<dyn GameStore>,
    sessions: RwLock<HashMap<GameId, Arc<GameSession>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// Return the open session for `id`, opening it from the store (or
    /// fresh with `roster`) if it is not open yet.
    pub fn open_or_create(&self, id: GameId, roster: PlayerRoster) -> SessionResult<Arc<GameSession>> {
        if let Some(session) = self.open_session(&id)? {
            return Ok(session);
        }
        let session = GameSession::open(id, Arc::clone(&self.store), roster)?;
        self.insert_or_existing(session)
    }

    /// Start a brand new game. Fails if `id` is open or already saved.
    ///
    /// A save that can no longer be read does not count as a game; it is
    /// replaced.
    pub fn create(&self, id: GameId, roster: PlayerRoster) -> SessionResult<Arc<GameSession>> {
        if self.open_session(&id)?.is_some() {
            return Err(SessionError::GameExists(id));
        }
        match self.store.load(&id) {
            Ok(record) => match ScoreLedger::from_record(record) {
                Ok(_) => return Err(SessionError::GameExists(id)),
                Err(e) => warn!(game = %id, error = %e, "replacing inconsistent save"),
            },
            Err(e) if e.is_not_found() => {}
            Err(e) if e.is_corrupt() => warn!(game = %id, error = %e, "replacing unreadable save"),
            Err(e) => return Err(e.into()),
        }

        let session = Arc::new(GameSession::new(
            id.clone(),
            ScoreLedger::with_roster(roster),
            Arc::clone(&self.store),
        ));
        session.save()?;

        let mut sessions = self.write()?;
        if let Some(existing) = sessions.get(&id) {
            // Lost a race with another create; put the winner's state back.
            existing.save_best_effort();
            return Err(SessionError::GameExists(id));
        }
        sessions.insert(id.clone(), Arc::clone(&session));
        info!(game = %id, "game created");
        Ok(session)
    }

    /// Return the session for `id`, restoring it from the store if needed.
    ///
    /// Unlike [`open_or_create`](Self::open_or_create) this never invents a
    /// game: a missing save is [`SessionError::GameNotFound`]. A corrupt
    /// save starts over with the saved players if they are readable, or
    /// with `fallback`.
    pub fn get(&self, id: &GameId, fallback: &PlayerRoster) -> SessionResult<Arc<GameSession>> {
        if let Some(session) = self.open_session(id)? {
            return Ok(session);
        }
        let session = GameSession::restore(id.clone(), Arc::clone(&self.store), fallback)?;
        self.insert_or_existing(session)
    }

    fn open_session(&self, id: &GameId) -> SessionResult<Option<Arc<GameSession>>> {
        Ok(self.read()?.get(id).map(Arc::clone))
    }

    /// Register a freshly loaded session. If another caller registered the
    /// same id meanwhile, theirs wins and `session` is dropped unsaved.
    fn insert_or_existing(&self, session: GameSession) -> SessionResult<Arc<GameSession>> {
        let mut sessions = self.write()?;
        let entry = sessions
            .entry(session.id().clone())
            .or_insert_with(|| Arc::new(session));
        Ok(Arc::clone(entry))
    }

    /// Close a session after saving it. Returns it if it was open.
    pub fn close(&self, id: &GameId) -> SessionResult<Option<Arc<GameSession>>> {
        let session = self.write()?.remove(id);
        if let Some(session) = &session {
            session.save_best_effort();
            debug!(game = %id, "game session closed");
        }
        Ok(session)
    }

    /// Sorted ids of the open sessions.
    pub fn ids(&self) -> SessionResult<Vec<GameId>> {
        let mut ids: Vec<GameId> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save every open session, logging failures.
    pub fn save_all(&self) -> SessionResult<SaveSummary> {
        // Clone the handles so saves do not hold the registry lock.
        let sessions: Vec<Arc<GameSession>> = self.read()?.values().cloned().collect();
        let mut summary = SaveSummary::default();
        for session in sessions {
            if session.save_best_effort() {
                summary.saved += 1;
            } else {
                summary.failed += 1;
            }
        }
        debug!(saved = summary.saved, failed = summary.failed, "saved open games");
        Ok(summary)
    }

    fn read(
        &self,
    ) -> SessionResult<std::sync::RwLockReadGuard<'_, HashMap<GameId, Arc<GameSession>>>> {
        self.sessions
            .read()
            .map_err(|_| SessionError::Internal("registry read lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> SessionResult<std::sync::RwLockWriteGuard<'_, HashMap<GameId, Arc<GameSession>>>> {
        self.sessions
            .write()
            .map_err(|_| SessionError::Internal("registry write lock poisoned".into()))
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("open_sessions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{round, roster, FailingStore};
    use crate::session::SessionOrigin;
    use rami_store::InMemoryGameStore;

    fn game(id: &str) -> GameId {
        GameId::new(id).unwrap()
    }

    fn registry() -> (Arc<InMemoryGameStore>, SessionRegistry) {
        let store = Arc::new(InMemoryGameStore::new());
        let registry = SessionRegistry::new(store.clone());
        (store, registry)
    }

    #[test]
    fn open_or_create_returns_same_session() {
        let (_store, registry) = registry();
        let a = registry.open_or_create(game("g"), roster()).unwrap();
        let b = registry.open_or_create(game("g"), roster()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn create_rejects_existing_games() {
        let (store, registry) = registry();
        registry.create(game("g"), roster()).unwrap();
        assert!(store.exists(&game("g")).unwrap());

        let err = registry.create(game("g"), roster()).unwrap_err();
        assert!(matches!(err, SessionError::GameExists(_)));
    }

    #[test]
    fn get_restores_from_store() {
        let (store, registry) = registry();
        {
            let other = SessionRegistry::new(store.clone());
            let session = other.create(game("g"), roster()).unwrap();
            session.record_round(round(30, -30)).unwrap();
        }

        let session = registry.get(&game("g"), &roster()).unwrap();
        assert_eq!(session.origin(), &SessionOrigin::Restored);
        assert_eq!(session.snapshot().unwrap().round_count(), 1);
    }

    #[test]
    fn get_unknown_game_is_not_found() {
        let (_store, registry) = registry();
        let err = registry.get(&game("nope"), &roster()).unwrap_err();
        assert!(matches!(err, SessionError::GameNotFound(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn close_saves_and_forgets() {
        let (store, registry) = registry();
        let session = registry.open_or_create(game("g"), roster()).unwrap();
        drop(session);
        assert!(!store.exists(&game("g")).unwrap());

        assert!(registry.close(&game("g")).unwrap().is_some());
        assert!(store.exists(&game("g")).unwrap());
        assert!(registry.ids().unwrap().is_empty());
        assert!(registry.close(&game("g")).unwrap().is_none());
    }

    #[test]
    fn save_all_counts_failures() {
        let (store, registry) = registry();
        registry.open_or_create(game("a"), roster()).unwrap();
        registry.open_or_create(game("b"), roster()).unwrap();
        let summary = registry.save_all().unwrap();
        assert_eq!(summary, SaveSummary { saved: 2, failed: 0 });
        assert_eq!(store.list().unwrap(), vec![game("a"), game("b")]);

        let failing = SessionRegistry::new(Arc::new(FailingStore));
        failing.open_or_create(game("x"), roster()).unwrap();
        let summary = failing.save_all().unwrap();
        assert_eq!(summary, SaveSummary { saved: 0, failed: 1 });
    }

    #[test]
    fn get_recovers_unreadable_save() {
        let (store, registry) = registry();
        store.insert_raw(game("g"), "{\"players\": 7}").unwrap();

        let session = registry.get(&game("g"), &roster()).unwrap();
        assert!(matches!(session.origin(), SessionOrigin::Recovered { .. }));
        session.record_round(round(10, -10)).unwrap();

        assert!(store.load(&game("g")).is_ok());
        assert!(Arc::ptr_eq(&session, &registry.get(&game("g"), &roster()).unwrap()));
    }

    #[test]
    fn create_replaces_unreadable_save() {
        let (store, registry) = registry();
        store.insert_raw(game("g"), "not json").unwrap();

        let session = registry.create(game("g"), roster()).unwrap();
        assert_eq!(session.phase().unwrap(), rami_ledger::LedgerPhase::Empty);
        assert!(store.load(&game("g")).is_ok());
    }

    #[test]
    fn concurrent_gets_share_one_session() {
        use std::thread;

        let (store, registry) = registry();
        SessionRegistry::new(store.clone()).create(game("g"), roster()).unwrap();
        let registry = Arc::new(registry);

        let sessions: Vec<Arc<GameSession>> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get(&game("g"), &roster()).unwrap())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();

        assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
        assert_eq!(registry.len(), 1);
    }
}
