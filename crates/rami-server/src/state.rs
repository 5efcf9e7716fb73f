use std::sync::Arc;

use rami_session::{GameSession, SessionRegistry, SessionResult};
use rami_store::GameStore;
use rami_types::{GameId, PlayerRoster};

/// Shared state handed to every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    /// Roster for games created without a player list.
    pub default_roster: PlayerRoster,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, default_roster: PlayerRoster) -> Self {
        Self {
            registry,
            default_roster,
        }
    }

    /// Session for `id`. A damaged save starts over, with the default
    /// roster if its players cannot be read.
    pub fn session(&self, id: &GameId) -> SessionResult<Arc<GameSession>> {
        self.registry.get(id, &self.default_roster)
    }

    pub fn with_store(store: Arc<dyn GameStore>, default_roster: PlayerRoster) -> Self {
        Self::new(Arc::new(SessionRegistry::new(store)), default_roster)
    }
}
