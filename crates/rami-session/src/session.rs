use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rami_ledger::{LedgerPhase, RoundDeltaRow, RoundHistoryRow, ScoreLedger, Standing};
use rami_store::{GameStore, StoreError};
use rami_types::{GameId, PlayerName, PlayerRoster, RoundDelta};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};

/// How a session's ledger came to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOrigin {
    /// No saved game existed; a fresh ledger was created.
    Fresh,
    /// The saved game was loaded.
    Restored,
    /// The saved game was unreadable; a fresh ledger replaced it.
    Recovered { reason: String },
}

/// One game's ledger, its id, and the store it is saved to.
pub struct GameSession {
    id: GameId,
    origin: SessionOrigin,
    ledger: Mutex<ScoreLedger>,
    store: Arc<dyn GameStore>,
}

impl GameSession {
    /// Wrap an existing ledger. Nothing is loaded or saved.
    pub fn new(id: GameId, ledger: ScoreLedger, store: Arc<dyn GameStore>) -> Self {
        Self {
            id,
            origin: SessionOrigin::Fresh,
            ledger: Mutex::new(ledger),
            store,
        }
    }

    /// Load the saved game for `id`, or start a fresh one for `roster`.
    ///
    /// A missing save starts fresh. A corrupt save is logged and also starts
    /// fresh; the damaged data is overwritten by the next save. Any other
    /// store failure is returned.
    pub fn open(
        id: GameId,
        store: Arc<dyn GameStore>,
        roster: PlayerRoster,
    ) -> SessionResult<Self> {
        let (ledger, origin) = match load(&id, store.as_ref(), &roster)? {
            Some(loaded) => loaded,
            None => (ScoreLedger::with_roster(roster), SessionOrigin::Fresh),
        };
        Ok(Self::opened(id, ledger, origin, store))
    }

    /// Load the saved game for `id`; a missing save is
    /// [`SessionError::GameNotFound`].
    ///
    /// A corrupt save recovers as in [`open`](Self::open). The fresh ledger
    /// keeps the saved player names when they are still readable and uses
    /// `fallback` otherwise.
    pub fn restore(
        id: GameId,
        store: Arc<dyn GameStore>,
        fallback: &PlayerRoster,
    ) -> SessionResult<Self> {
        match load(&id, store.as_ref(), fallback)? {
            Some((ledger, origin)) => Ok(Self::opened(id, ledger, origin, store)),
            None => Err(SessionError::GameNotFound(id)),
        }
    }

    fn opened(
        id: GameId,
        ledger: ScoreLedger,
        origin: SessionOrigin,
        store: Arc<dyn GameStore>,
    ) -> Self {
        info!(
            game = %id,
            origin = ?origin,
            players = ledger.roster().len(),
            rounds = ledger.round_count(),
            "game session opened"
        );
        Self {
            id,
            origin,
            ledger: Mutex::new(ledger),
            store,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn origin(&self) -> &SessionOrigin {
        &self.origin
    }

    /// Record a round, then save.
    ///
    /// The round is applied first; a failed save is logged and does not
    /// fail the call.
    pub fn record_round(&self, delta: RoundDelta) -> SessionResult<()> {
        let mut ledger = self.lock()?;
        ledger.record_round(delta)?;
        self.persist(&ledger);
        Ok(())
    }

    /// Start over, optionally with a new roster, then save.
    pub fn reset(&self, roster: Option<PlayerRoster>) -> SessionResult<()> {
        let mut ledger = self.lock()?;
        ledger.reset(roster);
        self.persist(&ledger);
        Ok(())
    }

    /// Save now, returning any store error.
    pub fn save(&self) -> SessionResult<()> {
        let ledger = self.lock()?;
        self.store.save(&self.id, &ledger.to_record())?;
        debug!(game = %self.id, rounds = ledger.round_count(), "game saved");
        Ok(())
    }

    /// Save now, logging instead of returning failures.
    ///
    /// Returns `true` if the save succeeded.
    pub fn save_best_effort(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(game = %self.id, error = %e, "save failed");
                false
            }
        }
    }

    pub fn current_scores(&self) -> SessionResult<BTreeMap<PlayerName, i64>> {
        Ok(self.lock()?.current_scores())
    }

    pub fn standings(&self) -> SessionResult<Vec<Standing>> {
        Ok(self.lock()?.standings())
    }

    pub fn round_history_table(&self) -> SessionResult<Vec<RoundHistoryRow>> {
        Ok(self.lock()?.round_history_table())
    }

    pub fn round_deltas(&self) -> SessionResult<Vec<RoundDeltaRow>> {
        Ok(self.lock()?.round_deltas())
    }

    pub fn phase(&self) -> SessionResult<LedgerPhase> {
        Ok(self.lock()?.phase())
    }

    pub fn roster(&self) -> SessionResult<PlayerRoster> {
        Ok(self.lock()?.roster().clone())
    }

    /// Copy of the ledger as it is right now.
    pub fn snapshot(&self) -> SessionResult<ScoreLedger> {
        Ok(self.lock()?.clone())
    }

    /// Run `f` against the ledger under the session lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&ScoreLedger) -> R) -> SessionResult<R> {
        let ledger = self.lock()?;
        Ok(f(&ledger))
    }

    fn lock(&self) -> SessionResult<MutexGuard<'_, ScoreLedger>> {
        self.ledger
            .lock()
            .map_err(|_| SessionError::Poisoned(self.id.clone()))
    }

    fn persist(&self, ledger: &ScoreLedger) {
        if let Err(e) = self.store.save(&self.id, &ledger.to_record()) {
            warn!(game = %self.id, error = %e, "save after update failed; continuing");
        }
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Read the saved game. `Ok(None)` when nothing is saved under `id`.
fn load(
    id: &GameId,
    store: &dyn GameStore,
    fallback: &PlayerRoster,
) -> SessionResult<Option<(ScoreLedger, SessionOrigin)>> {
    let record = match store.load_optional(id) {
        Ok(Some(record)) => record,
        Ok(None) => return Ok(None),
        Err(StoreError::Corrupt { reason, .. }) => {
            return Ok(Some(recovered(id, fallback.clone(), reason)))
        }
        Err(e) => return Err(e.into()),
    };

    // Player names often survive damage elsewhere in the record.
    let salvaged = PlayerRoster::from_names(record.players.iter().map(|(n, _)| n.clone()).collect());
    match ScoreLedger::from_record(record) {
        Ok(ledger) => Ok(Some((ledger, SessionOrigin::Restored))),
        Err(e) => {
            let roster = salvaged.unwrap_or_else(|_| fallback.clone());
            Ok(Some(recovered(id, roster, e.to_string())))
        }
    }
}

fn recovered(id: &GameId, roster: PlayerRoster, reason: String) -> (ScoreLedger, SessionOrigin) {
    warn!(game = %id, reason = %reason, "saved game is corrupt; starting fresh");
    (
        ScoreLedger::with_roster(roster),
        SessionOrigin::Recovered { reason },
    )
}
