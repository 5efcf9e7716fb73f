use rami_types::{PlayerRoster, RoundDelta};

use crate::error::LedgerError;
use crate::ledger::ScoreLedger;
use crate::record::LedgerRecord;

/// Deterministic reconstruction of a ledger from raw round deltas.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Build a fresh ledger for `roster` and record every round in order.
    ///
    /// Stops at the first round the ledger rejects.
    pub fn replay<I>(roster: PlayerRoster, rounds: I) -> Result<ScoreLedger, LedgerError>
    where
        I: IntoIterator<Item = RoundDelta>,
    {
        let mut ledger = ScoreLedger::with_roster(roster);
        for round in rounds {
            ledger.record_round(round)?;
        }
        Ok(ledger)
    }

    /// Rebuild a record's histories from its deltas alone.
    ///
    /// Useful when a saved file's histories are suspect: the round history
    /// is the source of truth for the rebuilt ledger.
    pub fn rebuild(record: &LedgerRecord) -> Result<ScoreLedger, LedgerError> {
        let roster = PlayerRoster::from_names(record.players.iter().map(|(n, _)| n.clone()).collect())
            .map_err(|e| LedgerError::CorruptState(format!("invalid player set: {e}")))?;
        Self::replay(roster, record.round_history.iter().cloned())
    }

    /// `true` when the stored histories agree with replaying the deltas.
    pub fn verify_convergence(record: &LedgerRecord) -> Result<bool, LedgerError> {
        let replayed = Self::rebuild(record)?;
        Ok(replayed.to_record().players == record.players)
    }
}
