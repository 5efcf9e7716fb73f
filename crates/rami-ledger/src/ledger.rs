use std::collections::BTreeMap;

use rami_types::{PlayerName, PlayerRoster, RoundDelta};
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::projection::{ProjectionBuilder, RoundDeltaRow, RoundHistoryRow, Standing};
use crate::record::LedgerRecord;

/// A player's running total and the total after every recorded round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    name: PlayerName,
    score: i64,
    history: Vec<i64>,
}

impl Player {
    fn new(name: PlayerName) -> Self {
        Self {
            name,
            score: 0,
            history: Vec::new(),
        }
    }

    fn restore(name: PlayerName, history: Vec<i64>) -> Self {
        let score = history.last().copied().unwrap_or(0);
        Self {
            name,
            score,
            history,
        }
    }

    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    /// Cumulative score; equals the last history entry, or 0 before any round.
    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn history(&self) -> &[i64] {
        &self.history
    }
}

/// Lifecycle of a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerPhase {
    /// Just constructed or reset; no rounds recorded.
    Empty,
    /// At least one round recorded.
    Active,
}

/// In-memory score ledger for one game.
///
/// The ledger is a plain value with no internal locking. Whoever owns it is
/// responsible for serializing calls (see `rami-session`).
///
/// Invariants:
/// - `players` follows roster (seat) order, one entry per roster name.
/// - Every player's history has exactly `rounds.len()` entries, and
///   `history[i]` is the sum of that player's deltas in `rounds[..=i]`.
/// - Rounds are append-only until [`reset`](Self::reset).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreLedger {
    roster: PlayerRoster,
    players: Vec<Player>,
    rounds: Vec<RoundDelta>,
}

impl ScoreLedger {
    /// Create a ledger for the given player names.
    ///
    /// Fails with [`LedgerError::InvalidConfiguration`] if the names are
    /// empty, blank, or repeated.
    pub fn new<I, S>(names: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roster = PlayerRoster::new(names)?;
        Ok(Self::with_roster(roster))
    }

    /// Create a ledger for an already-validated roster.
    pub fn with_roster(roster: PlayerRoster) -> Self {
        let players = roster.iter().cloned().map(Player::new).collect();
        Self {
            roster,
            players,
            rounds: Vec::new(),
        }
    }

    /// Record one round of score changes.
    ///
    /// The delta must name exactly the current players. The whole round is
    /// validated before anything is applied, so a rejected round leaves the
    /// ledger untouched.
    pub fn record_round(&mut self, delta: RoundDelta) -> Result<(), LedgerError> {
        if let Some(unknown) = delta.players().find(|name| !self.roster.contains(name.as_str())) {
            return Err(LedgerError::UnknownPlayer(unknown.to_string()));
        }

        let missing: Vec<String> = self
            .roster
            .iter()
            .filter(|name| !delta.contains(name.as_str()))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(LedgerError::IncompleteRound { missing });
        }

        let totals = self
            .players
            .iter()
            .map(|player| {
                let amount = delta.get(player.name.as_str()).unwrap_or(0);
                player
                    .score
                    .checked_add(amount)
                    .ok_or_else(|| LedgerError::ScoreOverflow {
                        player: player.name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (player, total) in self.players.iter_mut().zip(totals) {
            player.score = total;
            player.history.push(total);
        }

        let null_round = delta.is_null();
        self.rounds.push(delta);
        debug!(round = self.rounds.len(), null_round, "round recorded");
        Ok(())
    }

    /// Discard every round and start over with fresh players.
    ///
    /// With `None` the current roster is kept.
    pub fn reset(&mut self, roster: Option<PlayerRoster>) {
        let roster = roster.unwrap_or_else(|| self.roster.clone());
        info!(
            players = roster.len(),
            discarded_rounds = self.rounds.len(),
            "ledger reset"
        );
        *self = Self::with_roster(roster);
    }

    /// Snapshot of every player's cumulative score.
    pub fn current_scores(&self) -> BTreeMap<PlayerName, i64> {
        self.players
            .iter()
            .map(|p| (p.name.clone(), p.score))
            .collect()
    }

    /// Players ranked by score, highest first.
    pub fn standings(&self) -> Vec<Standing> {
        ProjectionBuilder::standings(self)
    }

    /// Cumulative scores after each round, one row per round (1-indexed).
    pub fn round_history_table(&self) -> Vec<RoundHistoryRow> {
        ProjectionBuilder::round_history_table(self)
    }

    /// Raw per-round deltas, one row per round (1-indexed).
    pub fn round_deltas(&self) -> Vec<RoundDeltaRow> {
        ProjectionBuilder::round_deltas(self)
    }

    /// The recorded rounds, oldest first.
    pub fn round_history(&self) -> &[RoundDelta] {
        &self.rounds
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn phase(&self) -> LedgerPhase {
        if self.rounds.is_empty() {
            LedgerPhase::Empty
        } else {
            LedgerPhase::Active
        }
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    /// Players in seat order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.roster.position(name).map(|index| &self.players[index])
    }

    /// Build the persisted form of this ledger.
    pub fn to_record(&self) -> LedgerRecord {
        LedgerRecord {
            players: self
                .players
                .iter()
                .map(|p| (p.name.clone(), p.history.clone()))
                .collect(),
            round_history: self.rounds.clone(),
        }
    }

    /// Restore a ledger from its persisted form.
    ///
    /// Cumulative scores come from the last history entry of each player;
    /// deltas are not replayed. Fails with [`LedgerError::CorruptState`] if
    /// the player set is invalid, a round names a player with no history, or
    /// a history does not have one entry per round.
    pub fn from_record(record: LedgerRecord) -> Result<Self, LedgerError> {
        let LedgerRecord {
            players,
            round_history,
        } = record;
        let entries = players.into_entries();

        let roster = PlayerRoster::from_names(entries.iter().map(|(name, _)| name.clone()).collect())
            .map_err(|e| LedgerError::CorruptState(format!("invalid player set: {e}")))?;

        for (index, round) in round_history.iter().enumerate() {
            if let Some(unknown) = round.players().find(|name| !roster.contains(name.as_str())) {
                return Err(LedgerError::CorruptState(format!(
                    "round {} references player {unknown} with no history",
                    index + 1
                )));
            }
        }

        for (name, history) in &entries {
            if history.len() != round_history.len() {
                return Err(LedgerError::CorruptState(format!(
                    "player {name} has {} history entries for {} rounds",
                    history.len(),
                    round_history.len()
                )));
            }
        }

        let players = entries
            .into_iter()
            .map(|(name, history)| Player::restore(name, history))
            .collect();

        Ok(Self {
            roster,
            players,
            rounds: round_history,
        })
    }

    /// Serialize to the persisted JSON format.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        self.to_record().to_json()
    }

    /// Restore from the persisted JSON format.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        Self::from_record(LedgerRecord::from_json(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s).unwrap()
    }

    fn round(entries: &[(&str, i64)]) -> RoundDelta {
        entries.iter().map(|(n, v)| (name(n), *v)).collect()
    }

    fn scores(entries: &[(&str, i64)]) -> BTreeMap<PlayerName, i64> {
        entries.iter().map(|(n, v)| (name(n), *v)).collect()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_ledger_is_empty() {
        let ledger = ScoreLedger::new(["A", "B"]).unwrap();
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
        assert_eq!(ledger.current_scores(), scores(&[("A", 0), ("B", 0)]));
        assert!(ledger.round_history_table().is_empty());
        assert!(ledger.players().iter().all(|p| p.history().is_empty()));
    }

    #[test]
    fn duplicate_names_are_invalid_configuration() {
        let err = ScoreLedger::new(["A", "A"]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfiguration(_)));
    }

    #[test]
    fn empty_names_are_invalid_configuration() {
        let err = ScoreLedger::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfiguration(_)));
    }

    #[test]
    fn no_upper_bound_on_players() {
        let names: Vec<String> = (0..12).map(|i| format!("P{i}")).collect();
        let ledger = ScoreLedger::new(names).unwrap();
        assert_eq!(ledger.players().len(), 12);
    }

    // -----------------------------------------------------------------------
    // Recording rounds
    // -----------------------------------------------------------------------

    #[test]
    fn two_player_scenario() {
        let mut ledger = ScoreLedger::new(["A", "B"]).unwrap();

        ledger.record_round(round(&[("A", 50), ("B", -50)])).unwrap();
        assert_eq!(ledger.current_scores(), scores(&[("A", 50), ("B", -50)]));
        assert_eq!(ledger.phase(), LedgerPhase::Active);

        ledger.record_round(round(&[("A", -50), ("B", 50)])).unwrap();
        assert_eq!(ledger.current_scores(), scores(&[("A", 0), ("B", 0)]));

        let table = ledger.round_history_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].round, 1);
        assert_eq!(table[0].scores, scores(&[("A", 50), ("B", -50)]));
        assert_eq!(table[1].round, 2);
        assert_eq!(table[1].scores, scores(&[("A", 0), ("B", 0)]));
    }

    #[test]
    fn unknown_player_rejects_whole_round() {
        let mut ledger = ScoreLedger::new(["A", "B"]).unwrap();
        ledger.record_round(round(&[("A", 10), ("B", 5)])).unwrap();
        let before = ledger.clone();

        let err = ledger
            .record_round(round(&[("A", 100), ("B", 0), ("C", 7)]))
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownPlayer("C".into()));
        assert_eq!(ledger.current_scores(), scores(&[("A", 10), ("B", 5)]));
        assert_eq!(ledger, before);
    }

    #[test]
    fn partial_round_is_rejected() {
        let mut ledger = ScoreLedger::new(["A", "B", "C"]).unwrap();
        let err = ledger.record_round(round(&[("B", 30)])).unwrap_err();
        assert_eq!(
            err,
            LedgerError::IncompleteRound {
                missing: vec!["A".into(), "C".into()]
            }
        );
        assert_eq!(ledger.round_count(), 0);
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
    }

    #[test]
    fn null_round_still_appends() {
        let mut ledger = ScoreLedger::new(["A", "B"]).unwrap();
        ledger.record_round(round(&[("A", 0), ("B", 0)])).unwrap();

        assert_eq!(ledger.round_count(), 1);
        for player in ledger.players() {
            assert_eq!(player.history(), &[0]);
        }
        assert_eq!(ledger.phase(), LedgerPhase::Active);
    }

    #[test]
    fn overflow_is_rejected_without_mutation() {
        let mut ledger = ScoreLedger::new(["A", "B"]).unwrap();
        ledger.record_round(round(&[("A", 0), ("B", i64::MAX)])).unwrap();
        let err = ledger
            .record_round(round(&[("A", 1), ("B", 1)]))
            .unwrap_err();
        assert_eq!(err, LedgerError::ScoreOverflow { player: "B".into() });
        assert_eq!(ledger.player("A").unwrap().history(), &[0]);
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    #[test]
    fn reset_keeps_roster_by_default() {
        let mut ledger = ScoreLedger::new(["A", "B"]).unwrap();
        ledger.record_round(round(&[("A", 5), ("B", -5)])).unwrap();

        ledger.reset(None);
        assert_eq!(ledger, ScoreLedger::new(["A", "B"]).unwrap());
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut once = ScoreLedger::new(["A", "B"]).unwrap();
        once.record_round(round(&[("A", 5), ("B", -5)])).unwrap();
        let mut twice = once.clone();

        once.reset(None);
        twice.reset(None);
        twice.reset(None);
        assert_eq!(once, twice);
    }

    #[test]
    fn reset_with_new_roster() {
        let mut ledger = ScoreLedger::new(["A", "B"]).unwrap();
        ledger.record_round(round(&[("A", 5), ("B", -5)])).unwrap();

        let roster = PlayerRoster::new(["X", "Y", "Z"]).unwrap();
        ledger.reset(Some(roster));
        assert_eq!(ledger.current_scores(), scores(&[("X", 0), ("Y", 0), ("Z", 0)]));
        assert!(ledger.round_history().is_empty());

        let err = ledger.record_round(round(&[("A", 1)])).unwrap_err();
        assert_eq!(err, LedgerError::UnknownPlayer("A".into()));
    }

    // -----------------------------------------------------------------------
    // Persistence record
    // -----------------------------------------------------------------------

    #[test]
    fn record_roundtrip_preserves_observable_state() {
        let mut ledger = ScoreLedger::new(["Saleh", "Khalil", "Achref"]).unwrap();
        ledger
            .record_round(round(&[("Saleh", 100), ("Khalil", -50), ("Achref", -50)]))
            .unwrap();
        ledger
            .record_round(round(&[("Saleh", 0), ("Khalil", 0), ("Achref", 0)]))
            .unwrap();

        let restored = ScoreLedger::from_record(ledger.to_record()).unwrap();
        assert_eq!(restored.current_scores(), ledger.current_scores());
        assert_eq!(restored.round_history_table(), ledger.round_history_table());
        assert_eq!(restored.round_history(), ledger.round_history());
        assert_eq!(restored, ledger);
    }

    #[test]
    fn json_roundtrip_keeps_seat_order() {
        let mut ledger = ScoreLedger::new(["Morta", "Achref"]).unwrap();
        ledger.record_round(round(&[("Morta", 20), ("Achref", 30)])).unwrap();

        let json = ledger.to_json().unwrap();
        let restored = ScoreLedger::from_json(&json).unwrap();
        let seats: Vec<&str> = restored.roster().iter().map(PlayerName::as_str).collect();
        assert_eq!(seats, ["Morta", "Achref"]);
        assert_eq!(restored, ledger);
    }

    #[test]
    fn restore_takes_score_from_history_not_deltas() {
        let json = r#"{"players":{"A":[10,25]},"roundHistory":[{"A":1},{"A":2}]}"#;
        let ledger = ScoreLedger::from_json(json).unwrap();
        assert_eq!(ledger.player("A").unwrap().score(), 25);
    }

    #[test]
    fn restore_empty_histories_gives_zero() {
        let json = r#"{"players":{"A":[],"B":[]},"roundHistory":[]}"#;
        let ledger = ScoreLedger::from_json(json).unwrap();
        assert_eq!(ledger.current_scores(), scores(&[("A", 0), ("B", 0)]));
        assert_eq!(ledger.phase(), LedgerPhase::Empty);
    }

    #[test]
    fn restore_rejects_round_player_without_history() {
        let json = r#"{"players":{"A":[5]},"roundHistory":[{"A":5,"B":1}]}"#;
        let err = ScoreLedger::from_json(json).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptState(_)));
    }

    #[test]
    fn restore_rejects_misaligned_history() {
        let json = r#"{"players":{"A":[5],"B":[]},"roundHistory":[{"A":5}]}"#;
        let err = ScoreLedger::from_json(json).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptState(_)));
    }

    #[test]
    fn restore_rejects_missing_fields() {
        for json in [
            r#"{"players":{"A":[]}}"#,
            r#"{"roundHistory":[]}"#,
            r#"{}"#,
            "not json",
        ] {
            let err = ScoreLedger::from_json(json).unwrap_err();
            assert!(matches!(err, LedgerError::CorruptState(_)), "{json}");
        }
    }

    #[test]
    fn restore_rejects_empty_player_set() {
        let err = ScoreLedger::from_json(r#"{"players":{},"roundHistory":[]}"#).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptState(_)));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    const SEATS: [&str; 4] = ["Saleh", "Khalil", "Achref", "Morta"];

    fn rounds_strategy() -> impl Strategy<Value = Vec<[i64; 4]>> {
        prop::collection::vec(prop::array::uniform4(-1_000i64..1_000), 0..30)
    }

    fn ledger_from(rounds: &[[i64; 4]]) -> ScoreLedger {
        let mut ledger = ScoreLedger::new(SEATS).unwrap();
        for amounts in rounds {
            let delta = SEATS
                .iter()
                .zip(amounts)
                .map(|(n, v)| (name(n), *v))
                .collect();
            ledger.record_round(delta).unwrap();
        }
        ledger
    }

    proptest! {
        #[test]
        fn scores_equal_sum_of_deltas(rounds in rounds_strategy()) {
            let ledger = ledger_from(&rounds);
            let current = ledger.current_scores();
            for (seat, player) in SEATS.iter().enumerate() {
                let expected: i64 = rounds.iter().map(|r| r[seat]).sum();
                prop_assert_eq!(current[*player], expected);
            }
        }

        #[test]
        fn table_rows_are_prefix_sums(rounds in rounds_strategy()) {
            let ledger = ledger_from(&rounds);
            let table = ledger.round_history_table();
            prop_assert_eq!(table.len(), rounds.len());
            for (i, row) in table.iter().enumerate() {
                prop_assert_eq!(row.round, i + 1);
                for (seat, player) in SEATS.iter().enumerate() {
                    let expected: i64 = rounds[..=i].iter().map(|r| r[seat]).sum();
                    prop_assert_eq!(row.scores[*player], expected);
                    prop_assert_eq!(ledger.player(player).unwrap().history()[i], expected);
                }
            }
        }

        #[test]
        fn json_roundtrip_is_lossless(rounds in rounds_strategy()) {
            let ledger = ledger_from(&rounds);
            let restored = ScoreLedger::from_json(&ledger.to_json().unwrap()).unwrap();
            prop_assert_eq!(restored.current_scores(), ledger.current_scores());
            prop_assert_eq!(restored.round_history_table(), ledger.round_history_table());
        }
    }
}
