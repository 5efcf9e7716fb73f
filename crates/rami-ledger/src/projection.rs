use std::collections::BTreeMap;

use rami_types::{PlayerName, RoundDelta};
use serde::{Deserialize, Serialize};

use crate::ledger::ScoreLedger;

/// One leaderboard entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Competition rank: tied scores share a rank and the next rank is skipped.
    pub rank: usize,
    pub player: PlayerName,
    pub score: i64,
}

/// Cumulative scores after one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundHistoryRow {
    /// 1-based round number.
    pub round: usize,
    pub scores: BTreeMap<PlayerName, i64>,
}

/// Raw deltas of one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDeltaRow {
    /// 1-based round number.
    pub round: usize,
    pub deltas: RoundDelta,
    /// `true` when the deltas sum to zero.
    pub null_round: bool,
}

/// Read-only views over a ledger for presentation layers.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Players sorted by score descending; ties keep seat order.
    pub fn standings(ledger: &ScoreLedger) -> Vec<Standing> {
        let mut ordered: Vec<(usize, &PlayerName, i64)> = ledger
            .players()
            .iter()
            .enumerate()
            .map(|(seat, p)| (seat, p.name(), p.score()))
            .collect();
        ordered.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut standings = Vec::with_capacity(ordered.len());
        let mut previous: Option<i64> = None;
        let mut rank = 0;
        for (position, (_, name, score)) in ordered.into_iter().enumerate() {
            if previous != Some(score) {
                rank = position + 1;
                previous = Some(score);
            }
            standings.push(Standing {
                rank,
                player: name.clone(),
                score,
            });
        }
        standings
    }

    /// Project each player's history into one row per round.
    pub fn round_history_table(ledger: &ScoreLedger) -> Vec<RoundHistoryRow> {
        (0..ledger.round_count())
            .map(|index| RoundHistoryRow {
                round: index + 1,
                scores: ledger
                    .players()
                    .iter()
                    .filter_map(|p| p.history().get(index).map(|s| (p.name().clone(), *s)))
                    .collect(),
            })
            .collect()
    }

    pub fn round_deltas(ledger: &ScoreLedger) -> Vec<RoundDeltaRow> {
        ledger
            .round_history()
            .iter()
            .enumerate()
            .map(|(index, delta)| RoundDeltaRow {
                round: index + 1,
                deltas: delta.clone(),
                null_round: delta.is_null(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(rounds: &[&[(&str, i64)]]) -> ScoreLedger {
        let names: Vec<&str> = rounds[0].iter().map(|(n, _)| *n).collect();
        let mut ledger = ScoreLedger::new(names).unwrap();
        for round in rounds {
            let delta = round
                .iter()
                .map(|(n, v)| (PlayerName::new(*n).unwrap(), *v))
                .collect();
            ledger.record_round(delta).unwrap();
        }
        ledger
    }

    #[test]
    fn standings_sort_descending() {
        let ledger = ledger_with(&[&[("A", -20), ("B", 70), ("C", 10)]]);
        let standings = ProjectionBuilder::standings(&ledger);
        let order: Vec<(&str, i64, usize)> = standings
            .iter()
            .map(|s| (s.player.as_str(), s.score, s.rank))
            .collect();
        assert_eq!(order, [("B", 70, 1), ("C", 10, 2), ("A", -20, 3)]);
    }

    #[test]
    fn standings_ties_share_rank_in_seat_order() {
        let ledger = ledger_with(&[&[("A", 10), ("B", 50), ("C", 50), ("D", 0)]]);
        let standings = ProjectionBuilder::standings(&ledger);
        let order: Vec<(&str, usize)> = standings
            .iter()
            .map(|s| (s.player.as_str(), s.rank))
            .collect();
        assert_eq!(order, [("B", 1), ("C", 1), ("A", 3), ("D", 4)]);
    }

    #[test]
    fn standings_before_any_round() {
        let ledger = ScoreLedger::new(["A", "B"]).unwrap();
        let standings = ProjectionBuilder::standings(&ledger);
        assert!(standings.iter().all(|s| s.rank == 1 && s.score == 0));
        assert_eq!(standings[0].player, "A");
    }

    #[test]
    fn round_deltas_flag_null_rounds() {
        let ledger = ledger_with(&[&[("A", 50), ("B", -50)], &[("A", 20), ("B", 0)]]);
        let rows = ProjectionBuilder::round_deltas(&ledger);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].null_round);
        assert!(!rows[1].null_round);
        assert_eq!(rows[1].round, 2);
        assert_eq!(rows[1].deltas.get("A"), Some(20));
    }

    #[test]
    fn history_row_serializes_with_round_number() {
        let ledger = ledger_with(&[&[("A", 50), ("B", -50)]]);
        let table = ProjectionBuilder::round_history_table(&ledger);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"round":1,"scores":{"A":50,"B":-50}}]"#);
    }
}
