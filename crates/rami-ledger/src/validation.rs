use std::collections::HashSet;

use crate::record::LedgerRecord;

/// Result of auditing a persisted record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub player_count: usize,
    pub round_count: usize,
    pub players_unique: bool,
    pub histories_aligned: bool,
    pub rounds_complete: bool,
    pub histories_consistent: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific problem found in a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// 1-based round, when the problem is tied to one.
    pub round: Option<usize>,
    pub player: Option<String>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    EmptyRoster,
    DuplicatePlayer,
    UnknownPlayer,
    IncompleteRound,
    MisalignedHistory,
    DriftedHistory,
}

/// Record auditor.
///
/// Unlike [`ScoreLedger::from_record`](crate::ScoreLedger::from_record),
/// which stops at the first structural problem, the validator walks the
/// whole record and reports everything it finds.
pub struct RecordValidator;

impl RecordValidator {
    pub fn validate(record: &LedgerRecord) -> ValidationReport {
        let mut violations = Vec::new();
        let mut players_unique = true;
        let mut histories_aligned = true;
        let mut rounds_complete = true;
        let mut histories_consistent = true;
        let round_count = record.round_history.len();

        if record.players.is_empty() {
            players_unique = false;
            violations.push(Violation {
                round: None,
                player: None,
                kind: ViolationKind::EmptyRoster,
                description: "record has no players".into(),
            });
        }

        let mut seen = HashSet::new();
        for (name, history) in record.players.iter() {
            if !seen.insert(name.as_str()) {
                players_unique = false;
                violations.push(Violation {
                    round: None,
                    player: Some(name.to_string()),
                    kind: ViolationKind::DuplicatePlayer,
                    description: format!("player {name} appears more than once"),
                });
            }
            if history.len() != round_count {
                histories_aligned = false;
                violations.push(Violation {
                    round: None,
                    player: Some(name.to_string()),
                    kind: ViolationKind::MisalignedHistory,
                    description: format!(
                        "{} history entries for {round_count} rounds",
                        history.len()
                    ),
                });
            }
        }

        for (index, round) in record.round_history.iter().enumerate() {
            let round_no = index + 1;
            for name in round.players() {
                if record.players.get(name.as_str()).is_none() {
                    rounds_complete = false;
                    violations.push(Violation {
                        round: Some(round_no),
                        player: Some(name.to_string()),
                        kind: ViolationKind::UnknownPlayer,
                        description: format!("round {round_no} references unknown player {name}"),
                    });
                }
            }
            for (name, _) in record.players.iter() {
                if !round.contains(name.as_str()) {
                    rounds_complete = false;
                    violations.push(Violation {
                        round: Some(round_no),
                        player: Some(name.to_string()),
                        kind: ViolationKind::IncompleteRound,
                        description: format!("round {round_no} has no score for {name}"),
                    });
                }
            }
        }

        for (name, history) in record.players.iter() {
            let mut running: i128 = 0;
            for (index, round) in record.round_history.iter().enumerate() {
                running += i128::from(round.get(name.as_str()).unwrap_or(0));
                let Some(stored) = history.get(index) else {
                    break;
                };
                if i128::from(*stored) != running {
                    histories_consistent = false;
                    violations.push(Violation {
                        round: Some(index + 1),
                        player: Some(name.to_string()),
                        kind: ViolationKind::DriftedHistory,
                        description: format!(
                            "stored total {stored} differs from sum of deltas {running}"
                        ),
                    });
                    break;
                }
            }
        }

        ValidationReport {
            player_count: record.players.len(),
            round_count,
            players_unique,
            histories_aligned,
            rounds_complete,
            histories_consistent,
            violations,
        }
    }
}
