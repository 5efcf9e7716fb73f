//! Score ledger for Rami Ledger.
//!
//! This crate is the heart of the system. It provides:
//! - [`ScoreLedger`], the authoritative record of players, their cumulative
//!   score histories, and the raw per-round deltas
//! - [`LedgerRecord`], the persisted `{"players", "roundHistory"}` format
//! - Projection builders (leaderboard, round history table, per-round deltas)
//! - Deterministic replay of raw deltas
//! - Record validation (alignment, completeness, drift)

pub mod error;
pub mod ledger;
pub mod projection;
pub mod record;
pub mod replay;
pub mod validation;

pub use error::LedgerError;
pub use ledger::{LedgerPhase, Player, ScoreLedger};
pub use projection::{ProjectionBuilder, RoundDeltaRow, RoundHistoryRow, Standing};
pub use record::{LedgerRecord, PlayerHistories};
pub use replay::ReplayEngine;
pub use validation::{RecordValidator, ValidationReport, Violation, ViolationKind};

pub use rami_types::{GameId, PlayerName, PlayerRoster, RoundDelta};
