//! Game sessions for Rami Ledger.
//!
//! A [`GameSession`] binds one [`ScoreLedger`](rami_ledger::ScoreLedger) to an
//! explicit [`GameId`](rami_types::GameId) and a [`GameStore`](rami_store::GameStore).
//! Every operation on a session runs under the session's lock, so request
//! handlers and the [`Autosaver`] never interleave on the same game.

pub mod autosave;
pub mod error;
pub mod registry;
pub mod session;

pub use autosave::{AutosaveHandle, Autosaver};
pub use error::{SessionError, SessionResult};
pub use registry::{SaveSummary, SessionRegistry};
pub use session::{GameSession, SessionOrigin};

// Re-export key types
pub use rami_ledger::{
    LedgerPhase, RoundDeltaRow, RoundHistoryRow, ScoreLedger, Standing,
};
pub use rami_types::{GameId, PlayerName, PlayerRoster, RoundDelta};
