//! Foundation types for Rami Ledger.
//!
//! Every other `rami-*` crate depends on these. They carry their own
//! validation so that a value, once constructed, is always well-formed:
//!
//! - [`PlayerName`]: non-blank, trimmed player identity
//! - [`PlayerRoster`]: ordered, non-empty set of unique players (seat order)
//! - [`GameId`]: explicit key used to save and load a game
//! - [`RoundDelta`]: signed score change per player for one round

pub mod error;
pub mod game;
pub mod player;
pub mod round;

pub use error::TypeError;
pub use game::GameId;
pub use player::{PlayerName, PlayerRoster};
pub use round::RoundDelta;
