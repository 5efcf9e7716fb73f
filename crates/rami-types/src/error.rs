use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("player name must not be blank")]
    BlankPlayerName,

    #[error("duplicate player name: {0}")]
    DuplicatePlayer(String),

    #[error("a game needs at least one player")]
    EmptyRoster,

    #[error("invalid game id {id:?}: {reason}")]
    InvalidGameId { id: String, reason: &'static str },
}
