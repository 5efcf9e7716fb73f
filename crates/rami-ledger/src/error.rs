use rami_types::TypeError;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] TypeError),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("round is missing scores for: {}", .missing.join(", "))]
    IncompleteRound { missing: Vec<String> },

    #[error("score overflow for player {player}")]
    ScoreOverflow { player: String },

    #[error("corrupt state: {0}")]
    CorruptState(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
