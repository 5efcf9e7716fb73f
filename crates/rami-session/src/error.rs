use rami_types::GameId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("game not found: {0}")]
    GameNotFound(GameId),

    #[error("game already exists: {0}")]
    GameExists(GameId),

    #[error("session lock poisoned for game {0}")]
    Poisoned(GameId),

    #[error("ledger error: {0}")]
    Ledger(#[from] rami_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] rami_store::StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
