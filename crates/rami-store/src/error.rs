use rami_types::GameId;

/// Errors from game store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No game has been saved under this id.
    #[error("no saved game: {0}")]
    NotFound(GameId),

    /// The saved data exists but cannot be decoded.
    #[error("corrupt saved game {id}: {reason}")]
    Corrupt { id: GameId, reason: String },

    /// Serialization failure while encoding a record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot serve requests (e.g. a poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// `true` for [`StoreError::Corrupt`].
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
