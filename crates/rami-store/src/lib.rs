//! Persistence for Rami Ledger.
//!
//! A game is saved as a single JSON [`LedgerRecord`] keyed by its
//! [`GameId`]. The store never interprets scores; it only moves records in
//! and out of a backend.
//!
//! # Storage Backends
//!
//! All backends implement the [`GameStore`] trait:
//!
//! - [`InMemoryGameStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileGameStore`] -- one `<game-id>.json` file per game in a directory
//!
//! # Design Rules
//!
//! 1. A missing game is [`StoreError::NotFound`], never an empty record.
//! 2. Undecodable data is [`StoreError::Corrupt`] so callers can start fresh.
//! 3. File writes go to a temporary file first and are renamed into place.
//!
//! [`LedgerRecord`]: rami_ledger::LedgerRecord
//! [`GameId`]: rami_types::GameId

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use file::FileGameStore;
pub use memory::InMemoryGameStore;
pub use traits::GameStore;
