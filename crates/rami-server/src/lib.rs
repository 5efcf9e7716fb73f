//! HTTP server for Rami Ledger.
//!
//! Exposes game sessions over a small JSON API: create a game, record
//! rounds, read scores, standings and history, and reset.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{GameList, GameView, HealthResponse};
pub use server::RamiServer;
pub use state::AppState;
