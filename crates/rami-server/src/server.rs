use std::sync::Arc;

use rami_session::{Autosaver, SessionRegistry};
use rami_store::FileGameStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Rami score server: file-backed games behind the JSON API.
pub struct RamiServer {
    config: ServerConfig,
}

impl RamiServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the game directory and build the shared state.
    pub fn state(&self) -> ServerResult<AppState> {
        let store = FileGameStore::open(&self.config.data_dir)?;
        let registry = Arc::new(SessionRegistry::new(Arc::new(store)));
        Ok(AppState::new(registry, self.config.default_roster()?))
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        Ok(build_router(self.state()?))
    }

    /// Serve until Ctrl-C, then save every open game.
    pub async fn serve(self) -> ServerResult<()> {
        let state = self.state()?;
        let registry = Arc::clone(&state.registry);
        let autosave = self
            .config
            .autosave_interval()
            .map(|interval| Autosaver::new(Arc::clone(&registry), interval).spawn());

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            data_dir = %self.config.data_dir.display(),
            "rami server listening"
        );
        let served = axum::serve(listener, build_router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        if let Some(handle) = autosave {
            handle.stop();
        }
        let summary = tokio::task::spawn_blocking(move || registry.save_all())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;
        info!(saved = summary.saved, failed = summary.failed, "rami server stopped");
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
