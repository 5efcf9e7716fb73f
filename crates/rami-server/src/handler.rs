use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use rami_ledger::{LedgerPhase, RoundDeltaRow, RoundHistoryRow, ScoreLedger, Standing};
use rami_session::GameSession;
use rami_store::GameStore;
use rami_types::{GameId, PlayerName, PlayerRoster, RoundDelta};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub id: Option<GameId>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub players: Option<Vec<String>>,
}

/// Full view of one game.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameView {
    pub id: GameId,
    pub phase: LedgerPhase,
    pub players: Vec<PlayerName>,
    pub scores: BTreeMap<PlayerName, i64>,
    pub standings: Vec<Standing>,
    pub rounds: usize,
}

impl GameView {
    fn new(id: GameId, ledger: &ScoreLedger) -> Self {
        Self {
            id,
            phase: ledger.phase(),
            players: ledger.roster().as_slice().to_vec(),
            scores: ledger.current_scores(),
            standings: ledger.standings(),
            rounds: ledger.round_count(),
        }
    }

    fn of(session: &GameSession) -> ServerResult<Self> {
        let id = session.id().clone();
        Ok(session.with_ledger(|ledger| Self::new(id, ledger))?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameList {
    /// Games with a live session on this server.
    pub open: Vec<GameId>,
    /// Games saved in the store, open or not.
    pub saved: Vec<GameId>,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Run session and store work on the blocking pool; saves touch the disk.
async fn blocking<T, F>(work: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("request task failed: {e}")))?
}

pub async fn list_games(State(state): State<AppState>) -> ServerResult<Json<GameList>> {
    blocking(move || {
        Ok(GameList {
            open: state.registry.ids()?,
            saved: state.registry.store().list()?,
        })
    })
    .await
    .map(Json)
}

/// Start a new game. Without an id a fresh one is generated.
pub async fn create_game(
    State(state): State<AppState>,
    body: Result<Json<CreateGameRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<GameView>)> {
    let Json(req) = body?;
    let roster = match req.players {
        Some(names) => PlayerRoster::new(names)?,
        None => state.default_roster.clone(),
    };
    let id = req.id.unwrap_or_else(GameId::generate);
    let view = blocking(move || GameView::of(&*state.registry.create(id, roster)?)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_game(
    State(state): State<AppState>,
    path: Result<Path<GameId>, PathRejection>,
) -> ServerResult<Json<GameView>> {
    let Path(id) = path?;
    blocking(move || GameView::of(&*state.session(&id)?)).await.map(Json)
}

/// Record one round and return the updated standings.
pub async fn record_round(
    State(state): State<AppState>,
    path: Result<Path<GameId>, PathRejection>,
    body: Result<Json<RoundDelta>, JsonRejection>,
) -> ServerResult<Json<Vec<Standing>>> {
    let Path(id) = path?;
    let Json(delta) = body?;
    blocking(move || {
        let session = state.session(&id)?;
        session.record_round(delta)?;
        Ok(session.standings()?)
    })
    .await
    .map(Json)
}

pub async fn round_history(
    State(state): State<AppState>,
    path: Result<Path<GameId>, PathRejection>,
) -> ServerResult<Json<Vec<RoundHistoryRow>>> {
    let Path(id) = path?;
    blocking(move || Ok(state.session(&id)?.round_history_table()?))
        .await
        .map(Json)
}

pub async fn round_deltas(
    State(state): State<AppState>,
    path: Result<Path<GameId>, PathRejection>,
) -> ServerResult<Json<Vec<RoundDeltaRow>>> {
    let Path(id) = path?;
    blocking(move || Ok(state.session(&id)?.round_deltas()?))
        .await
        .map(Json)
}

/// Reset a game, optionally with a new roster.
pub async fn reset_game(
    State(state): State<AppState>,
    path: Result<Path<GameId>, PathRejection>,
    body: Result<Json<ResetRequest>, JsonRejection>,
) -> ServerResult<Json<GameView>> {
    let Path(id) = path?;
    let Json(req) = body?;
    let roster = req.players.map(PlayerRoster::new).transpose()?;
    blocking(move || {
        let session = state.session(&id)?;
        session.reset(roster)?;
        info!(game = %id, "game reset over http");
        GameView::of(&session)
    })
    .await
    .map(Json)
}
