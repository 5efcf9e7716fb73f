use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all game endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/games", get(handler::list_games).post(handler::create_game))
        .route("/v1/games/:id", get(handler::get_game))
        .route("/v1/games/:id/rounds", get(handler::round_deltas).post(handler::record_round))
        .route("/v1/games/:id/history", get(handler::round_history))
        .route("/v1/games/:id/reset", post(handler::reset_game))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
