use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rami_ledger::LedgerError;
use rami_session::SessionError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] rami_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] rami_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be extracted (bad JSON body, bad path).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(SessionError::GameNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::GameExists(_)) => StatusCode::CONFLICT,
            Self::Session(SessionError::Ledger(LedgerError::UnknownPlayer(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Session(SessionError::Ledger(
                LedgerError::InvalidConfiguration(_)
                | LedgerError::IncompleteRound { .. }
                | LedgerError::ScoreOverflow { .. },
            )) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
