use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prov_core::CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("store error: {0}")]
    Store(#[from] prov_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] prov_ledger::LedgerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(CoreError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Core(CoreError::Duplicate(_)) => StatusCode::CONFLICT,
            Self::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
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
