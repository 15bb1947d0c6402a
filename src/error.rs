// src/error.rs
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the transport and orchestration layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("SpreadsheetId is required")]
    MissingSpreadsheetId,

    #[error("invalid spreadsheet url: {0}")]
    InvalidSpreadsheetUrl(String),

    #[error("failed to build request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors raised while decoding a gviz response body.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("response does not contain a setResponse(...) payload")]
    MissingWrapper,

    #[error("payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("query failed: {0}")]
    Query(String),
}
