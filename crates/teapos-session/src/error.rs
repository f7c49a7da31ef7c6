//! Session error types

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No access token available")]
    Unauthenticated,

    #[error("Authentication failed")]
    ReauthRequired,

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Response is missing the {0} header")]
    MissingToken(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] teapos_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Network error: {0}")]
    Network(String),
}
