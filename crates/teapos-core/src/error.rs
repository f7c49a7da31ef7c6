//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] teapos_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] teapos_session::SessionError),

    #[error("Transport error: {0}")]
    Transport(#[from] teapos_session::TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
