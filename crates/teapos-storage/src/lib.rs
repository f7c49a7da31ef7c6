//! TeaPOS Storage Layer
//!
//! SQLite-backed key-value persistence for client state.
//! Multi-key writes are transactional.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
