//! TeaPOS Core
//!
//! Wires configuration, storage, transport and the session manager into
//! a single client that front ends (such as the CLI) drive.

mod config;
mod error;
mod storefront;

pub use config::{Config, EndpointPaths};
pub use error::CoreError;
pub use storefront::Storefront;

// Re-export core components
pub use teapos_session::{
    header, AccessToken, ApiRequest, ApiResponse, AuthEndpoints, Credentials, HttpTransport,
    MemorySessionStore, Method, RefreshOutcome, RefreshToken, Registration, ReqwestTransport,
    SessionEndReason, SessionError, SessionEvent, SessionKey, SessionManager, SessionState,
    SessionStore, SqliteSessionStore, StatusCode, TransportError, UserRecord, UserRole,
};
pub use teapos_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. Output goes to stderr so command output stays clean.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
