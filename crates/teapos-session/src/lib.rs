//! TeaPOS Session Management
//!
//! Owns the authenticated identity of the client:
//! - A Session is the access token, refresh token and cached user record
//! - The three are written together and cleared together
//! - Authenticated requests are retried once after a silent token refresh
//! - A failed refresh ends the session

mod endpoints;
mod error;
mod manager;
mod session;
mod store;
mod transport;

#[cfg(test)]
mod testing;

pub use endpoints::{
    resolve_url, AuthEndpoints, DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_REFRESH_PATH,
    DEFAULT_REGISTER_PATH,
};
pub use error::{SessionError, TransportError};
pub use manager::{
    RefreshOutcome, SessionEndReason, SessionEvent, SessionManager, SessionState,
    ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER,
};
pub use session::{
    AccessToken, Credentials, RefreshToken, Registration, Session, UserRecord, UserRole,
};
pub use store::{MemorySessionStore, SessionKey, SessionStore, SqliteSessionStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

pub use reqwest::{header, Method, StatusCode};

pub type Result<T> = std::result::Result<T, SessionError>;
