//! Backend authentication endpoints

use url::Url;

use crate::error::SessionError;
use crate::Result;

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_REGISTER_PATH: &str = "/auth/register";
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

/// Fully resolved URLs of the auth endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login: Url,
    pub register: Url,
    pub refresh: Url,
    pub logout: Url,
}

impl AuthEndpoints {
    /// Endpoints at their default paths under `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_paths(
            base_url,
            DEFAULT_LOGIN_PATH,
            DEFAULT_REGISTER_PATH,
            DEFAULT_REFRESH_PATH,
            DEFAULT_LOGOUT_PATH,
        )
    }

    pub fn with_paths(
        base_url: &str,
        login: &str,
        register: &str,
        refresh: &str,
        logout: &str,
    ) -> Result<Self> {
        Ok(Self {
            login: resolve_url(base_url, login)?,
            register: resolve_url(base_url, register)?,
            refresh: resolve_url(base_url, refresh)?,
            logout: resolve_url(base_url, logout)?,
        })
    }
}

/// Append `path` to `base_url`.
///
/// Unlike `Url::join`, a base with its own path prefix keeps it:
/// `http://host/api` + `/auth/login` is `http://host/api/auth/login`.
pub fn resolve_url(base_url: &str, path: &str) -> Result<Url> {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let joined = format!("{}/{}", base, path);

    let url =
        Url::parse(&joined).map_err(|e| SessionError::InvalidUrl(format!("{joined}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SessionError::InvalidUrl(format!(
            "{joined}: unsupported scheme {}",
            url.scheme()
        )));
    }

    Ok(url)
}
