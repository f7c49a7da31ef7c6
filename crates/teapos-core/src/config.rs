//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use teapos_session::{
    resolve_url, AuthEndpoints, DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_REFRESH_PATH,
    DEFAULT_REGISTER_PATH,
};

use crate::error::CoreError;
use crate::Result;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:3000";

const ENV_DATA_DIR: &str = "TEAPOS_DATA_DIR";
const ENV_BACKEND_URL: &str = "TEAPOS_BACKEND_URL";
const ENV_REQUEST_TIMEOUT: &str = "TEAPOS_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file holding the session
    pub database_path: PathBuf,
    /// Base URL of the TeaPOS backend
    pub backend_url: String,
    /// Auth endpoint paths, relative to `backend_url`
    pub endpoints: EndpointPaths,
    /// Overall request timeout. `None` leaves the HTTP client's default.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPaths {
    pub login: String,
    pub register: String,
    pub refresh: String,
    pub logout: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_string(),
            register: DEFAULT_REGISTER_PATH.to_string(),
            refresh: DEFAULT_REFRESH_PATH.to_string(),
            logout: DEFAULT_LOGOUT_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("teapos.db"),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            endpoints: EndpointPaths::default(),
            request_timeout_secs: None,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("TeaPOS"))
            .unwrap_or_else(|| PathBuf::from(".teapos"))
    }

    /// Default configuration with overrides from `TEAPOS_*` environment variables.
    ///
    /// Not validated, so callers can layer their own overrides first.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);
        let mut config = Self::new(data_dir);

        if let Some(url) = lookup(ENV_BACKEND_URL) {
            config.backend_url = url;
        }

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                CoreError::Config(format!("{} must be a number of seconds, got {:?}", ENV_REQUEST_TIMEOUT, raw))
            })?;
            config.request_timeout_secs = Some(secs);
        }

        Ok(config)
    }

    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.database_path = data_dir.join("teapos.db");
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.auth_endpoints().map(|_| ())
    }

    pub fn auth_endpoints(&self) -> Result<AuthEndpoints> {
        AuthEndpoints::with_paths(
            &self.backend_url,
            &self.endpoints.login,
            &self.endpoints.register,
            &self.endpoints.refresh,
            &self.endpoints.logout,
        )
        .map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Absolute URL for an API path on the backend
    pub fn api_url(&self, path: &str) -> Result<String> {
        resolve_url(&self.backend_url, path)
            .map(String::from)
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Platform data directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/teapos"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/teapos/teapos.db"));
        assert_eq!(config.backend_url, "http://127.0.0.1:3000");
        assert_eq!(config.request_timeout(), None);

        let endpoints = config.auth_endpoints().unwrap();
        assert_eq!(endpoints.refresh.as_str(), "http://127.0.0.1:3000/auth/refresh");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TEAPOS_DATA_DIR", "/srv/pos"),
            ("TEAPOS_BACKEND_URL", "https://pos.example.com/api"),
            ("TEAPOS_REQUEST_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/srv/pos/teapos.db"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(
            config.api_url("/menu").unwrap(),
            "https://pos.example.com/api/menu"
        );
    }

    #[test]
    fn test_invalid_env_values() {
        let result = Config::from_lookup(lookup_from(&[("TEAPOS_REQUEST_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(CoreError::Config(_))));

        let config = Config::from_lookup(lookup_from(&[("TEAPOS_BACKEND_URL", "localhost")])).unwrap();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_override_replaces_invalid_env_url() {
        let config = Config::from_lookup(lookup_from(&[("TEAPOS_BACKEND_URL", "localhost")]))
            .unwrap()
            .with_backend_url("http://10.0.0.2:3000");

        assert!(config.validate().is_ok());
        assert_eq!(config.api_url("/menu").unwrap(), "http://10.0.0.2:3000/menu");
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config::new(PathBuf::from("/tmp/teapos")).with_backend_url("http://10.0.0.2:3000");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.backend_url, "http://10.0.0.2:3000");
        assert_eq!(parsed.endpoints, EndpointPaths::default());
    }
}
