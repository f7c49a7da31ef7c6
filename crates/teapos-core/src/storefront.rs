//! Main client state container

use std::sync::Arc;

use teapos_session::{
    ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport, SessionManager,
    SessionState, SessionStore, SqliteSessionStore,
};
use teapos_storage::Database;

use crate::config::Config;
use crate::Result;

/// Client instance
///
/// Owns the session manager and the database behind it. All credential
/// handling goes through `session_manager()`.
pub struct Storefront {
    config: Config,
    session_manager: SessionManager,
}

impl Storefront {
    /// Open the on-disk database and talk to the configured backend over HTTP
    pub fn new(config: Config) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let transport = ReqwestTransport::new(config.request_timeout())?;

        Self::with_parts(config, db, Arc::new(transport))
    }

    /// Build from an existing database and transport
    pub fn with_parts(
        config: Config,
        db: Database,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let endpoints = config.auth_endpoints()?;
        let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(db));
        let session_manager = SessionManager::new(store, transport, endpoints);

        Ok(Self {
            config,
            session_manager,
        })
    }

    /// Check the persisted session
    pub fn initialize(&self) -> Result<SessionState> {
        let state = self.session_manager.initialize()?;

        tracing::info!(
            backend_url = %self.config.backend_url,
            database = %self.config.database_path.display(),
            "Storefront initialized"
        );

        Ok(state)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    /// Request for a backend path such as `/menu`
    pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest> {
        Ok(ApiRequest::new(method, self.config.api_url(path)?))
    }

    /// Send `request` with the current session's credentials
    pub async fn fetch(&self, request: ApiRequest) -> Result<ApiResponse> {
        Ok(self.session_manager.authenticated_fetch(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use teapos_session::header::{HeaderMap, HeaderValue};
    use teapos_session::{Credentials, StatusCode, TransportError};

    const USER_JSON: &str =
        r#"{"id":1,"username":"owner","fullname":"Pemilik","whatsapp":"62811","role":"admin"}"#;

    /// Backend that issues A1 on login and accepts only A1
    struct StubBackend;

    #[async_trait]
    impl HttpTransport for StubBackend {
        async fn send(&self, request: ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
            let mut headers = HeaderMap::new();
            if request.url.ends_with("/auth/login") {
                headers.insert("x-access-token", HeaderValue::from_static("A1"));
                headers.insert("x-refresh-token", HeaderValue::from_static("R1"));
                return Ok(ApiResponse::new(StatusCode::OK, headers, USER_JSON));
            }
            if request.url.ends_with("/auth/logout") {
                return Ok(ApiResponse::new(StatusCode::OK, headers, ""));
            }

            let status = match request.bearer_token() {
                Some("A1") => StatusCode::OK,
                _ => StatusCode::UNAUTHORIZED,
            };
            Ok(ApiResponse::new(status, headers, "[]"))
        }
    }

    fn open(dir: &std::path::Path) -> Storefront {
        let config = Config::new(dir.to_path_buf()).with_backend_url("http://pos.test");
        let db = Database::open(&config.database_path).unwrap();
        Storefront::with_parts(config, db, Arc::new(StubBackend)).unwrap()
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let storefront = open(dir.path());
            assert_eq!(storefront.initialize().unwrap(), SessionState::Unauthenticated);
            storefront
                .session_manager()
                .login(&Credentials::new("owner", "pw"))
                .await
                .unwrap();
        }

        let storefront = open(dir.path());
        assert_eq!(storefront.initialize().unwrap(), SessionState::Authenticated);
        assert_eq!(
            storefront.session_manager().current_user().unwrap().username,
            "owner"
        );

        let request = storefront.request(Method::GET, "/menu").unwrap();
        assert_eq!(request.url, "http://pos.test/menu");
        let response = storefront.fetch(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        storefront.session_manager().logout().await;
        assert!(!open(dir.path()).session_manager().is_authenticated());
    }

    #[test]
    fn test_new_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("teapos");
        let config = Config::new(data_dir.clone());

        let storefront = Storefront::new(config).unwrap();

        assert!(data_dir.join("teapos.db").exists());
        assert_eq!(storefront.initialize().unwrap(), SessionState::Unauthenticated);
    }
}
