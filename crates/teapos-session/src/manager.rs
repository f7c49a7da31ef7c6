//! Session Manager
//!
//! Acquires, persists, renews and discards the client's credentials, and
//! gates authenticated requests through a retry-once-after-refresh policy.

use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::endpoints::AuthEndpoints;
use crate::error::SessionError;
use crate::session::{AccessToken, Credentials, RefreshToken, Registration, Session, UserRecord};
use crate::store::{SessionKey, SessionStore};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::Result;

pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

const EVENT_CAPACITY: usize = 16;

/// Result of trying to renew the access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token was obtained and stored
    Refreshed(AccessToken),
    /// Nothing to refresh with; no request was made
    NoRefreshTokenAvailable,
    /// The backend refused, was unreachable, or answered without a token
    RefreshRejected,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// Explicit logout
    LoggedOut,
    /// A request was rejected and the token could not be renewed
    RefreshFailed,
}

/// Lifecycle notifications for the UI layer
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started { user: UserRecord },
    Refreshed,
    Ended { reason: SessionEndReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Unauthenticated,
}

#[derive(Serialize)]
struct RefreshTokenBody<'a> {
    refresh_token: &'a str,
}

enum Renewal {
    Renewed(AccessToken),
    /// The session changed while the backend was answering
    Superseded,
    Rejected,
}

#[derive(Deserialize)]
struct RefreshedUser {
    user: UserRecord,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn HttpTransport>,
    endpoints: Arc<AuthEndpoints>,
    /// Held for the whole refresh exchange so only one runs at a time
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
    /// Held across multi-step store updates that must not interleave
    write_lock: Arc<Mutex<()>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
        endpoints: AuthEndpoints,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            store,
            transport,
            endpoints: Arc::new(endpoints),
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
            write_lock: Arc::new(Mutex::new(())),
            events,
        }
    }

    /// Check the stored session on startup.
    ///
    /// A store holding only part of a session (for example an access token
    /// without its refresh token) is cleared.
    pub fn initialize(&self) -> Result<SessionState> {
        let _writes = self.write_lock.lock();

        let access = self.store.get(SessionKey::AccessToken)?;
        let refresh = self.store.get(SessionKey::RefreshToken)?;

        let state = match (access.is_some(), refresh.is_some()) {
            (true, true) => SessionState::Authenticated,
            (false, false) => {
                if self.store.get(SessionKey::User)?.is_some() {
                    self.store.clear()?;
                }
                SessionState::Unauthenticated
            }
            (has_access, has_refresh) => {
                tracing::warn!(has_access, has_refresh, "Discarding partial session");
                self.store.clear()?;
                SessionState::Unauthenticated
            }
        };

        tracing::info!(state = ?state, "Initialized session");

        Ok(state)
    }

    /// Receive session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// True when an access token is stored. No expiry check, no network.
    pub fn is_authenticated(&self) -> bool {
        match self.store.get(SessionKey::AccessToken) {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read access token");
                false
            }
        }
    }

    /// Cached user record. Missing or unreadable records read as `None`.
    pub fn current_user(&self) -> Option<UserRecord> {
        let raw = match self.store.get(SessionKey::User) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read user record");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed user record");
                None
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<UserRecord> {
        let request = ApiRequest::post(self.endpoints.login.as_str()).json(credentials)?;
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            tracing::info!(
                status = %response.status(),
                username = %credentials.username,
                "Login rejected"
            );
            return Err(rejected(&response, "Login failed"));
        }

        let access_token = response
            .header_str(ACCESS_TOKEN_HEADER)
            .map(AccessToken::new)
            .ok_or(SessionError::MissingToken(ACCESS_TOKEN_HEADER))?;
        let refresh_token = response
            .header_str(REFRESH_TOKEN_HEADER)
            .map(RefreshToken::new)
            .ok_or(SessionError::MissingToken(REFRESH_TOKEN_HEADER))?;
        let user: UserRecord = response.payload()?;

        let session = Session::new(access_token, refresh_token, user);
        self.save_session(&session)?;

        tracing::info!(
            user_id = session.user.id,
            username = %session.user.username,
            "Logged in"
        );

        let user = session.user;
        self.emit(SessionEvent::Started { user: user.clone() });

        Ok(user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<UserRecord> {
        let request = ApiRequest::post(self.endpoints.register.as_str()).json(registration)?;
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(rejected(&response, "Registration failed"));
        }

        let user: UserRecord = response.payload()?;

        tracing::info!(user_id = user.id, username = %user.username, "Registered account");

        Ok(user)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Never fails; every failure is folded into the outcome.
    pub async fn refresh_token(&self) -> RefreshOutcome {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Invalidate the session on the backend if possible, then clear it
    /// locally. Always leaves the store empty.
    pub async fn logout(&self) {
        self.end_session(SessionEndReason::LoggedOut).await;
    }

    /// Send `request` with the stored access token.
    ///
    /// A 401 triggers one token refresh and one retry; the retry's response
    /// is returned as-is. If the refresh fails the session is ended and
    /// `SessionError::ReauthRequired` is returned.
    pub async fn authenticated_fetch(&self, request: ApiRequest) -> Result<ApiResponse> {
        let access_token = self
            .stored_access_token()?
            .ok_or(SessionError::Unauthenticated)?;

        let response = self
            .transport
            .send(request.clone().authorized(&access_token)?)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(url = %request.url, "Access token rejected, refreshing");

        match self.renew_after_rejection(&access_token).await {
            Some(new_token) => {
                let retry = request.authorized(&new_token)?;
                Ok(self.transport.send(retry).await?)
            }
            None => Err(SessionError::ReauthRequired),
        }
    }

    /// Find a usable token for a request that was rejected while using `stale`.
    ///
    /// Callers queue on the gate; whoever gets in after a successful
    /// refresh finds a different token stored and reuses it. The session is
    /// ended only while the rejected session is still the stored one.
    async fn renew_after_rejection(&self, stale: &AccessToken) -> Option<AccessToken> {
        let _gate = self.refresh_gate.lock().await;

        match self.stored_access_token() {
            Ok(Some(current)) if current != *stale => {
                tracing::debug!("Access token already renewed by another request");
                return Some(current);
            }
            Ok(None) => {
                tracing::debug!("Session ended while waiting to refresh");
                return None;
            }
            Ok(Some(_)) | Err(_) => {}
        }

        let outcome = self.refresh_locked().await;
        if let RefreshOutcome::Refreshed(token) = &outcome {
            return Some(token.clone());
        }

        if let Some(current) = self.replacement_token(stale) {
            tracing::debug!("New session stored during refresh, using it");
            return Some(current);
        }

        tracing::warn!(outcome = ?outcome, "Could not renew session");
        self.end_session(SessionEndReason::RefreshFailed).await;
        None
    }

    async fn refresh_locked(&self) -> RefreshOutcome {
        let refresh_token = match self.store.get(SessionKey::RefreshToken) {
            Ok(Some(token)) => RefreshToken::new(token),
            Ok(None) => {
                tracing::debug!("No refresh token stored");
                return RefreshOutcome::NoRefreshTokenAvailable;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read refresh token");
                return RefreshOutcome::RefreshRejected;
            }
        };

        match self.request_refresh(&refresh_token).await {
            Ok(Renewal::Renewed(access_token)) => {
                tracing::info!("Access token refreshed");
                self.emit(SessionEvent::Refreshed);
                RefreshOutcome::Refreshed(access_token)
            }
            Ok(Renewal::Superseded) => match self.stored_access_token() {
                Ok(Some(current)) => RefreshOutcome::Refreshed(current),
                Ok(None) => RefreshOutcome::NoRefreshTokenAvailable,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read access token");
                    RefreshOutcome::RefreshRejected
                }
            },
            Ok(Renewal::Rejected) => RefreshOutcome::RefreshRejected,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                RefreshOutcome::RefreshRejected
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &RefreshToken) -> Result<Renewal> {
        let request = ApiRequest::post(self.endpoints.refresh.as_str()).json(&RefreshTokenBody {
            refresh_token: refresh_token.as_str(),
        })?;
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            tracing::warn!(status = %response.status(), "Refresh token rejected");
            return Ok(Renewal::Rejected);
        }

        let refreshed: RefreshedUser = response.payload()?;
        let Some(access_token) = response.header_str(ACCESS_TOKEN_HEADER).map(AccessToken::new)
        else {
            tracing::warn!("Refresh response carried no access token");
            return Ok(Renewal::Rejected);
        };
        let user_json = serde_json::to_string(&refreshed.user)?;

        let _writes = self.write_lock.lock();

        // The session may have ended or been replaced while we were waiting
        if self.session_replaced(Some(refresh_token))? {
            tracing::debug!("Session changed during refresh, discarding new token");
            return Ok(Renewal::Superseded);
        }

        self.store.replace(&[
            (SessionKey::AccessToken, access_token.as_str()),
            (SessionKey::User, &user_json),
        ])?;

        Ok(Renewal::Renewed(access_token))
    }

    async fn end_session(&self, reason: SessionEndReason) {
        let refresh_token = match self.store.get(SessionKey::RefreshToken) {
            Ok(token) => token.map(RefreshToken::new),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read refresh token");
                None
            }
        };

        if let Some(token) = &refresh_token {
            self.notify_logout(token).await;
        }

        {
            let _writes = self.write_lock.lock();

            // A failed refresh must not take down a session stored meanwhile
            if reason == SessionEndReason::RefreshFailed
                && matches!(self.session_replaced(refresh_token.as_ref()), Ok(true))
            {
                tracing::debug!("Session replaced while ending, keeping it");
                return;
            }

            if let Err(e) = self.store.clear() {
                tracing::error!(error = %e, "Failed to clear session store");
            }
        }

        tracing::info!(reason = ?reason, "Session ended");
        self.emit(SessionEvent::Ended { reason });
    }

    /// Best effort; the outcome does not matter
    async fn notify_logout(&self, refresh_token: &RefreshToken) {
        let request = match ApiRequest::post(self.endpoints.logout.as_str()).json(&RefreshTokenBody {
            refresh_token: refresh_token.as_str(),
        }) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping logout notification");
                return;
            }
        };

        match self.transport.send(request).await {
            Ok(response) if !response.is_success() => {
                tracing::debug!(status = %response.status(), "Backend declined logout");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "Ignoring logout notification failure"),
        }
    }

    fn stored_access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self
            .store
            .get(SessionKey::AccessToken)?
            .map(AccessToken::new))
    }

    /// Stored access token when it differs from `stale`
    fn replacement_token(&self, stale: &AccessToken) -> Option<AccessToken> {
        match self.stored_access_token() {
            Ok(Some(current)) if current != *stale => Some(current),
            _ => None,
        }
    }

    /// True when the stored refresh token is no longer `expected`
    fn session_replaced(&self, expected: Option<&RefreshToken>) -> Result<bool> {
        let current = self.store.get(SessionKey::RefreshToken)?;
        Ok(current.as_deref() != expected.map(RefreshToken::as_str))
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)?;

        let _writes = self.write_lock.lock();
        self.store.replace(&[
            (SessionKey::AccessToken, session.access_token.as_str()),
            (SessionKey::RefreshToken, session.refresh_token.as_str()),
            (SessionKey::User, &user_json),
        ])?;

        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // Err only means nobody is listening
        let _ = self.events.send(event);
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transport: Arc::clone(&self.transport),
            endpoints: Arc::clone(&self.endpoints),
            refresh_gate: Arc::clone(&self.refresh_gate),
            write_lock: Arc::clone(&self.write_lock),
            events: self.events.clone(),
        }
    }
}

fn rejected(response: &ApiResponse, fallback: &str) -> SessionError {
    SessionError::Rejected {
        status: response.status(),
        message: response
            .error_message()
            .unwrap_or_else(|| fallback.to_string()),
    }
}
