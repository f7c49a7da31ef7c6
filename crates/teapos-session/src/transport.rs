//! HTTP transport
//!
//! The session manager never talks to `reqwest` directly; it goes through
//! `HttpTransport` so tests can script the backend.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TransportError;
use crate::session::AccessToken;

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// A request as handed to the transport
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` as the JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> serde_json::Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    /// Bearer token from the `Authorization` header, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Attach the auth headers. These replace any caller-supplied values.
    pub(crate) fn authorized(mut self, token: &AccessToken) -> Result<Self, TransportError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))?;
        value.set_sensitive(true);

        self.headers.insert(AUTHORIZATION, value);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text. Empty and non-ASCII values read as absent.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Decode the body, unwrapping the backend's `{"success": .., "data": ..}`
    /// envelope when present
    pub fn payload<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match serde_json::from_slice::<Payload<T>>(&self.body)? {
            Payload::Enveloped { data } => Ok(data),
            Payload::Bare(value) => Ok(value),
        }
    }

    /// `message` from an error body such as `{"success": false, "message": ".."}`
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .map(|body| body.message)
            .filter(|message| !message.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Enveloped { data: T },
    Bare(T),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Production transport on top of `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// `timeout` of `None` keeps reqwest's default (no overall timeout)
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("teapos/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::trace!(status = %status, bytes = body.len(), "Received response");

        Ok(ApiResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserRecord;

    const USER_JSON: &str =
        r#"{"id":7,"username":"kasir","fullname":"Kasir Satu","whatsapp":"628123","role":"employee"}"#;

    #[test]
    fn test_authorized_overrides_caller_headers() {
        let request = ApiRequest::get("http://localhost/menu")
            .header(AUTHORIZATION, HeaderValue::from_static("Basic abc"))
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .header(
                HeaderName::from_static("x-outlet"),
                HeaderValue::from_static("3"),
            )
            .authorized(&AccessToken::new("A1"))
            .unwrap();

        assert_eq!(request.bearer_token(), Some("A1"));
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.headers["x-outlet"], "3");
    }

    #[test]
    fn test_authorized_rejects_unencodable_token() {
        let result = ApiRequest::get("http://localhost/menu").authorized(&AccessToken::new("bad\ntoken"));
        assert!(matches!(result, Err(TransportError::InvalidHeader(_))));
    }

    #[test]
    fn test_payload_accepts_bare_and_enveloped_bodies() {
        let bare = ApiResponse::new(StatusCode::OK, HeaderMap::new(), USER_JSON);
        let user: UserRecord = bare.payload().unwrap();
        assert_eq!(user.username, "kasir");

        let wrapped = ApiResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            format!(r#"{{"success":true,"data":{}}}"#, USER_JSON),
        );
        let user: UserRecord = wrapped.payload().unwrap();
        assert_eq!(user.id, 7);
    }

    #[test]
    fn test_error_message() {
        let response = ApiResponse::new(
            StatusCode::UNAUTHORIZED,
            HeaderMap::new(),
            r#"{"success":false,"message":"Invalid credentials"}"#,
        );
        assert_eq!(response.error_message().as_deref(), Some("Invalid credentials"));

        let response = ApiResponse::new(StatusCode::BAD_GATEWAY, HeaderMap::new(), "<html>");
        assert_eq!(response.error_message(), None);
    }

    #[test]
    fn test_empty_header_reads_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-access-token", HeaderValue::from_static(""));
        let response = ApiResponse::new(StatusCode::OK, headers, Bytes::new());

        assert_eq!(response.header_str("x-access-token"), None);
    }
}
