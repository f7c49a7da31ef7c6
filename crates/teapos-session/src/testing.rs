//! Scripted backend for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::sync::Arc;

use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

pub(crate) const BASE_URL: &str = "http://pos.test";

pub(crate) const USER_JSON: &str =
    r#"{"id":7,"username":"kasir","fullname":"Kasir Satu","whatsapp":"628123","role":"employee"}"#;

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// Answers every request with `handler` and records what was sent
pub(crate) struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn count_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.ends_with(path))
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;
        (self.handler)(&request)
    }
}

pub(crate) fn respond(
    status: u16,
    headers: &[(&'static str, &str)],
    body: &str,
) -> Result<ApiResponse, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(TransportError::from)?;
        map.insert(HeaderName::from_static(name), value);
    }

    let status = StatusCode::from_u16(status)
        .map_err(|e| TransportError::Network(e.to_string()))?;
    Ok(ApiResponse::new(status, map, body.to_string()))
}

pub(crate) fn request_json(request: &ApiRequest) -> serde_json::Value {
    request
        .body
        .as_ref()
        .and_then(|body| serde_json::from_slice(body).ok())
        .unwrap_or(serde_json::Value::Null)
}
