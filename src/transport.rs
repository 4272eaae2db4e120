//! HTTP boundary: the `Transport` seam, its reqwest implementation and the
//! request interceptor that attaches the bearer token.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::AUTHORIZATION, Client, Method, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::session::Session;

/// Paths under this prefix are static assets and never carry a token.
pub const ASSETS_PREFIX: &str = "/assets";

/// A request relative to the API base.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header, replacing any previous value with the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request. Only transport-level failures are errors; any HTTP
    /// status comes back as a response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Adds `Authorization: Bearer <access>` when a token is stored, except for
/// static asset paths.
pub fn authorize(request: ApiRequest, session: &Session) -> ApiRequest {
    if request.path.starts_with(ASSETS_PREFIX) {
        return request;
    }
    match session.access_token() {
        Some(token) => request.header(AUTHORIZATION.as_str(), &format!("Bearer {token}")),
        None => request,
    }
}

/// Reqwest-backed transport against one API base URL.
pub struct HttpTransport {
    client: Client,
    base: String,
}

impl HttpTransport {
    /// Without a timeout the reqwest default applies.
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        };
        Url::parse(&joined).map_err(|e| ApiError::Transport(format!("invalid url {joined}: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path)?;
        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(method = %request.method, path = %request.path, %status, "response received");
        Ok(ApiResponse { status, body })
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(error.to_string())
    } else {
        ApiError::Transport(error.to_string())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone)]
    enum Scripted {
        Reply(StatusCode, Bytes),
        Fail(String),
    }

    /// Scripted backend. Each route replays its queued answers in order and
    /// keeps repeating the last one; unscripted routes answer 404.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub(crate) fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
            self.reply_raw(method, path, status, &body.to_string());
        }

        pub(crate) fn reply_raw(&self, method: Method, path: &str, status: u16, body: &str) {
            let status = StatusCode::from_u16(status).expect("valid status");
            self.push(
                method,
                path,
                Scripted::Reply(status, Bytes::from(body.to_string())),
            );
        }

        pub(crate) fn fail(&self, method: Method, path: &str, message: &str) {
            self.push(method, path, Scripted::Fail(message.to_string()));
        }

        pub(crate) fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().expect("seen lock").clone()
        }

        pub(crate) fn count(&self, method: &Method, path: &str) -> usize {
            self.requests()
                .iter()
                .filter(|r| &r.method == method && r.path == path)
                .count()
        }

        pub(crate) fn last(&self, method: &Method, path: &str) -> Option<ApiRequest> {
            self.requests()
                .into_iter()
                .rev()
                .find(|r| &r.method == method && r.path == path)
        }

        fn push(&self, method: Method, path: &str, answer: Scripted) {
            self.routes
                .lock()
                .expect("routes lock")
                .entry((method, path.to_string()))
                .or_default()
                .push_back(answer);
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
            self.seen.lock().expect("seen lock").push(request.clone());
            let answer = {
                let mut routes = self.routes.lock().expect("routes lock");
                match routes.get_mut(&(request.method.clone(), request.path.clone())) {
                    Some(queue) if queue.len() > 1 => queue.pop_front(),
                    Some(queue) => queue.front().cloned(),
                    None => None,
                }
            };
            match answer {
                Some(Scripted::Reply(status, body)) => Ok(ApiResponse { status, body }),
                Some(Scripted::Fail(message)) => Err(ApiError::Transport(message)),
                None => Ok(ApiResponse {
                    status: StatusCode::NOT_FOUND,
                    body: Bytes::from_static(br#"{"detail":"Not found."}"#),
                }),
            }
        }
    }
}
