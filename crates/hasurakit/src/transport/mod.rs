//! Transport trait and implementations for reaching the admin API.
//!
//! This module provides the [`Transport`] trait and implementations for
//! sending admin requests. The primary implementation is
//! [`http::UreqTransport`].
//!
//! # Testing
//!
//! Use [`MockTransport`] for testing without network access:
//!
//! ```
//! use hasurakit::transport::{HttpRequest, MockTransport, Transport};
//!
//! let mock = MockTransport::new();
//! mock.respond(400, r#"{"error":"already exists"}"#);
//!
//! let request = HttpRequest::json("http://hasura/v1/query", br#"{"type":"x"}"#.to_vec());
//! let response = mock.post(&request, None).unwrap();
//! assert_eq!(response.status, 400);
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Header carrying the admin secret.
pub const ADMIN_SECRET_HEADER: &str = "X-Hasura-Admin-Secret";

/// An outbound POST request.
#[derive(Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// A JSON POST with the content type already set.
    pub fn json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> = self
            .headers
            .iter()
            .map(|(n, v)| {
                if n.eq_ignore_ascii_case(ADMIN_SECRET_HEADER) {
                    (n.as_str(), "***")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

/// A fully drained response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Transport trait for sending admin requests.
///
/// Implementations must read the whole response body before returning,
/// on success and on error statuses alike.
pub trait Transport: Send + Sync {
    /// POST a request, giving up after `timeout` when one is set.
    fn post(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse>;
}

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: HttpRequest,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    /// The JSON body, or `Null` if it was not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.request.body).unwrap_or(serde_json::Value::Null)
    }

    /// The envelope `type` field.
    pub fn request_type(&self) -> Option<String> {
        self.json()
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_string)
    }
}

#[derive(Debug)]
enum MockReply {
    Response(HttpResponse),
    Failure(String),
}

/// Mock transport for testing without network access.
///
/// Records every request and replays scripted replies in order. Once the
/// script is exhausted every call gets `200 {}`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Create a new mock transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        lock(&self.replies).push_back(MockReply::Response(HttpResponse::new(status, body)));
        self
    }

    /// Queue a `200` response with the given body.
    pub fn respond_ok(&self, body: impl Into<String>) -> &Self {
        self.respond(200, body)
    }

    /// Queue a transport failure (no status received).
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        lock(&self.replies).push_back(MockReply::Failure(message.into()));
        self
    }

    /// All requests sent so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Envelope types of the requests sent so far, in order.
    pub fn request_types(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(RecordedRequest::request_type)
            .collect()
    }
}

impl Transport for MockTransport {
    fn post(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse> {
        lock(&self.requests).push(RecordedRequest {
            request: request.clone(),
            timeout,
        });

        match lock(&self.replies).pop_front() {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Failure(message)) => Err(Error::transport(message)),
            None => Ok(HttpResponse::new(200, "{}")),
        }
    }
}
