//! Outbound request description.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors building a [`CallRequest`].
#[derive(Debug, Error)]
pub enum RequestError {
    /// The HTTP method is empty or not a valid token.
    #[error("Invalid method: '{0}'")]
    InvalidMethod(String),

    /// The target endpoint is empty.
    #[error("Request target must not be empty")]
    EmptyTarget,

    /// The body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transport-independent description of one outbound call.
///
/// Built once, then borrowed by every attempt. Methods are normalized to
/// upper case.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    method: String,
    target: String,
    headers: IndexMap<String, String>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
}

impl CallRequest {
    /// Create a request for a method and target.
    pub fn new(method: impl AsRef<str>, target: impl Into<String>) -> Result<Self, RequestError> {
        let method = method.as_ref().trim();
        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(RequestError::InvalidMethod(method.to_string()));
        }

        let target = target.into();
        if target.trim().is_empty() {
            return Err(RequestError::EmptyTarget);
        }

        Ok(Self {
            method: method.to_ascii_uppercase(),
            target,
            headers: IndexMap::new(),
            body: None,
            timeout: None,
        })
    }

    /// Create a GET request.
    pub fn get(target: impl Into<String>) -> Result<Self, RequestError> {
        Self::new("GET", target)
    }

    /// Create a POST request.
    pub fn post(target: impl Into<String>) -> Result<Self, RequestError> {
        Self::new("POST", target)
    }

    /// Add a header, replacing any previous value for the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Add several headers.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.with_header(name, value);
        }
        self
    }

    /// Set a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize a JSON body and set the content type.
    pub fn with_json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, RequestError> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(bytes))
    }

    /// Set a per-attempt timeout, overriding the transport default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The target endpoint.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Request headers, lower-cased names.
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Look up a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The request body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
