//! Upstream transport abstraction and its reqwest implementation.

use crate::error::TransportError;
use crate::request::CallRequest;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Raw response from one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single attempt upstream.
///
/// Implementations perform exactly one request per call and never retry on
/// their own; retrying is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send the request and return the raw response.
    async fn send(&self, request: &CallRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(feature = "reqwest")]
pub use self::http::{HttpClientConfig, ReqwestTransport};

#[cfg(feature = "reqwest")]
mod http {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};
    use reqwest::{Client, Method};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tracing::{debug, warn};

    impl From<reqwest::Error> for TransportError {
        fn from(err: reqwest::Error) -> Self {
            if err.is_timeout() {
                TransportError::Timeout
            } else if err.is_builder() {
                TransportError::InvalidRequest(err.to_string())
            } else if err.is_connect() {
                TransportError::Connection(err.to_string())
            } else if err.is_body() || err.is_decode() {
                TransportError::Body(err.to_string())
            } else {
                TransportError::Other(err.into())
            }
        }
    }

    /// Settings for the underlying HTTP client.
    ///
    /// Certificate verification is on unless explicitly disabled with
    /// [`HttpClientConfig::danger_accept_invalid_certs`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct HttpClientConfig {
        /// Total time for one attempt.
        pub timeout: Duration,
        /// Time to establish a connection.
        pub connect_timeout: Duration,
        /// Idle time allowed between reads.
        pub read_timeout: Duration,
        /// TCP keep-alive interval.
        pub tcp_keepalive: Option<Duration>,
        /// How long idle pooled connections are kept.
        pub pool_idle_timeout: Option<Duration>,
        /// Bind outgoing sockets to IPv4.
        pub prefer_ipv4: bool,
        /// Skip certificate verification.
        pub accept_invalid_certs: bool,
        /// User-Agent header.
        pub user_agent: Option<String>,
    }

    impl Default for HttpClientConfig {
        fn default() -> Self {
            Self {
                timeout: Duration::from_secs(60),
                connect_timeout: Duration::from_secs(10),
                read_timeout: Duration::from_secs(60),
                tcp_keepalive: Some(Duration::from_secs(60)),
                pool_idle_timeout: Some(Duration::from_secs(600)),
                prefer_ipv4: true,
                accept_invalid_certs: false,
                user_agent: Some(concat!("mindmap/", env!("CARGO_PKG_VERSION")).to_string()),
            }
        }
    }

    impl HttpClientConfig {
        /// Create the default config.
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the per-attempt timeout.
        #[must_use]
        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        /// Set the connect timeout.
        #[must_use]
        pub fn connect_timeout(mut self, timeout: Duration) -> Self {
            self.connect_timeout = timeout;
            self
        }

        /// Set the read timeout.
        #[must_use]
        pub fn read_timeout(mut self, timeout: Duration) -> Self {
            self.read_timeout = timeout;
            self
        }

        /// Set TCP keep-alive.
        #[must_use]
        pub fn tcp_keepalive(mut self, interval: Option<Duration>) -> Self {
            self.tcp_keepalive = interval;
            self
        }

        /// Set whether to bind to IPv4.
        #[must_use]
        pub fn prefer_ipv4(mut self, prefer: bool) -> Self {
            self.prefer_ipv4 = prefer;
            self
        }

        /// Disable certificate verification. Only for local testing.
        #[must_use]
        pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
            self.accept_invalid_certs = accept;
            self
        }

        /// Build a reqwest client.
        pub fn build_client(&self) -> Result<Client, TransportError> {
            let mut builder = Client::builder()
                .timeout(self.timeout)
                .connect_timeout(self.connect_timeout)
                .read_timeout(self.read_timeout)
                .tcp_keepalive(self.tcp_keepalive)
                .pool_idle_timeout(self.pool_idle_timeout);

            if self.prefer_ipv4 {
                builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
            }
            if let Some(agent) = &self.user_agent {
                builder = builder.user_agent(agent.clone());
            }
            if self.accept_invalid_certs {
                warn!("TLS certificate verification is disabled for upstream calls");
                builder = builder.danger_accept_invalid_certs(true);
            }

            builder
                .build()
                .map_err(|e| TransportError::Client(e.to_string()))
        }
    }

    /// Transport backed by a shared reqwest client.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        /// Build a transport from client settings.
        pub fn new(config: &HttpClientConfig) -> Result<Self, TransportError> {
            Ok(Self {
                client: config.build_client()?,
            })
        }

        /// Wrap an existing client.
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }

        /// The underlying client.
        pub fn client(&self) -> &Client {
            &self.client
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: &CallRequest) -> Result<TransportResponse, TransportError> {
            let method = Method::from_bytes(request.method().as_bytes())
                .map_err(|e| TransportError::invalid_request(e.to_string()))?;

            let mut builder = self.client.request(method, request.target());
            for (name, value) in request.headers() {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| TransportError::invalid_request(e.to_string()))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| TransportError::invalid_request(e.to_string()))?;
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body() {
                builder = builder.body(body.clone());
            }
            if let Some(timeout) = request.timeout() {
                builder = builder.timeout(timeout);
            }

            debug!(method = %request.method(), url = %request.target(), "Making HTTP request");

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            Ok(TransportResponse { status, body })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = HttpClientConfig::default();
            assert_eq!(config.timeout, Duration::from_secs(60));
            assert_eq!(config.connect_timeout, Duration::from_secs(10));
            assert_eq!(config.tcp_keepalive, Some(Duration::from_secs(60)));
            assert!(!config.accept_invalid_certs);
        }

        #[test]
        fn test_config_builder() {
            let config = HttpClientConfig::new()
                .timeout(Duration::from_secs(5))
                .prefer_ipv4(false)
                .danger_accept_invalid_certs(true);

            assert_eq!(config.timeout, Duration::from_secs(5));
            assert!(!config.prefer_ipv4);
            assert!(config.accept_invalid_certs);
        }

        #[test]
        fn test_build_transport() {
            let transport = ReqwestTransport::new(&HttpClientConfig::default());
            assert!(transport.is_ok());
        }

        #[tokio::test]
        async fn test_unparseable_url_is_invalid_request() {
            let transport = ReqwestTransport::new(&HttpClientConfig::default()).unwrap();
            let request = CallRequest::get("not a url").unwrap();

            let err = transport.send(&request).await.unwrap_err();
            assert_eq!(err.kind(), crate::error::FailureKind::InvalidRequest);
        }

        #[tokio::test]
        async fn test_refused_connection_is_transient() {
            let transport = ReqwestTransport::new(
                &HttpClientConfig::default().connect_timeout(Duration::from_millis(500)),
            )
            .unwrap();
            // Port 9 (discard) is closed on loopback in test environments.
            let request = CallRequest::get("http://127.0.0.1:9/").unwrap();

            let err = transport.send(&request).await.unwrap_err();
            assert!(err.kind().is_transient());
        }
    }
}
