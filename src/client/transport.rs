//! The HTTP transport capability.
//!
//! The engine consumes the transport as a pluggable strategy: anything
//! implementing [`Transport`] can carry requests. The built-in
//! [`ReqwestTransport`] speaks HTTP via `reqwest`; tests substitute fakes
//! to script exchanges without a network.
//!
//! A transport reports any completed HTTP exchange, success or error
//! status alike, as `Ok`; only connectivity-level failures (connection
//! refused, timeout, cancellation) are `Err`. The transport cannot know
//! the API's error-document shape, so mapping non-2xx bodies into the
//! error taxonomy happens in the client.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// HTTP methods used by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET for fetches.
    Get,
    /// HTTP POST for creates and relationship additions.
    Post,
    /// HTTP PUT for updates and relationship replacements.
    Put,
    /// HTTP DELETE for deletes and relationship removals.
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A completed HTTP exchange as the transport saw it.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The raw response body; may be empty.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A connectivity-level transport failure.
///
/// These pass through the client unchanged: no re-wrapping, no retry.
/// Retry policy, if any, belongs to the transport implementation or the
/// caller.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A network-level error from the underlying HTTP stack.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The request was cancelled before completing.
    #[error("request cancelled")]
    Cancelled,

    /// Any other transport failure.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Carries one HTTP request and resolves with the exchange's outcome.
///
/// Implementations must resolve exactly once per call (inherent in the
/// `Future` contract) and must not interpret response bodies.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    /// Issues a request and resolves with the completed exchange.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only for connectivity-level failures;
    /// HTTP error statuses resolve as `Ok`.
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<TransportResponse, TransportError>;
}

/// The built-in transport, backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh HTTP client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This
    /// should only happen in extremely unusual circumstances (e.g. TLS
    /// initialization failure).
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        builder = builder.header("Accept", "application/vnd.api+json");
        if let Some(payload) = payload {
            builder = builder
                .header("Content-Type", "application/vnd.api+json")
                .json(payload);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(TransportResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error)
    }
}

// Verify transport types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
    assert_send_sync::<TransportResponse>();
    assert_send_sync::<TransportError>();
};
