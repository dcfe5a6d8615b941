//! HTTP transport seam.
//!
//! The gateway never touches `reqwest` directly; it hands a fully built
//! [`HttpRequest`] to an [`HttpTransport`]. Production code uses
//! [`ReqwestTransport`], tests swap in a scripted transport.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;

use super::cookies::CookieJar;
use crate::config::HttpTimeouts;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the response body not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Serialized JSON body, if any.
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Anything that can execute a request and hand back status + body.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// =============================================================================
// REQWEST
// =============================================================================

/// `reqwest`-backed transport. Every request goes out with the cookies in
/// its [`CookieJar`], like a browser sending credentials.
pub struct ReqwestTransport {
    http: reqwest::Client,
    cookies: CookieJar,
}

impl ReqwestTransport {
    /// Transport with an in-memory cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, TransportError> {
        Self::with_cookie_jar(timeouts, CookieJar::in_memory())
    }

    /// Transport over `cookies`; a file-backed jar is saved after every
    /// response.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_cookie_jar(timeouts: HttpTimeouts, cookies: CookieJar) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .cookie_provider(cookies.provider())
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;
        Ok(Self { http, cookies })
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if let Err(e) = self.cookies.save() {
            tracing::warn!(error = %e, "failed to persist cookie jar");
        }
        Ok(HttpResponse { status, body })
    }
}

