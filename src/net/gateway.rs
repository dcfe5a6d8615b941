//! Request gateway: the only path from the client to the shop backend.
//!
//! ARCHITECTURE
//! ============
//! 1. Build headers: JSON content type always, anti-forgery token when the
//!    caller asks for auth and a token is stored.
//! 2. Send through the injected [`HttpTransport`].
//! 3. Classify:
//!    - 401 → drop the session (token, flag, redirect event), `Unauthorized`
//!    - 403 with an allow-listed message → same, `ForgeryCheckFailed`
//!    - anything else → parsed envelope, returned as-is
//!
//! ERROR HANDLING
//! ==============
//! The envelope's `success` flag is never interpreted here. Callers decide
//! what a `success: false` means for them.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use super::types::{ApiError, ApiResponse};
use crate::config::{CsrfConfig, StorefrontConfig};
use crate::session::events::InvalidationReason;
use crate::session::state::SessionState;
use crate::session::store::StoreError;

const JSON: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 401: the session is gone; the client has been sent to re-authenticate.
    #[error("unauthorized")]
    Unauthorized,

    /// 403 with an anti-forgery failure; handled like `Unauthorized`.
    #[error("CSRF validation failed")]
    ForgeryCheckFailed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 5xx without a readable envelope.
    #[error("server error: status {status}")]
    Server { status: u16 },

    #[error("response parse failed (status {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("request body encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("stored token is not a valid header value: {0}")]
    InvalidToken(#[from] InvalidHeaderValue),

    #[error("token storage failed: {0}")]
    Store(#[from] StoreError),
}

/// Only the error part of an envelope; used to inspect 403 bodies without
/// caring what the data payload would have been.
#[derive(serde::Deserialize)]
struct ErrorProbe {
    #[serde(default)]
    error: Option<ApiError>,
}

pub struct Gateway {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionState>,
    base_url: String,
    csrf: CsrfConfig,
}

impl Gateway {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<SessionState>, config: &StorefrontConfig) -> Self {
        Self { transport, session, base_url: config.api_base_url.clone(), csrf: config.csrf.clone() }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// `GET` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str, include_auth: bool) -> Result<ApiResponse<T>, GatewayError> {
        self.request(Method::GET, path, None, include_auth).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn post<T, B>(&self, path: &str, body: &B, include_auth: bool) -> Result<ApiResponse<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body)?;
        self.request(Method::POST, path, Some(body), include_auth).await
    }

    /// `POST` without a body.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        include_auth: bool,
    ) -> Result<ApiResponse<T>, GatewayError> {
        self.request(Method::POST, path, None, include_auth).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn put<T, B>(&self, path: &str, body: &B, include_auth: bool) -> Result<ApiResponse<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body)?;
        self.request(Method::PUT, path, Some(body), include_auth).await
    }

    /// `DELETE` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        include_auth: bool,
    ) -> Result<ApiResponse<T>, GatewayError> {
        self.request(Method::DELETE, path, None, include_auth).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        include_auth: bool,
    ) -> Result<ApiResponse<T>, GatewayError> {
        let headers = self.build_headers(include_auth)?;
        let request = HttpRequest { method: method.clone(), url: format!("{}{}", self.base_url, path), headers, body };

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api request failed");
            e
        })?;
        tracing::debug!(%method, path, status = response.status, "api response");

        self.classify(response)
    }

    fn build_headers(&self, include_auth: bool) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));

        if include_auth {
            if let Some(token) = self.session.token()? {
                headers.insert(self.csrf.header_name.clone(), HeaderValue::from_str(&token)?);
            }
        }
        Ok(headers)
    }

    fn classify<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<ApiResponse<T>, GatewayError> {
        let HttpResponse { status, body } = response;

        if status == 401 {
            self.session.invalidate(InvalidationReason::Unauthorized);
            return Err(GatewayError::Unauthorized);
        }

        if status == 403 && self.is_forgery_failure(&body) {
            self.session.invalidate(InvalidationReason::ForgeryCheckFailed);
            return Err(GatewayError::ForgeryCheckFailed);
        }

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if status >= 500 => Err(GatewayError::Server { status }),
            Err(e) => Err(GatewayError::Decode { status, message: e.to_string() }),
        }
    }

    fn is_forgery_failure(&self, body: &str) -> bool {
        serde_json::from_str::<ErrorProbe>(body)
            .ok()
            .and_then(|probe| probe.error)
            .is_some_and(|error| self.csrf.is_failure_message(&error.message))
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
