//! Authentication flows on top of the gateway.
//!
//! DESIGN
//! ======
//! `AuthSession` turns gateway envelopes into `Result<_, AuthError>`:
//! field errors go back to the form, everything else becomes one of the
//! remaining variants. It also owns the authenticated flag transitions:
//! login and refresh raise it, logout lowers it no matter what the backend
//! said.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, watch};

use super::events::SessionEvent;
use super::state::SessionState;
use super::store::StoreError;
use crate::config::AuthEndpoints;
use crate::net::gateway::{Gateway, GatewayError};
use crate::net::types::{
    ApiResponse, FieldErrors, ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterConfirmRequest,
    RegisterRequest, ResetPasswordRequest,
};

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const REPEAT_PASSWORD_FIELD: &str = "repeat_password";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Validation failures attributable to specific inputs.
    #[error("validation failed: {}", format_fields(.0))]
    Fields(FieldErrors),

    /// Operation failed without a field attribution.
    #[error("{0}")]
    General(String),

    /// Session rejected with 401; already cleared and redirected.
    #[error("unauthorized")]
    Unauthorized,

    /// Anti-forgery check failed; already cleared and redirected.
    #[error("CSRF validation failed")]
    ForgeryCheckFailed,

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// 5xx without a structured envelope.
    #[error("server error: status {status}")]
    Server { status: u16 },

    /// The backend answered with something that is not an envelope.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request could not be built locally.
    #[error("client error: {0}")]
    Client(String),

    #[error("token storage failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Single-field validation error.
    #[must_use]
    pub fn field(name: &str, message: &str) -> Self {
        Self::Fields(FieldErrors::from([(name.to_owned(), message.to_owned())]))
    }

    /// Field errors for form display, if that is what this is.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    /// Whether the session was dropped and the user must sign in again.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::ForgeryCheckFailed)
    }
}

fn format_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<GatewayError> for AuthError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Unauthorized => Self::Unauthorized,
            GatewayError::ForgeryCheckFailed => Self::ForgeryCheckFailed,
            GatewayError::Transport(e) => Self::Network(e.to_string()),
            GatewayError::Server { status } => Self::Server { status },
            GatewayError::Decode { message, .. } => Self::Decode(message),
            GatewayError::Encode(e) => Self::Client(e.to_string()),
            GatewayError::InvalidToken(e) => Self::Client(e.to_string()),
            GatewayError::Store(e) => Self::Store(e),
        }
    }
}

/// Normalize an envelope: `success` yields the payload, a failure with
/// non-empty `fields` yields exactly those fields, anything else a general
/// error carrying the backend message.
///
/// # Errors
///
/// Returns `Fields` or `General` when `success` is false.
pub fn into_result<T>(response: ApiResponse<T>) -> Result<Option<T>, AuthError> {
    if response.success {
        return Ok(response.data);
    }
    let error = response.error.unwrap_or_default();
    if let Some(fields) = error.field_errors() {
        return Err(AuthError::Fields(fields.clone()));
    }
    Err(AuthError::General(error.message))
}

// =============================================================================
// AUTH SESSION
// =============================================================================

pub struct AuthSession {
    gateway: Arc<Gateway>,
    state: Arc<SessionState>,
    endpoints: AuthEndpoints,
}

impl AuthSession {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>, endpoints: AuthEndpoints) -> Self {
        let state = gateway.session().clone();
        Self { gateway, state, endpoints }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Watch the authenticated flag.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.watch_authenticated()
    }

    /// Subscribe to login/logout/redirect events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.state.subscribe()
    }

    /// Sign in. On success the returned token (if any) is stored and the
    /// flag raised; on failure the flag is left alone.
    ///
    /// # Errors
    ///
    /// `Fields` / `General` for rejected credentials, otherwise see [`AuthError`].
    pub async fn login(&self, credentials: &LoginRequest) -> Result<(), AuthError> {
        let response = self
            .gateway
            .post::<LoginResponse, _>(&self.endpoints.login, credentials, false)
            .await?;
        let data = into_result(response)?;
        self.accept_token(data)?;
        self.state.set_authenticated(true);
        self.state.publish(SessionEvent::LoggedIn);
        tracing::info!(username = %credentials.username, "logged in");
        Ok(())
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// `Fields` on `repeat_password` when the passwords differ (no request
    /// is sent), otherwise whatever the backend reports.
    pub async fn register(&self, data: &RegisterRequest) -> Result<(), AuthError> {
        check_passwords_match(&data.password, &data.repeat_password)?;
        let response = self
            .gateway
            .post::<Value, _>(&self.endpoints.register, data, false)
            .await?;
        into_result(response)?;
        tracing::info!(username = %data.username, "registration submitted");
        Ok(())
    }

    /// Confirm a registration with the token from the confirmation link.
    ///
    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn confirm_registration(&self, token: &str) -> Result<(), AuthError> {
        let body = RegisterConfirmRequest { token: token.to_owned() };
        let response = self
            .gateway
            .post::<Value, _>(&self.endpoints.register_confirm, &body, false)
            .await?;
        into_result(response)?;
        Ok(())
    }

    /// Sign out. The local session is dropped even if the backend call
    /// fails; the backend outcome is still returned.
    ///
    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn logout(&self) -> Result<(), AuthError> {
        let outcome = self
            .gateway
            .post_empty::<Value>(&self.endpoints.logout, true)
            .await;

        if let Err(e) = self.state.clear_token() {
            tracing::error!(error = %e, "failed to clear stored token on logout");
        }
        self.state.publish(SessionEvent::LoggedOut);
        tracing::info!("logged out");

        into_result(outcome?).map(|_| ())
    }

    /// Rotate the anti-forgery token.
    ///
    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let response = self
            .gateway
            .post_empty::<LoginResponse>(&self.endpoints.refresh, true)
            .await?;
        let data = into_result(response)?;
        self.accept_token(data)?;
        self.state.set_authenticated(true);
        tracing::debug!("session refreshed");
        Ok(())
    }

    /// Ask the backend to send a password reset link.
    ///
    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let body = ForgotPasswordRequest { email: email.to_owned() };
        let response = self
            .gateway
            .post::<Value, _>(&self.endpoints.forgot, &body, false)
            .await?;
        into_result(response)?;
        Ok(())
    }

    /// Set a new password with the token from the reset link.
    ///
    /// # Errors
    ///
    /// `Fields` on `repeat_password` when the passwords differ (no request
    /// is sent), otherwise whatever the backend reports.
    pub async fn reset_password(&self, data: &ResetPasswordRequest) -> Result<(), AuthError> {
        check_passwords_match(&data.password, &data.repeat_password)?;
        let response = self
            .gateway
            .post::<Value, _>(&self.endpoints.reset, data, false)
            .await?;
        into_result(response)?;
        Ok(())
    }

    fn accept_token(&self, data: Option<LoginResponse>) -> Result<(), AuthError> {
        match data.and_then(|d| d.csrf_token) {
            Some(token) => self.state.store_token(&token).map_err(AuthError::from),
            None => {
                tracing::debug!("no csrf token in response");
                Ok(())
            }
        }
    }
}

fn check_passwords_match(password: &str, repeat_password: &str) -> Result<(), AuthError> {
    if password == repeat_password {
        return Ok(());
    }
    Err(AuthError::field(REPEAT_PASSWORD_FIELD, PASSWORDS_DO_NOT_MATCH))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
