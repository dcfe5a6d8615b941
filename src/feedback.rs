//! User-facing notices for operation outcomes.
//!
//! Pure mapping from results to what a toast/banner should say. Field errors
//! produce no notice; they are rendered next to the inputs instead.

use crate::session::auth::AuthError;

pub const SUCCESS_TITLE: &str = "Success";
pub const ERROR_TITLE: &str = "Error";
pub const DEFAULT_SUCCESS: &str = "Operation completed successfully";
pub const DEFAULT_FAILURE: &str = "Something went wrong";
pub const DEFAULT_REQUEST_FAILURE: &str = "The request could not be completed";
pub const SERVER_FAILURE: &str = "Server error, please try again later";
pub const SESSION_EXPIRED: &str = "Your session has expired, please sign in again";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub description: String,
    pub level: NoticeLevel,
}

impl Notice {
    #[must_use]
    pub fn success(description: Option<&str>) -> Self {
        Self {
            title: SUCCESS_TITLE,
            description: description.unwrap_or(DEFAULT_SUCCESS).to_owned(),
            level: NoticeLevel::Success,
        }
    }

    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self { title: ERROR_TITLE, description: description.into(), level: NoticeLevel::Error }
    }

    /// Notice for a failed operation. `context` names what was being done
    /// ("Sign-in failed") and is used for transport-level failures where
    /// the backend said nothing useful.
    #[must_use]
    pub fn for_error(error: &AuthError, context: Option<&str>) -> Option<Self> {
        let description = match error {
            AuthError::Fields(_) => return None,
            AuthError::General(message) if message.is_empty() => DEFAULT_FAILURE.to_owned(),
            AuthError::General(message) => message.clone(),
            AuthError::Unauthorized | AuthError::ForgeryCheckFailed => SESSION_EXPIRED.to_owned(),
            AuthError::Server { .. } => SERVER_FAILURE.to_owned(),
            AuthError::Network(_) | AuthError::Decode(_) | AuthError::Client(_) | AuthError::Store(_) => {
                context.unwrap_or(DEFAULT_REQUEST_FAILURE).to_owned()
            }
        };
        Some(Self::error(description))
    }

    /// Notice for any outcome. Successes only produce a notice when
    /// `success_message` is given.
    #[must_use]
    pub fn for_result<T>(result: &Result<T, AuthError>, success_message: Option<&str>, context: Option<&str>) -> Option<Self> {
        match result {
            Ok(_) => success_message.map(|message| Self::success(Some(message))),
            Err(error) => Self::for_error(error, context),
        }
    }
}

#[cfg(test)]
#[path = "feedback_test.rs"]
mod tests;
