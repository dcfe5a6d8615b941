//! Client-visible routes.
//!
//! The presentation layer is not part of this crate, but the session layer
//! has to name the authentication entry point when it forces a redirect, and
//! two flows (password reset, registration confirmation) carry a `token`
//! query parameter that callers need to extract. `Route` is the typed form
//! of that contract.

use std::fmt;

use reqwest::Url;

const PARSE_BASE: &str = "http://storefront.local/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Auth,
    ForgotPassword,
    PasswordResetSent,
    /// `/reset-password?token=...`
    ResetPassword { token: Option<String> },
    RegistrationSuccess,
    /// `/confirm-registration?token=...`
    ConfirmRegistration { token: Option<String> },
    Catalog,
    Cart,
    Profile,
    About,
    Contact,
    NotFound,
}

impl Route {
    /// Parse a client path (with optional query string) into a route.
    /// Anything unrecognised maps to [`Route::NotFound`].
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let Ok(url) = Url::parse(PARSE_BASE).and_then(|base| base.join(input.trim())) else {
            return Self::NotFound;
        };

        let path = url.path();
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        let token = || {
            url.query_pairs()
                .find(|(key, _)| key == "token")
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        match path {
            "/" => Self::Home,
            "/auth" => Self::Auth,
            "/forgot-password" => Self::ForgotPassword,
            "/password-reset-sent" => Self::PasswordResetSent,
            "/reset-password" => Self::ResetPassword { token: token() },
            "/registration-success" => Self::RegistrationSuccess,
            "/confirm-registration" => Self::ConfirmRegistration { token: token() },
            "/catalog" => Self::Catalog,
            "/cart" => Self::Cart,
            "/profile" => Self::Profile,
            "/about" => Self::About,
            "/contact" => Self::Contact,
            _ => Self::NotFound,
        }
    }

    /// Path without query string.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Auth => "/auth",
            Self::ForgotPassword => "/forgot-password",
            Self::PasswordResetSent => "/password-reset-sent",
            Self::ResetPassword { .. } => "/reset-password",
            Self::RegistrationSuccess => "/registration-success",
            Self::ConfirmRegistration { .. } => "/confirm-registration",
            Self::Catalog => "/catalog",
            Self::Cart => "/cart",
            Self::Profile => "/profile",
            Self::About => "/about",
            Self::Contact => "/contact",
            Self::NotFound => "/404",
        }
    }

    /// Full client path, including the `token` query parameter when set.
    #[must_use]
    pub fn to_path(&self) -> String {
        match self {
            Self::ResetPassword { token: Some(token) } | Self::ConfirmRegistration { token: Some(token) } => {
                let Ok(mut url) = Url::parse(PARSE_BASE).and_then(|base| base.join(self.path())) else {
                    return self.path().to_string();
                };
                url.query_pairs_mut().append_pair("token", token);
                format!("{}?{}", url.path(), url.query().unwrap_or_default())
            }
            _ => self.path().to_string(),
        }
    }

    /// The route a forced re-authentication lands on.
    #[must_use]
    pub fn auth_entry() -> Self {
        Self::Auth
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
