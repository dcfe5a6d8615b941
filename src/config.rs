//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Everything the gateway needs to talk to the shop backend lives here: the
//! base URL, the endpoint table, the anti-forgery storage key and header
//! name, and the allow-list of backend messages that mean "the anti-forgery
//! check failed". Nothing is read from the environment after startup.

use std::path::PathBuf;

use reqwest::header::HeaderName;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_CSRF_STORAGE_KEY: &str = "csrf_token";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_FILE: &str = ".storefront/storage.json";

/// Backend messages that identify a failed anti-forgery check on a 403.
pub const DEFAULT_CSRF_FAILURE_MESSAGES: [&str; 3] =
    ["CSRF token missing in Headers", "CSRF token missing in Cookie", "CSRF token mismatch"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API base URL must not be empty")]
    EmptyBaseUrl,
    #[error("invalid anti-forgery header name: {0}")]
    InvalidHeader(String),
    #[error("anti-forgery storage key must not be empty")]
    EmptyStorageKey,
}

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Authentication endpoints. All are `POST` with a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login: String,
    pub register: String,
    pub register_confirm: String,
    pub logout: String,
    pub refresh: String,
    pub forgot: String,
    pub reset: String,
}

/// Read-only catalog listings. All are `GET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoints {
    pub garments: String,
    pub categories: String,
    pub colors: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: AuthEndpoints,
    pub catalog: CatalogEndpoints,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: AuthEndpoints {
                login: "/api/v1/auth/login/".into(),
                register: "/api/v1/auth/register/".into(),
                register_confirm: "/api/v1/auth/register-confirm/".into(),
                logout: "/api/v1/auth/logout/".into(),
                refresh: "/api/v1/auth/refresh/".into(),
                forgot: "/api/v1/auth/forgot/".into(),
                reset: "/api/v1/auth/reset/".into(),
            },
            catalog: CatalogEndpoints {
                garments: "/api/v1/catalog/garments/".into(),
                categories: "/api/v1/catalog/categories/".into(),
                colors: "/api/v1/catalog/colors/".into(),
            },
        }
    }
}

// =============================================================================
// CSRF
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfConfig {
    /// Storage key the token is persisted under.
    pub storage_key: String,
    /// Request header the token is sent in.
    pub header_name: HeaderName,
    /// Prefixes of 403 error messages that invalidate the session.
    pub failure_messages: Vec<String>,
}

impl CsrfConfig {
    /// Whether a 403 error message reports an anti-forgery failure.
    #[must_use]
    pub fn is_failure_message(&self, message: &str) -> bool {
        self.failure_messages
            .iter()
            .any(|prefix| message.starts_with(prefix.as_str()))
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_CSRF_STORAGE_KEY.into(),
            header_name: HeaderName::from_static("x-csrf-token"),
            failure_messages: DEFAULT_CSRF_FAILURE_MESSAGES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

// =============================================================================
// TOP LEVEL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub api_base_url: String,
    pub endpoints: Endpoints,
    pub csrf: CsrfConfig,
    pub timeouts: HttpTimeouts,
    pub token_file: PathBuf,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            endpoints: Endpoints::default(),
            csrf: CsrfConfig::default(),
            timeouts: HttpTimeouts::default(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

impl StorefrontConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `STOREFRONT_API_BASE_URL`: default `http://localhost:8080`
    /// - `STOREFRONT_CSRF_STORAGE_KEY`: default `csrf_token`
    /// - `STOREFRONT_CSRF_HEADER`: default `X-CSRF-TOKEN`
    /// - `STOREFRONT_CSRF_FAILURE_MESSAGES`: comma-separated prefixes
    /// - `STOREFRONT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `STOREFRONT_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STOREFRONT_TOKEN_FILE`: default `.storefront/storage.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or storage key is empty, or the
    /// header name is not a valid HTTP header.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(env_string("STOREFRONT_API_BASE_URL").as_deref())?;

        let storage_key = env_string("STOREFRONT_CSRF_STORAGE_KEY").unwrap_or_else(|| DEFAULT_CSRF_STORAGE_KEY.into());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        let header_name = parse_header_name(env_string("STOREFRONT_CSRF_HEADER").as_deref())?;
        let failure_messages = parse_failure_messages(env_string("STOREFRONT_CSRF_FAILURE_MESSAGES").as_deref());

        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("STOREFRONT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("STOREFRONT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let token_file = env_string("STOREFRONT_TOKEN_FILE").map_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from);

        Ok(Self {
            api_base_url,
            endpoints: Endpoints::default(),
            csrf: CsrfConfig { storage_key, header_name, failure_messages },
            timeouts,
            token_file,
        })
    }

    /// Cookie jar kept next to the token file (`storage.json` →
    /// `storage.cookies.json`).
    #[must_use]
    pub fn cookie_file(&self) -> PathBuf {
        self.token_file.with_extension("cookies.json")
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    env_string(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_API_BASE_URL).trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    Ok(url.to_string())
}

fn parse_header_name(raw: Option<&str>) -> Result<HeaderName, ConfigError> {
    let raw = raw.unwrap_or(DEFAULT_CSRF_HEADER).trim();
    HeaderName::from_bytes(raw.as_bytes()).map_err(|_| ConfigError::InvalidHeader(raw.to_string()))
}

fn parse_failure_messages(raw: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect();
    if parsed.is_empty() {
        return CsrfConfig::default().failure_messages;
    }
    parsed
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
