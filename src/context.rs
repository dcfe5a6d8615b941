//! Application context.
//!
//! DESIGN
//! ======
//! `AppContext` is built once at startup and handed to whatever drives the
//! client (the CLI here, a UI elsewhere). It owns the config, the session
//! state, the gateway and the services built on it. Clone is cheap: every
//! component is `Arc`-wrapped.

use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;
use crate::net::cookies::CookieJar;
use crate::net::gateway::Gateway;
use crate::net::transport::{HttpTransport, ReqwestTransport, TransportError};
use crate::session::auth::AuthSession;
use crate::session::state::SessionState;
use crate::session::store::{FileTokenStore, StoreError, TokenStore};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<StorefrontConfig>,
    pub session: Arc<SessionState>,
    pub gateway: Arc<Gateway>,
    pub auth: Arc<AuthSession>,
    pub catalog: Arc<CatalogService>,
}

impl AppContext {
    /// Wire every component over the given transport and token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub fn new(
        config: StorefrontConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ContextError> {
        let session = Arc::new(SessionState::new(store, config.csrf.storage_key.clone())?);
        let gateway = Arc::new(Gateway::new(transport, session.clone(), &config));
        let auth = Arc::new(AuthSession::new(gateway.clone(), config.endpoints.auth.clone()));
        let catalog = Arc::new(CatalogService::new(gateway.clone(), config.endpoints.catalog.clone()));
        tracing::debug!(
            base_url = %config.api_base_url,
            authenticated = session.is_authenticated(),
            "client context ready"
        );
        Ok(Self { config: Arc::new(config), session, gateway, auth, catalog })
    }

    /// Production wiring: `reqwest` transport over the cookie jar next to
    /// the token file, and the file token store named in the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the token
    /// file or cookie jar cannot be read.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, ContextError> {
        let cookies = CookieJar::open(config.cookie_file())?;
        let transport = Arc::new(ReqwestTransport::with_cookie_jar(config.timeouts, cookies)?);
        let store = Arc::new(FileTokenStore::new(config.token_file.clone()));
        Self::new(config, transport, store)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
