//! Shared session state: the stored token, the authenticated flag and the
//! event channel.
//!
//! DESIGN
//! ======
//! `SessionState` is the one place that mutates the token, so the flag can
//! be kept in step with it: clearing the token always lowers the flag. The
//! gateway and the auth session both hold an `Arc<SessionState>`.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use super::events::{InvalidationReason, SessionEvent};
use super::store::{StoreError, TokenStore};
use crate::routes::Route;

const EVENT_CAPACITY: usize = 16;

pub struct SessionState {
    store: Arc<dyn TokenStore>,
    storage_key: String,
    authenticated: watch::Sender<bool>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionState {
    /// Build session state over `store`. The flag starts raised iff a token
    /// is already stored under `storage_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn new(store: Arc<dyn TokenStore>, storage_key: impl Into<String>) -> Result<Self, StoreError> {
        let storage_key = storage_key.into();
        let has_token = store.get(&storage_key)?.is_some();
        let (authenticated, _) = watch::channel(has_token);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self { store, storage_key, authenticated, events })
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Currently stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(&self.storage_key)
    }

    /// Persist a token issued by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn store_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(&self.storage_key, token)
    }

    /// Delete the token and lower the flag. The flag is lowered even if the
    /// store write fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear_token(&self) -> Result<(), StoreError> {
        let result = self.store.remove(&self.storage_key);
        self.set_authenticated(false);
        result
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.send_replace(value);
    }

    /// Watch the authenticated flag.
    #[must_use]
    pub fn watch_authenticated(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("no session event subscribers");
        }
    }

    /// Drop the session after the backend rejected it and ask subscribers to
    /// send the user back to the auth entry point.
    pub fn invalidate(&self, reason: InvalidationReason) {
        tracing::warn!(?reason, "session invalidated by backend");
        if let Err(e) = self.clear_token() {
            tracing::error!(error = %e, "failed to clear stored token");
        }
        self.publish(SessionEvent::Redirect { to: Route::auth_entry(), reason });
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
