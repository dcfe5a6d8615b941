//! Cookie jar shared by the `reqwest` transport.
//!
//! The backend checks its anti-forgery cookie alongside the header token,
//! so the jar must outlive the process just like the token file does. A jar
//! opened with [`CookieJar::open`] is read from disk once and written back
//! after every response.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest_cookie_store::{CookieStore, CookieStoreMutex};

use crate::session::store::{StoreError, write_replacing};

#[derive(Clone)]
pub struct CookieJar {
    store: Arc<CookieStoreMutex>,
    path: Option<PathBuf>,
}

impl CookieJar {
    /// Jar that is dropped with the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { store: Arc::new(CookieStoreMutex::new(CookieStore::default())), path: None }
    }

    /// Jar backed by `path`. A missing file starts an empty jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = match File::open(&path) {
            Ok(file) => cookie_store::serde::json::load_all(BufReader::new(file))
                .map_err(|e| StoreError::Cookies(e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => CookieStore::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { store: Arc::new(CookieStoreMutex::new(store)), path: Some(path) })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Provider handed to `reqwest::ClientBuilder::cookie_provider`.
    #[must_use]
    pub fn provider(&self) -> Arc<CookieStoreMutex> {
        self.store.clone()
    }

    /// Write the jar back to its file, session cookies included. No-op for
    /// in-memory jars.
    ///
    /// # Errors
    ///
    /// Returns an error if the jar cannot be serialized or written.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut buf = Vec::new();
        {
            let store = self
                .store
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut buf)
                .map_err(|e| StoreError::Cookies(e.to_string()))?;
        }
        write_replacing(path, &buf)?;
        Ok(())
    }

    /// Number of cookies currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter_any()
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
