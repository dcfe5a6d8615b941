//! Read-only catalog listings.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::CatalogEndpoints;
use crate::net::gateway::Gateway;
use crate::net::types::{Category, Color, Garment};
use crate::session::auth::{AuthError, into_result};

pub struct CatalogService {
    gateway: Arc<Gateway>,
    endpoints: CatalogEndpoints,
}

impl CatalogService {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>, endpoints: CatalogEndpoints) -> Self {
        Self { gateway, endpoints }
    }

    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn garments(&self) -> Result<Vec<Garment>, AuthError> {
        self.list(&self.endpoints.garments).await
    }

    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn categories(&self) -> Result<Vec<Category>, AuthError> {
        self.list(&self.endpoints.categories).await
    }

    /// # Errors
    ///
    /// See [`AuthError`].
    pub async fn colors(&self) -> Result<Vec<Color>, AuthError> {
        self.list(&self.endpoints.colors).await
    }

    // A successful envelope without `data` is an empty listing.
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, AuthError> {
        let response = self.gateway.get::<Vec<T>>(path, true).await?;
        let items = into_result(response)?.unwrap_or_default();
        tracing::debug!(path, count = items.len(), "catalog listing");
        Ok(items)
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
