//! # storefront
//!
//! Client for the embroidery shop backend: catalog listings, account flows
//! and the client half of the session protocol (anti-forgery token storage,
//! request authorization, forced re-authentication).
//!
//! ```text
//! caller ──▶ AuthSession / CatalogService
//!                 │
//!                 ▼
//!              Gateway ──▶ HttpTransport ──▶ backend
//!                 │
//!                 ▼
//!           SessionState (token store, flag, events)
//! ```

pub mod catalog;
pub mod config;
pub mod context;
pub mod feedback;
pub mod net;
pub mod routes;
pub mod session;

pub use context::AppContext;
