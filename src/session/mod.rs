//! Client-side session: token storage, the authenticated flag, lifecycle
//! events and the authentication flows.
//!
//! DESIGN
//! ======
//! Split by concern so the gateway can depend on `state` without pulling in
//! the flows that sit on top of it (`auth`).

pub mod auth;
pub mod events;
pub mod state;
pub mod store;

pub use auth::{AuthError, AuthSession};
pub use events::{InvalidationReason, SessionEvent};
pub use state::SessionState;
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
