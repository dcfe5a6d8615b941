//! Session lifecycle events.
//!
//! The gateway does not navigate anywhere itself. When it has to drop the
//! session it publishes a [`SessionEvent::Redirect`]; whatever owns the
//! screen subscribes and performs the navigation.

use crate::routes::Route;

/// Why the session was dropped by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The backend answered 401.
    Unauthorized,
    /// The backend answered 403 with an anti-forgery failure message.
    ForgeryCheckFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// Session invalidated; the client must navigate to `to`.
    Redirect { to: Route, reason: InvalidationReason },
}
