//! Session lifecycle events delivered to the UI layer.

use super::Identity;

/// Session transition broadcast by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Credentials became present after a successful login.
    LoggedIn(Identity),
    /// Credentials were cleared by an explicit logout.
    LoggedOut,
    /// Credential repair failed; the UI should present the login surface.
    Expired,
}
