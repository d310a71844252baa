//! Session middleware configuration.
//!
//! Sessions are kept in memory; the cookie only carries the session ID. New
//! sessions default to a browser-session cookie, and a "remember me" login
//! switches the cookie to a persistent expiry (see
//! [`crate::session::CookieSessionStorage`]).

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vetdesk_session";

/// Create the session layer with an in-memory store.
///
/// # Arguments
///
/// * `config` - Front-end configuration (for determining HTTPS mode)
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnSessionEnd)
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
