//! Session middleware configuration.
//!
//! Sessions are stored in `PostgreSQL` by `tower-sessions-sqlx-store`. The
//! store's table is created by `lm-cli migrate` (or `PostgresStore::migrate`
//! at start-up). The cookie carries only the session id, signed with a key
//! derived from `LOCALMART_SESSION_SECRET`; a cookie whose signature does not
//! verify is treated as no session.

use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "lm_session";

/// Session expiry time in seconds (7 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over any store.
///
/// The server passes a `PostgresStore`; router tests pass a `MemoryStore`.
/// `secure` should be true whenever the public URL is https.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    key: Key,
    secure: bool,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}
