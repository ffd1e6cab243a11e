//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (recorded into the span and Sentry scope)
//! 4. Security headers
//! 5. Session layer (tower-sessions)
//! 6. Rate limiting (governor), per router: auth vs. the rest of `/api`

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAuth, RequireCustomer, RequireShopkeeper, clear_current_user, set_current_user};
pub use rate_limit::{RateLimiting, api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
