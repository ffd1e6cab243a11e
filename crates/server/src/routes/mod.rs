//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (strict rate limit)
//! POST /api/auth/register           - Create an account
//! POST /api/auth/login              - Start a session
//! POST /api/auth/logout             - End the session
//!
//! # Account
//! GET  /api/user/me                 - Own profile with point balance
//! PUT  /api/user/me                 - Rename
//!
//! # Shops
//! GET  /api/shops?lat=&lng=         - Public directory, nearest first with coordinates
//! POST /api/shop/setup              - Create the caller's shop
//! GET  /api/shop/check              - Whether the caller has a shop
//! GET  /api/shopkeeper/profile      - Shopkeeper and shop
//! PUT  /api/shopkeeper/profile      - Edit shop
//! GET  /api/shopkeeper/stats        - Dashboard numbers
//!
//! # Products
//! GET  /api/products?search=&shopId=
//! POST /api/products
//! GET  /api/products/{id}
//! PUT  /api/products/{id}
//! DELETE /api/products/{id}
//!
//! # Orders
//! GET  /api/orders?status=          - Own orders, or the shop's orders
//! POST /api/orders                  - Place an order (customers)
//! GET  /api/orders/{id}
//! PUT  /api/orders/{id}             - Advance status (owning shopkeeper)
//!
//! # Rewards
//! GET  /api/rewards                 - Rewards issued to the caller
//! POST /api/rewards                 - Claim a reward
//! GET  /api/shopkeeper/rewards      - Rewards the caller's shop issued
//! POST /api/shopkeeper/rewards      - Issue a reward
//!
//! # Feedback
//! GET  /api/feedback
//! POST /api/feedback
//! GET  /api/feedback/check?orderId=
//!
//! # Analytics
//! POST /api/analytics               - Shop report with narrative insights
//! ```

pub mod analytics;
pub mod auth;
pub mod feedback;
pub mod orders;
pub mod products;
pub mod rewards;
pub mod shops;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{RateLimiting, api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the shop and shopkeeper routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/shops", get(shops::directory))
        .route("/shop/setup", post(shops::setup))
        .route("/shop/check", get(shops::check))
        .route(
            "/shopkeeper/profile",
            get(shops::profile).put(shops::update_profile),
        )
        .route("/shopkeeper/stats", get(shops::stats))
        .route(
            "/shopkeeper/rewards",
            get(rewards::issued).post(rewards::issue),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::place))
        .route("/{id}", get(orders::show).put(orders::update_status))
}

/// Create the feedback routes router.
pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(feedback::list).post(feedback::submit))
        .route("/check", get(feedback::check))
}

/// Everything under `/api` except auth.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/user/me", get(users::me).put(users::update_me))
        .merge(shop_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .route("/rewards", get(rewards::mine).post(rewards::claim))
        .nest("/feedback", feedback_routes())
        .route("/analytics", post(analytics::report))
}

/// Create all routes, with rate limiting when enabled.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let (auth, api) = match rate_limiting {
        RateLimiting::Enabled => (
            auth_routes().layer(auth_rate_limiter()),
            api_routes().layer(api_rate_limiter()),
        ),
        RateLimiting::Disabled => (auth_routes(), api_routes()),
    };

    Router::new().nest("/api/auth", auth).nest("/api", api)
}
