//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `catalog` - Shops, products, and the public shop directory
//! - `orders` - Order placement and the status state machine
//! - `rewards` - Issuing and claiming shop rewards
//! - `feedback` - One rating per completed order
//! - `analytics` - Sales roll-ups and insight prompts
//!
//! Services take request-scoped identity (`CurrentUser`) as an explicit
//! argument and own their transaction boundaries.

pub mod analytics;
pub mod auth;
pub mod catalog;
mod error;
pub mod feedback;
pub mod orders;
pub mod rewards;

pub use error::MarketError;
