//! Core types for Localmart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod geo;
pub mod id;
pub mod money;
pub mod rating;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use geo::{GeoPoint, GeoPointError};
pub use id::*;
pub use money::{MAX_AMOUNT, RewardRate, RewardRateError, line_total, reward_points_for};
pub use rating::{Rating, RatingError};
pub use role::Role;
pub use status::{OrderStatus, StatusError};
