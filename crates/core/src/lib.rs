//! Localmart Core - Shared domain types.
//!
//! This crate provides the types used across all Localmart components:
//! - `server` - Marketplace HTTP API for customers and shopkeepers
//! - `cli` - Command-line tools for migrations, seeding, and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Anything that can be decided without touching
//! storage (status transitions, reward arithmetic, distances) lives here.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, order status, ratings, reward
//!   rates, and geographic points

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
