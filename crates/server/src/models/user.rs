//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use localmart_core::{Email, Role, UserId};

/// A registered account. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    /// Loyalty balance; never negative.
    pub reward_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
