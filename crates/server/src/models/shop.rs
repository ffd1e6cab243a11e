//! Shop model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use localmart_core::{GeoPoint, RewardRate, ShopId, UserId};

/// A seller owned by exactly one shopkeeper.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub owner_id: UserId,
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub reward_rate: RewardRate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shop as shown in the public directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopListing {
    #[serde(flatten)]
    pub shop: Shop,
    /// Kilometers from the caller, present when coordinates were supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub elite: bool,
    pub average_rating: f64,
    pub feedback_count: i64,
}
