//! Shop-issued rewards.

use chrono::{DateTime, Utc};
use serde::Serialize;

use localmart_core::{Email, RewardId, ShopId, UserId};

/// A perk a shop issues to one customer, redeemable once for `points`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: RewardId,
    pub shop_id: ShopId,
    pub user_id: UserId,
    pub points: i64,
    pub description: String,
    /// `None` while the reward is available.
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.claimed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardWithShop {
    #[serde(flatten)]
    pub reward: Reward,
    pub shop_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardWithCustomer {
    #[serde(flatten)]
    pub reward: Reward,
    pub customer_email: Email,
}
