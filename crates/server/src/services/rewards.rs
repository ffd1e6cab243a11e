//! Reward ledger.
//!
//! Points accrue only through order placement. Shopkeepers issue rewards
//! to a specific customer; the customer claims each reward once, paying
//! its point cost. A claim debits the balance and stamps the reward in a
//! single transaction.

use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use localmart_core::{RewardId, Role, UserId};

use super::MarketError;
use super::catalog::{not_found_as, require_customer, require_shopkeeper};
use crate::db::RepositoryError;
use crate::db::rewards::{self, RewardRepository};
use crate::db::shops::ShopRepository;
use crate::db::users::UserRepository;
use crate::models::{CurrentUser, Reward, RewardWithCustomer, RewardWithShop};

/// Reward issued by a shopkeeper.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardInput {
    pub user_id: UserId,
    pub points: i64,
    pub description: String,
}

/// Decide whether `user_id` may claim `reward` with `balance` points.
///
/// # Errors
///
/// Returns `Forbidden` if the reward was issued to someone else,
/// `AlreadyClaimed` if it was claimed before, and `InsufficientPoints`
/// if the balance does not cover the cost.
pub fn check_claim(reward: &Reward, user_id: UserId, balance: i64) -> Result<(), MarketError> {
    if reward.user_id != user_id {
        return Err(MarketError::Forbidden(
            "this reward was issued to another customer".to_owned(),
        ));
    }
    if reward.is_claimed() {
        return Err(MarketError::AlreadyClaimed);
    }
    if balance < reward.points {
        return Err(MarketError::InsufficientPoints {
            required: reward.points,
            available: balance,
        });
    }
    Ok(())
}

/// Reward service.
pub struct RewardService<'a> {
    pool: &'a PgPool,
    rewards: RewardRepository<'a>,
    shops: ShopRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> RewardService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            rewards: RewardRepository::new(pool),
            shops: ShopRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Issue a reward from the caller's shop to a customer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for bad input or a non-customer target,
    /// `NotFound` if the caller has no shop or the target user is unknown.
    #[instrument(skip(self, input), fields(user_id = %user.id, target = %input.user_id))]
    pub async fn issue(&self, user: &CurrentUser, input: RewardInput) -> Result<Reward, MarketError> {
        require_shopkeeper(user)?;

        if input.points < 1 {
            return Err(MarketError::InvalidRequest(
                "points must be at least 1".to_owned(),
            ));
        }
        let description = input.description.trim();
        if description.is_empty() {
            return Err(MarketError::InvalidRequest(
                "description is required".to_owned(),
            ));
        }

        let shop = self
            .shops
            .get_by_owner(user.id)
            .await?
            .ok_or_else(|| MarketError::NotFound("shop".to_owned()))?;

        let target = self
            .users
            .get_by_id(input.user_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("user".to_owned()))?;
        if target.role != Role::Customer {
            return Err(MarketError::InvalidRequest(
                "rewards can only be issued to customers".to_owned(),
            ));
        }

        let reward = self
            .rewards
            .create(shop.id, target.id, input.points, description)
            .await?;

        tracing::info!(reward_id = %reward.id, points = reward.points, "Reward issued");
        Ok(reward)
    }

    /// Rewards issued to the caller.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if the query fails.
    pub async fn for_customer(&self, user: &CurrentUser) -> Result<Vec<RewardWithShop>, MarketError> {
        Ok(self.rewards.list_for_user(user.id).await?)
    }

    /// Rewards the caller's shop has issued; empty without a shop.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if a query fails.
    pub async fn for_shop(&self, user: &CurrentUser) -> Result<Vec<RewardWithCustomer>, MarketError> {
        require_shopkeeper(user)?;
        match self.shops.get_by_owner(user.id).await? {
            Some(shop) => Ok(self.rewards.list_for_shop(shop.id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Claim a reward, paying its point cost.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, `AlreadyClaimed` or
    /// `InsufficientPoints`. No points move in any error case.
    #[instrument(skip(self), fields(user_id = %user.id, reward_id = %id))]
    pub async fn claim(&self, user: &CurrentUser, id: RewardId) -> Result<Reward, MarketError> {
        require_customer(user)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let reward = rewards::lock_reward(&mut *tx, id)
            .await?
            .ok_or_else(|| MarketError::NotFound("reward".to_owned()))?;
        let balance = rewards::lock_balance(&mut *tx, user.id)
            .await
            .map_err(not_found_as("user"))?;

        check_claim(&reward, user.id, balance)?;

        if !rewards::debit_points(&mut *tx, user.id, reward.points).await? {
            return Err(MarketError::InsufficientPoints {
                required: reward.points,
                available: balance,
            });
        }
        let claimed = rewards::mark_claimed(&mut *tx, id)
            .await?
            .ok_or(MarketError::AlreadyClaimed)?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(points = claimed.points, "Reward claimed");
        Ok(claimed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use localmart_core::ShopId;

    use super::*;

    fn reward(user_id: i32, points: i64, claimed: bool) -> Reward {
        Reward {
            id: RewardId::new(1),
            shop_id: ShopId::new(1),
            user_id: UserId::new(user_id),
            points,
            description: "Free coffee".to_owned(),
            claimed_at: claimed.then(Utc::now),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_claim_allowed() {
        assert!(check_claim(&reward(5, 50, false), UserId::new(5), 50).is_ok());
    }

    #[test]
    fn test_claim_by_other_customer_is_forbidden() {
        let err = check_claim(&reward(5, 10, false), UserId::new(6), 1_000).unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[test]
    fn test_second_claim_rejected() {
        let err = check_claim(&reward(5, 10, true), UserId::new(5), 1_000).unwrap_err();
        assert!(matches!(err, MarketError::AlreadyClaimed));
    }

    #[test]
    fn test_short_balance() {
        let err = check_claim(&reward(5, 100, false), UserId::new(5), 99).unwrap_err();
        assert!(matches!(
            err,
            MarketError::InsufficientPoints {
                required: 100,
                available: 99
            }
        ));
    }

    #[test]
    fn test_reward_input_json() {
        let input: RewardInput =
            serde_json::from_str(r#"{"userId": 4, "points": 25, "description": "Tote bag"}"#).unwrap();
        assert_eq!(input.user_id, UserId::new(4));
        assert_eq!(input.points, 25);
    }
}
