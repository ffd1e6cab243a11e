//! Reward repository.
//!
//! Claiming debits points and marks the reward in one transaction; the
//! steps below take the transaction's connection.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use localmart_core::{Email, RewardId, ShopId, UserId};

use super::RepositoryError;
use crate::models::{Reward, RewardWithCustomer, RewardWithShop};

#[derive(sqlx::FromRow)]
struct RewardRow {
    id: RewardId,
    shop_id: ShopId,
    user_id: UserId,
    points: i64,
    description: String,
    claimed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<RewardRow> for Reward {
    fn from(r: RewardRow) -> Self {
        Self {
            id: r.id,
            shop_id: r.shop_id,
            user_id: r.user_id,
            points: r.points,
            description: r.description,
            claimed_at: r.claimed_at,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RewardWithShopRow {
    #[sqlx(flatten)]
    reward: RewardRow,
    shop_name: String,
}

#[derive(sqlx::FromRow)]
struct RewardWithCustomerRow {
    #[sqlx(flatten)]
    reward: RewardRow,
    customer_email: String,
}

/// Repository for reward database operations.
pub struct RewardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RewardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Issue a reward from a shop to a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        shop_id: ShopId,
        user_id: UserId,
        points: i64,
        description: &str,
    ) -> Result<Reward, RepositoryError> {
        let row = sqlx::query_as::<_, RewardRow>(
            r"
            INSERT INTO market.reward (shop_id, user_id, points, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, shop_id, user_id, points, description, claimed_at, created_at
            ",
        )
        .bind(shop_id)
        .bind(user_id)
        .bind(points)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Rewards issued to a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RewardWithShop>, RepositoryError> {
        let rows = sqlx::query_as::<_, RewardWithShopRow>(
            r"
            SELECT r.id, r.shop_id, r.user_id, r.points, r.description, r.claimed_at,
                   r.created_at, s.name AS shop_name
            FROM market.reward r
            JOIN market.shop s ON s.id = r.shop_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RewardWithShop {
                reward: r.reward.into(),
                shop_name: r.shop_name,
            })
            .collect())
    }

    /// Rewards a shop has issued, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list_for_shop(
        &self,
        shop_id: ShopId,
    ) -> Result<Vec<RewardWithCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, RewardWithCustomerRow>(
            r"
            SELECT r.id, r.shop_id, r.user_id, r.points, r.description, r.claimed_at,
                   r.created_at, u.email AS customer_email
            FROM market.reward r
            JOIN market.user u ON u.id = r.user_id
            WHERE r.shop_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let customer_email = Email::parse(&r.customer_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                Ok(RewardWithCustomer {
                    reward: r.reward.into(),
                    customer_email,
                })
            })
            .collect()
    }
}

// =============================================================================
// Claim steps (run on one transaction)
// =============================================================================

/// Load and lock a reward row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_reward(
    conn: &mut PgConnection,
    id: RewardId,
) -> Result<Option<Reward>, RepositoryError> {
    let row = sqlx::query_as::<_, RewardRow>(
        r"
        SELECT id, shop_id, user_id, points, description, claimed_at, created_at
        FROM market.reward
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Reward::from))
}

/// Load and lock a user's point balance.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
pub async fn lock_balance(conn: &mut PgConnection, user_id: UserId) -> Result<i64, RepositoryError> {
    let balance: Option<i64> = sqlx::query_scalar(
        r"
        SELECT reward_points
        FROM market.user
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    balance.ok_or(RepositoryError::NotFound)
}

/// Subtract `points` from a balance only if it stays non-negative.
///
/// Returns `false` when the balance is too low.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn debit_points(
    conn: &mut PgConnection,
    user_id: UserId,
    points: i64,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE market.user
        SET reward_points = reward_points - $2
        WHERE id = $1 AND reward_points >= $2
        ",
    )
    .bind(user_id)
    .bind(points)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Stamp `claimed_at` if the reward is still unclaimed.
///
/// Returns `None` when it was already claimed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_claimed(
    conn: &mut PgConnection,
    id: RewardId,
) -> Result<Option<Reward>, RepositoryError> {
    let row = sqlx::query_as::<_, RewardRow>(
        r"
        UPDATE market.reward
        SET claimed_at = now()
        WHERE id = $1 AND claimed_at IS NULL
        RETURNING id, shop_id, user_id, points, description, claimed_at, created_at
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Reward::from))
}
