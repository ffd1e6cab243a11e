//! Shop repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use localmart_core::{GeoPoint, RewardRate, ShopId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Shop;

#[derive(sqlx::FromRow)]
pub(crate) struct ShopRow {
    id: ShopId,
    owner_id: UserId,
    name: String,
    address: String,
    lat: f64,
    lng: f64,
    reward_rate: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = RepositoryError;

    fn try_from(r: ShopRow) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(r.lat, r.lng)
            .map_err(|e| RepositoryError::DataCorruption(format!("shop {}: {e}", r.id)))?;
        let reward_rate = RewardRate::new(r.reward_rate)
            .map_err(|e| RepositoryError::DataCorruption(format!("shop {}: {e}", r.id)))?;

        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            address: r.address,
            location,
            reward_rate,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShopRatingsRow {
    #[sqlx(flatten)]
    shop: ShopRow,
    feedback_count: i64,
    positive_count: i64,
    average_rating: f64,
}

/// Fields for a new shop.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub reward_rate: RewardRate,
}

/// Partial shop update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub reward_rate: Option<RewardRate>,
}

/// A shop with its feedback aggregates.
#[derive(Debug, Clone)]
pub struct ShopRatings {
    pub shop: Shop,
    pub feedback_count: i64,
    /// Feedback entries rated 3 stars or more.
    pub positive_count: i64,
    pub average_rating: f64,
}

/// Headline numbers for a shopkeeper dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShopStats {
    pub total_orders: i64,
    /// Revenue from completed orders only.
    pub total_revenue: Decimal,
    pub total_products: i64,
    pub pending_orders: i64,
}

/// Repository for shop database operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The shop owned by a shopkeeper, if they have set one up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(&self, owner_id: UserId) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            SELECT id, owner_id, name, address, lat, lng, reward_rate, created_at, updated_at
            FROM market.shop
            WHERE owner_id = $1
            ",
        )
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Shop::try_from).transpose()
    }

    /// Create the owner's shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a shop.
    pub async fn create(&self, owner_id: UserId, new: &NewShop) -> Result<Shop, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            INSERT INTO market.shop (owner_id, name, address, lat, lng, reward_rate)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, name, address, lat, lng, reward_rate, created_at, updated_at
            ",
        )
        .bind(owner_id)
        .bind(&new.name)
        .bind(&new.address)
        .bind(new.location.lat)
        .bind(new.location.lng)
        .bind(new.reward_rate.as_decimal())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "shop already exists for this user"))?;

        Shop::try_from(row)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop doesn't exist.
    pub async fn update(&self, id: ShopId, update: &ShopUpdate) -> Result<Shop, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            UPDATE market.shop
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                lat = COALESCE($4, lat),
                lng = COALESCE($5, lng),
                reward_rate = COALESCE($6, reward_rate)
            WHERE id = $1
            RETURNING id, owner_id, name, address, lat, lng, reward_rate, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.address.as_deref())
        .bind(update.lat)
        .bind(update.lng)
        .bind(update.reward_rate.map(|r| r.as_decimal()))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Shop::try_from(row)
    }

    /// All shops with feedback aggregates, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_ratings(&self) -> Result<Vec<ShopRatings>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShopRatingsRow>(
            r"
            SELECT s.id, s.owner_id, s.name, s.address, s.lat, s.lng, s.reward_rate,
                   s.created_at, s.updated_at,
                   COUNT(f.id) AS feedback_count,
                   COUNT(f.id) FILTER (WHERE f.rating >= 3) AS positive_count,
                   COALESCE(AVG(f.rating)::float8, 0) AS average_rating
            FROM market.shop s
            LEFT JOIN market.feedback f ON f.shop_id = s.id
            GROUP BY s.id
            ORDER BY s.created_at DESC, s.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(ShopRatings {
                    shop: Shop::try_from(r.shop)?,
                    feedback_count: r.feedback_count,
                    positive_count: r.positive_count,
                    average_rating: r.average_rating,
                })
            })
            .collect()
    }

    /// Dashboard counters for one shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, id: ShopId) -> Result<ShopStats, RepositoryError> {
        let stats = sqlx::query_as::<_, ShopStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM market.customer_order WHERE shop_id = $1) AS total_orders,
                (SELECT COALESCE(SUM(total), 0) FROM market.customer_order
                  WHERE shop_id = $1 AND status = 'completed') AS total_revenue,
                (SELECT COUNT(*) FROM market.product WHERE shop_id = $1) AS total_products,
                (SELECT COUNT(*) FROM market.customer_order
                  WHERE shop_id = $1 AND status = 'pending') AS pending_orders
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}
