//! Feedback repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use localmart_core::{Email, FeedbackId, OrderId, Rating, ShopId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Feedback, FeedbackDetails};

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: FeedbackId,
    user_id: UserId,
    shop_id: ShopId,
    order_id: OrderId,
    rating: Rating,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(r: FeedbackRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            shop_id: r.shop_id,
            order_id: r.order_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FeedbackDetailsRow {
    #[sqlx(flatten)]
    feedback: FeedbackRow,
    customer_name: String,
    customer_email: String,
    shop_name: String,
    order_total: Decimal,
    order_created_at: DateTime<Utc>,
}

impl TryFrom<FeedbackDetailsRow> for FeedbackDetails {
    type Error = RepositoryError;

    fn try_from(r: FeedbackDetailsRow) -> Result<Self, Self::Error> {
        let customer_email = Email::parse(&r.customer_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            feedback: r.feedback.into(),
            customer_name: r.customer_name,
            customer_email,
            shop_name: r.shop_name,
            order_total: r.order_total,
            order_created_at: r.order_created_at,
        })
    }
}

/// Repository for feedback database operations.
pub struct FeedbackRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FeedbackRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record feedback for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order already has feedback.
    pub async fn create(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        order_id: OrderId,
        rating: Rating,
        comment: &str,
    ) -> Result<Feedback, RepositoryError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r"
            INSERT INTO market.feedback (user_id, shop_id, order_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, shop_id, order_id, rating, comment, created_at
            ",
        )
        .bind(user_id)
        .bind(shop_id)
        .bind(order_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "feedback has already been submitted for this order"))?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_order(&self, order_id: OrderId) -> Result<Option<Feedback>, RepositoryError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r"
            SELECT id, user_id, shop_id, order_id, rating, comment, created_at
            FROM market.feedback
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Feedback::from))
    }

    /// Feedback left for a shop, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_shop(
        &self,
        shop_id: ShopId,
    ) -> Result<Vec<FeedbackDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, FeedbackDetailsRow>(
            r"
            SELECT f.id, f.user_id, f.shop_id, f.order_id, f.rating, f.comment, f.created_at,
                   u.name AS customer_name, u.email AS customer_email,
                   s.name AS shop_name,
                   o.total AS order_total, o.created_at AS order_created_at
            FROM market.feedback f
            JOIN market.user u ON u.id = f.user_id
            JOIN market.shop s ON s.id = f.shop_id
            JOIN market.customer_order o ON o.id = f.order_id
            WHERE f.shop_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            ",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(FeedbackDetails::try_from).collect()
    }

    /// Feedback a customer has written, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FeedbackDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, FeedbackDetailsRow>(
            r"
            SELECT f.id, f.user_id, f.shop_id, f.order_id, f.rating, f.comment, f.created_at,
                   u.name AS customer_name, u.email AS customer_email,
                   s.name AS shop_name,
                   o.total AS order_total, o.created_at AS order_created_at
            FROM market.feedback f
            JOIN market.user u ON u.id = f.user_id
            JOIN market.shop s ON s.id = f.shop_id
            JOIN market.customer_order o ON o.id = f.order_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(FeedbackDetails::try_from).collect()
    }
}
