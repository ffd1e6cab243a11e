//! Order repository.
//!
//! Reads go through [`OrderRepository`]. Placement runs as a sequence of
//! steps on one transaction connection, driven by the order service:
//! lock products, decrement stock conditionally, insert the order, credit
//! the buyer's points.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use localmart_core::{Email, OrderId, OrderStatus, ProductId, ShopId, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use super::shops::ShopRow;
use crate::models::{Order, OrderDetails, OrderLine, Product, Shop};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    shop_id: ShopId,
    total: Decimal,
    status: OrderStatus,
    reward_points_earned: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            shop_id: self.shop_id,
            items,
            total: self.total,
            status: self.status,
            reward_points_earned: self.reward_points_earned,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderDetailsRow {
    #[sqlx(flatten)]
    order: OrderRow,
    shop_name: String,
    customer_email: String,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    product_name: Option<String>,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderLine {
    fn from(r: OrderItemRow) -> Self {
        Self {
            product_id: r.product_id,
            product_name: r.product_name,
            quantity: r.quantity,
            price: r.price,
        }
    }
}

/// A fully validated order ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shop_id: ShopId,
    /// Line items as requested, priced at placement time.
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
    pub reward_points_earned: i64,
}

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Customer(UserId),
    Shop(ShopId),
}

/// Repository for reading and transitioning orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderDetailsRow>(
            r"
            SELECT o.id, o.user_id, o.shop_id, o.total, o.status, o.reward_points_earned,
                   o.created_at, o.updated_at,
                   s.name AS shop_name, u.email AS customer_email
            FROM market.customer_order o
            JOIN market.shop s ON s.id = o.shop_id
            JOIN market.user u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut details = self.attach_items(vec![row]).await?;
        Ok(details.pop())
    }

    /// Orders of a customer or a shop, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: OrderScope,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        let (user_id, shop_id) = match scope {
            OrderScope::Customer(user_id) => (Some(user_id), None),
            OrderScope::Shop(shop_id) => (None, Some(shop_id)),
        };

        let rows = sqlx::query_as::<_, OrderDetailsRow>(
            r"
            SELECT o.id, o.user_id, o.shop_id, o.total, o.status, o.reward_points_earned,
                   o.created_at, o.updated_at,
                   s.name AS shop_name, u.email AS customer_email
            FROM market.customer_order o
            JOIN market.shop s ON s.id = o.shop_id
            JOIN market.user u ON u.id = o.user_id
            WHERE ($1::int4 IS NULL OR o.user_id = $1)
              AND ($2::int4 IS NULL OR o.shop_id = $2)
              AND ($3::market.order_status IS NULL OR o.status = $3)
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .bind(user_id)
        .bind(shop_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Move an order from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns `false` when a concurrent update got there first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE market.customer_order
            SET status = $3
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Load line items for a batch of orders, preserving order and item position.
    async fn attach_items(
        &self,
        rows: Vec<OrderDetailsRow>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = rows.iter().map(|r| r.order.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.order_id, i.product_id, p.name AS product_name, i.quantity, i.price
            FROM market.order_item i
            LEFT JOIN market.product p ON p.id = i.product_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.order_id, i.position
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item.into());
        }

        rows.into_iter()
            .map(|r| {
                let customer_email = Email::parse(&r.customer_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                let lines = by_order.remove(&r.order.id).unwrap_or_default();
                Ok(OrderDetails {
                    order: r.order.into_order(lines),
                    shop_name: r.shop_name,
                    customer_email,
                })
            })
            .collect()
    }
}

// =============================================================================
// Placement steps (run on one transaction)
// =============================================================================

/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_shop(conn: &mut PgConnection, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
    let row = sqlx::query_as::<_, ShopRow>(
        r"
        SELECT id, owner_id, name, address, lat, lng, reward_rate, created_at, updated_at
        FROM market.shop
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Shop::try_from).transpose()
}

/// Lock the requested products for the rest of the transaction.
///
/// Rows are locked in id order so concurrent placements cannot deadlock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, shop_id, name, description, price, stock, category, created_at, updated_at
        FROM market.product
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// Decrement stock by `quantity` only if enough is left.
///
/// Returns `false` when the product is missing or short.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE market.product
        SET stock = stock - $2
        WHERE id = $1 AND stock >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Insert the order and its line items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    new: &NewOrder,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO market.customer_order (user_id, shop_id, total, status, reward_points_earned)
        VALUES ($1, $2, $3, 'pending', $4)
        RETURNING id, user_id, shop_id, total, status, reward_points_earned, created_at, updated_at
        ",
    )
    .bind(new.user_id)
    .bind(new.shop_id)
    .bind(new.total)
    .bind(new.reward_points_earned)
    .fetch_one(&mut *conn)
    .await?;

    for (position, line) in (0_i32..).zip(&new.lines) {
        sqlx::query(
            r"
            INSERT INTO market.order_item (order_id, position, product_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(row.id)
        .bind(position)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(row.into_order(new.lines.clone()))
}

/// Add earned points to a user's balance.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
pub async fn credit_points(
    conn: &mut PgConnection,
    user_id: UserId,
    points: i64,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE market.user
        SET reward_points = reward_points + $2
        WHERE id = $1
        ",
    )
    .bind(user_id)
    .bind(points)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
