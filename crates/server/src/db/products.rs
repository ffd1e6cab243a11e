//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use localmart_core::{ProductId, ShopId};

use super::RepositoryError;
use crate::models::{Product, ProductWithShop, ShopSummary};

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub(crate) id: ProductId,
    pub(crate) shop_id: ShopId,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: Decimal,
    pub(crate) stock: i32,
    pub(crate) category: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            shop_id: r.shop_id,
            name: r.name,
            description: r.description,
            price: r.price,
            stock: r.stock,
            category: r.category,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductWithShopRow {
    #[sqlx(flatten)]
    product: ProductRow,
    shop_name: String,
    shop_address: String,
}

impl From<ProductWithShopRow> for ProductWithShop {
    fn from(r: ProductWithShopRow) -> Self {
        let shop = ShopSummary {
            id: r.product.shop_id,
            name: r.shop_name,
            address: r.shop_address,
        };
        Self {
            product: r.product.into(),
            shop,
        }
    }
}

/// Listing filter for the public catalog.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of name, description or category.
    pub search: Option<String>,
    pub shop_id: Option<ShopId>,
}

/// Validated fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
}

/// Partial product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Public catalog listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<ProductWithShop>, RepositoryError> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, ProductWithShopRow>(
            r"
            SELECT p.id, p.shop_id, p.name, p.description, p.price, p.stock, p.category,
                   p.created_at, p.updated_at,
                   s.name AS shop_name, s.address AS shop_address
            FROM market.product p
            JOIN market.shop s ON s.id = p.shop_id
            WHERE ($1::int4 IS NULL OR p.shop_id = $1)
              AND ($2::text IS NULL
                   OR p.name ILIKE $2
                   OR p.description ILIKE $2
                   OR p.category ILIKE $2)
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .bind(filter.shop_id)
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductWithShop::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_shop(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithShop>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductWithShopRow>(
            r"
            SELECT p.id, p.shop_id, p.name, p.description, p.price, p.stock, p.category,
                   p.created_at, p.updated_at,
                   s.name AS shop_name, s.address AS shop_address
            FROM market.product p
            JOIN market.shop s ON s.id = p.shop_id
            WHERE p.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductWithShop::from))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, shop_id, name, description, price, stock, category, created_at, updated_at
            FROM market.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Every product of a shop, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_shop(&self, shop_id: ShopId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, shop_id, name, description, price, stock, category, created_at, updated_at
            FROM market.product
            WHERE shop_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(shop_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, shop_id: ShopId, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO market.product (shop_id, name, description, price, stock, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, shop_id, name, description, price, stock, category, created_at, updated_at
            ",
        )
        .bind(shop_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.stock)
        .bind(&new.category)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update. This is the only path that can raise stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE market.product
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                category = COALESCE($6, category)
            WHERE id = $1
            RETURNING id, shop_id, name, description, price, stock, category, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.stock)
        .bind(update.category.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product. Order line items keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM market.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tea"), "%tea%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
