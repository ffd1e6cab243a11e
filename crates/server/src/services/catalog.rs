//! Catalog service: shops, products, and the public shop directory.
//!
//! Shopkeepers own exactly one shop and may only touch products of that
//! shop. Everything read-only here is public.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use localmart_core::{GeoPoint, MAX_AMOUNT, ProductId, RewardRate, Role, ShopId};

use super::MarketError;
use super::error::conflict_or_repository;
use crate::db::RepositoryError;
use crate::db::products::{NewProduct, ProductFilter, ProductRepository, ProductUpdate};
use crate::db::shops::{NewShop, ShopRatings, ShopRepository, ShopStats, ShopUpdate};
use crate::models::{CurrentUser, Product, ProductWithShop, Shop, ShopListing};

/// Feedback entries rated at least 3 stars needed for the elite badge.
pub const ELITE_MIN_POSITIVE_FEEDBACK: i64 = 5;

/// Category used when a product is created without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Shop setup form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopInput {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub reward_rate: Option<Decimal>,
}

/// Shop profile edit; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub reward_rate: Option<Decimal>,
}

/// New product form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Product edit; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub category: Option<String>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    shops: ShopRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            shops: ShopRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// Create the caller's shop.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Forbidden` for customers, `InvalidRequest` for
    /// bad fields, and `Conflict` if the caller already has a shop.
    #[instrument(skip(self, input), fields(user_id = %user.id))]
    pub async fn setup_shop(&self, user: &CurrentUser, input: ShopInput) -> Result<Shop, MarketError> {
        require_shopkeeper(user)?;

        let new = NewShop {
            name: required_text("name", &input.name)?,
            address: required_text("address", &input.address)?,
            location: parse_location(input.lat, input.lng)?,
            reward_rate: parse_rate(input.reward_rate)?.unwrap_or_default(),
        };

        let shop = self
            .shops
            .create(user.id, &new)
            .await
            .map_err(conflict_or_repository)?;

        tracing::info!(shop_id = %shop.id, "Shop created");
        Ok(shop)
    }

    /// The caller's shop, if any.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if the lookup fails.
    pub async fn shop_for(&self, user: &CurrentUser) -> Result<Option<Shop>, MarketError> {
        Ok(self.shops.get_by_owner(user.id).await?)
    }

    /// The caller's shop.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NotFound` if the caller has no shop.
    pub async fn require_shop(&self, user: &CurrentUser) -> Result<Shop, MarketError> {
        self.shop_for(user)
            .await?
            .ok_or_else(|| MarketError::NotFound("shop".to_owned()))
    }

    /// Partially update the caller's shop.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NotFound` if the caller has no shop and
    /// `InvalidRequest` for bad fields.
    #[instrument(skip(self, patch), fields(user_id = %user.id))]
    pub async fn update_shop(&self, user: &CurrentUser, patch: ShopPatch) -> Result<Shop, MarketError> {
        let shop = self.require_shop(user).await?;

        let location = parse_location(
            patch.lat.unwrap_or(shop.location.lat),
            patch.lng.unwrap_or(shop.location.lng),
        )?;
        let update = ShopUpdate {
            name: patch.name.as_deref().map(|n| required_text("name", n)).transpose()?,
            address: patch
                .address
                .as_deref()
                .map(|a| required_text("address", a))
                .transpose()?,
            lat: patch.lat.map(|_| location.lat),
            lng: patch.lng.map(|_| location.lng),
            reward_rate: parse_rate(patch.reward_rate)?,
        };

        Ok(self.shops.update(shop.id, &update).await?)
    }

    /// Every shop with its rating badge, nearest first when `near` is given.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if the query fails.
    pub async fn directory(&self, near: Option<GeoPoint>) -> Result<Vec<ShopListing>, MarketError> {
        let shops = self.shops.list_with_ratings().await?;
        Ok(build_directory(shops, near))
    }

    /// Dashboard counters; zeros when the caller has no shop yet.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if a query fails.
    pub async fn stats(&self, user: &CurrentUser) -> Result<ShopStats, MarketError> {
        match self.shop_for(user).await? {
            Some(shop) => Ok(self.shops.stats(shop.id).await?),
            None => Ok(ShopStats::default()),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Public product search.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::Repository` if the query fails.
    pub async fn products(
        &self,
        search: Option<&str>,
        shop_id: Option<ShopId>,
    ) -> Result<Vec<ProductWithShop>, MarketError> {
        let filter = ProductFilter {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            shop_id,
        };
        Ok(self.products.list(&filter).await?)
    }

    /// # Errors
    ///
    /// Returns `MarketError::NotFound` if the product doesn't exist.
    pub async fn product(&self, id: ProductId) -> Result<ProductWithShop, MarketError> {
        self.products
            .get_with_shop(id)
            .await?
            .ok_or_else(|| MarketError::NotFound("product".to_owned()))
    }

    /// Add a product to the caller's shop.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NotFound` if the caller has no shop and
    /// `InvalidRequest` for bad fields.
    #[instrument(skip(self, input), fields(user_id = %user.id))]
    pub async fn create_product(
        &self,
        user: &CurrentUser,
        input: ProductInput,
    ) -> Result<Product, MarketError> {
        require_shopkeeper(user)?;
        let shop = self.require_shop(user).await?;

        let new = NewProduct {
            name: required_text("name", &input.name)?,
            description: input.description.unwrap_or_default().trim().to_owned(),
            price: validate_price(input.price)?,
            stock: validate_stock(input.stock)?,
            category: input
                .category
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
        };

        let product = self.products.create(shop.id, &new).await?;
        tracing::info!(product_id = %product.id, shop_id = %shop.id, "Product created");
        Ok(product)
    }

    /// Edit a product of the caller's shop. The only way stock goes up.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NotFound` if the product doesn't exist,
    /// `Forbidden` if it belongs to another shop, `InvalidRequest` for bad fields.
    #[instrument(skip(self, patch), fields(user_id = %user.id, product_id = %id))]
    pub async fn update_product(
        &self,
        user: &CurrentUser,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, MarketError> {
        self.owned_product(user, id).await?;

        let update = ProductUpdate {
            name: patch.name.as_deref().map(|n| required_text("name", n)).transpose()?,
            description: patch.description.map(|d| d.trim().to_owned()),
            price: patch.price.map(validate_price).transpose()?,
            stock: patch.stock.map(validate_stock).transpose()?,
            category: patch
                .category
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
        };

        self.products.update(id, &update).await.map_err(not_found_as("product"))
    }

    /// Remove a product of the caller's shop.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::NotFound` if the product doesn't exist and
    /// `Forbidden` if it belongs to another shop.
    #[instrument(skip(self), fields(user_id = %user.id, product_id = %id))]
    pub async fn delete_product(&self, user: &CurrentUser, id: ProductId) -> Result<(), MarketError> {
        self.owned_product(user, id).await?;
        self.products.delete(id).await.map_err(not_found_as("product"))
    }

    async fn owned_product(&self, user: &CurrentUser, id: ProductId) -> Result<Product, MarketError> {
        require_shopkeeper(user)?;
        let product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| MarketError::NotFound("product".to_owned()))?;

        let owns = self
            .shop_for(user)
            .await?
            .is_some_and(|shop| shop.id == product.shop_id);
        if !owns {
            return Err(MarketError::Forbidden(
                "product belongs to another shop".to_owned(),
            ));
        }
        Ok(product)
    }
}

/// Attach distance and the elite badge, then order the directory.
///
/// Without `near` the repository order (newest first) is kept.
#[must_use]
pub fn build_directory(shops: Vec<ShopRatings>, near: Option<GeoPoint>) -> Vec<ShopListing> {
    let mut listings: Vec<ShopListing> = shops
        .into_iter()
        .map(|r| ShopListing {
            distance: near.map(|p| p.distance_km(&r.shop.location)),
            elite: r.positive_count >= ELITE_MIN_POSITIVE_FEEDBACK,
            average_rating: r.average_rating,
            feedback_count: r.feedback_count,
            shop: r.shop,
        })
        .collect();

    if near.is_some() {
        listings.sort_by(|a, b| {
            a.distance
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.distance.unwrap_or(f64::INFINITY))
        });
    }
    listings
}

pub(crate) fn require_shopkeeper(user: &CurrentUser) -> Result<(), MarketError> {
    if user.role == Role::Shopkeeper {
        Ok(())
    } else {
        Err(MarketError::Forbidden("shopkeeper access required".to_owned()))
    }
}

pub(crate) fn require_customer(user: &CurrentUser) -> Result<(), MarketError> {
    if user.role == Role::Customer {
        Ok(())
    } else {
        Err(MarketError::Forbidden("customer access required".to_owned()))
    }
}

pub(crate) fn not_found_as(what: &'static str) -> impl Fn(RepositoryError) -> MarketError {
    move |e| match e {
        RepositoryError::NotFound => MarketError::NotFound(what.to_owned()),
        other => MarketError::Repository(other),
    }
}

fn required_text(field: &str, value: &str) -> Result<String, MarketError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MarketError::InvalidRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

fn parse_location(lat: f64, lng: f64) -> Result<GeoPoint, MarketError> {
    GeoPoint::new(lat, lng).map_err(|e| MarketError::InvalidRequest(e.to_string()))
}

fn parse_rate(rate: Option<Decimal>) -> Result<Option<RewardRate>, MarketError> {
    rate.map(RewardRate::new)
        .transpose()
        .map_err(|e| MarketError::InvalidRequest(e.to_string()))
}

fn validate_price(price: Decimal) -> Result<Decimal, MarketError> {
    if price < Decimal::ZERO {
        return Err(MarketError::InvalidRequest(
            "price must be non-negative".to_owned(),
        ));
    }
    let price = price.round_dp(2);
    if price > MAX_AMOUNT {
        return Err(MarketError::InvalidRequest(format!(
            "price must be at most {MAX_AMOUNT}"
        )));
    }
    Ok(price)
}

fn validate_stock(stock: i64) -> Result<i32, MarketError> {
    if stock < 0 {
        return Err(MarketError::InvalidRequest(
            "stock must be non-negative".to_owned(),
        ));
    }
    i32::try_from(stock).map_err(|_| MarketError::InvalidRequest("stock is too large".to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use localmart_core::{Email, UserId};

    use super::*;

    fn ratings(id: i32, lat: f64, lng: f64, positive: i64) -> ShopRatings {
        ShopRatings {
            shop: Shop {
                id: ShopId::new(id),
                owner_id: UserId::new(id),
                name: format!("Shop {id}"),
                address: "Main St".to_owned(),
                location: GeoPoint::new(lat, lng).unwrap(),
                reward_rate: RewardRate::default(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            feedback_count: positive,
            positive_count: positive,
            average_rating: if positive > 0 { 4.0 } else { 0.0 },
        }
    }

    #[test]
    fn test_directory_sorts_nearest_first() {
        let shops = vec![ratings(1, 10.0, 10.0, 0), ratings(2, 0.5, 0.5, 0), ratings(3, 0.0, 0.0, 0)];
        let listed = build_directory(shops, Some(GeoPoint::new(0.0, 0.0).unwrap()));

        let ids: Vec<i32> = listed.iter().map(|l| l.shop.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(listed[0].distance, Some(0.0));
    }

    #[test]
    fn test_directory_keeps_order_without_location() {
        let shops = vec![ratings(1, 10.0, 10.0, 0), ratings(2, 0.0, 0.0, 0)];
        let listed = build_directory(shops, None);

        assert_eq!(listed[0].shop.id, ShopId::new(1));
        assert!(listed.iter().all(|l| l.distance.is_none()));
    }

    #[test]
    fn test_elite_needs_five_positive_reviews() {
        let listed = build_directory(vec![ratings(1, 0.0, 0.0, 4), ratings(2, 0.0, 0.0, 5)], None);
        assert!(!listed[0].elite);
        assert!(listed[1].elite);
    }

    #[test]
    fn test_role_guards() {
        let mut user = CurrentUser {
            id: UserId::new(1),
            email: Email::parse("k@example.com").unwrap(),
            name: "Keeper".to_owned(),
            role: Role::Shopkeeper,
        };
        assert!(require_shopkeeper(&user).is_ok());
        assert!(matches!(require_customer(&user), Err(MarketError::Forbidden(_))));

        user.role = Role::Customer;
        assert!(require_customer(&user).is_ok());
        assert!(matches!(require_shopkeeper(&user), Err(MarketError::Forbidden(_))));
    }

    #[test]
    fn test_field_validation() {
        assert!(matches!(required_text("name", "  "), Err(MarketError::InvalidRequest(_))));
        assert_eq!(required_text("name", " Tea ").unwrap(), "Tea");

        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert_eq!(validate_price(Decimal::new(1999, 3)).unwrap(), Decimal::new(200, 2));
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert_eq!(validate_price(MAX_AMOUNT).unwrap(), MAX_AMOUNT);
        assert!(validate_price(Decimal::new(100_000_000_000, 0)).is_err());
        assert!(validate_price(Decimal::new(9_999_999_999_999, 3)).is_err());

        assert!(validate_stock(-1).is_err());
        assert!(validate_stock(i64::from(i32::MAX) + 1).is_err());
        assert_eq!(validate_stock(12).unwrap(), 12);

        assert!(parse_location(91.0, 0.0).is_err());
        assert!(parse_rate(Some(Decimal::new(-5, 1))).is_err());
        assert_eq!(parse_rate(None).unwrap(), None);
        assert!(matches!(
            parse_rate(Some(Decimal::new(10_000, 0))),
            Err(MarketError::InvalidRequest(_))
        ));
        assert!(parse_rate(Some(Decimal::new(99_999_999, 4))).is_ok());
    }
}
