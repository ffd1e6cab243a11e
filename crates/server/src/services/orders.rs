//! Order service: placement and the status state machine.
//!
//! Placement runs in one transaction. The cart is checked for shape before
//! any database access, then the shop and products are loaded with the
//! product rows locked, the whole cart is validated, and only then is
//! stock decremented, the order written and the buyer's points credited.
//! Any error drops the transaction, which rolls every step back.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use localmart_core::{
    MAX_AMOUNT, OrderId, OrderStatus, ProductId, ShopId, UserId, line_total, reward_points_for,
};

use super::MarketError;
use super::catalog::{not_found_as, require_customer};
use crate::db::RepositoryError;
use crate::db::orders::{self, NewOrder, OrderRepository, OrderScope};
use crate::db::shops::ShopRepository;
use crate::models::{CurrentUser, OrderDetails, OrderLine, Product, Shop};

/// One requested cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A validated order plus the stock to take, one entry per product in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub order: NewOrder,
    pub decrements: Vec<(ProductId, i32)>,
}

/// Reject an empty cart or a line with quantity below 1.
///
/// # Errors
///
/// Returns `MarketError::InvalidRequest` describing the first problem.
pub fn validate_cart(cart: &[CartLine]) -> Result<(), MarketError> {
    if cart.is_empty() {
        return Err(MarketError::InvalidRequest(
            "order must contain at least one item".to_owned(),
        ));
    }
    if let Some(line) = cart.iter().find(|l| l.quantity < 1) {
        return Err(MarketError::InvalidRequest(format!(
            "quantity for product {} must be at least 1",
            line.product_id
        )));
    }
    Ok(())
}

/// Validate a cart against the shop and its current catalog rows and price it.
///
/// Checks run over the whole cart in this order: every product exists,
/// every product belongs to `shop`, and stock covers the summed quantity
/// per product. Lines are kept as given; unit prices are the products'
/// current prices.
///
/// # Errors
///
/// Returns `NotFound` for an unknown product, `InvalidRequest` for a
/// product of another shop, an oversized quantity or a total above
/// [`MAX_AMOUNT`], and
/// `InsufficientStock` when stock is short.
pub fn plan_order(
    user_id: UserId,
    shop: &Shop,
    cart: &[CartLine],
    products: &[Product],
) -> Result<OrderPlan, MarketError> {
    validate_cart(cart)?;

    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut resolved = Vec::with_capacity(cart.len());
    for line in cart {
        let product = by_id
            .get(&line.product_id)
            .copied()
            .ok_or_else(|| MarketError::NotFound(format!("product {}", line.product_id)))?;
        resolved.push((line, product));
    }

    if let Some((_, product)) = resolved.iter().find(|(_, p)| p.shop_id != shop.id) {
        return Err(MarketError::InvalidRequest(format!(
            "product {} does not belong to shop {}",
            product.id, shop.id
        )));
    }

    let mut wanted: BTreeMap<ProductId, i64> = BTreeMap::new();
    for (line, _) in &resolved {
        let total = wanted.entry(line.product_id).or_default();
        *total = total.saturating_add(line.quantity);
    }

    let mut decrements = Vec::with_capacity(wanted.len());
    for (id, quantity) in wanted {
        let product = by_id
            .get(&id)
            .copied()
            .ok_or_else(|| MarketError::NotFound(format!("product {id}")))?;
        let quantity = i32::try_from(quantity)
            .map_err(|_| MarketError::InvalidRequest(format!("quantity for product {id} is too large")))?;
        if quantity > product.stock {
            return Err(MarketError::InsufficientStock(format!(
                "insufficient stock for {}: {} requested, {} available",
                product.name, quantity, product.stock
            )));
        }
        decrements.push((id, quantity));
    }

    let mut total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(resolved.len());
    for (line, product) in resolved {
        // Bounded by the stock check above.
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            MarketError::InvalidRequest(format!("quantity for product {} is too large", product.id))
        })?;
        total = total
            .checked_add(line_total(product.price, quantity.unsigned_abs()))
            .filter(|t| *t <= MAX_AMOUNT)
            .ok_or_else(|| {
                MarketError::InvalidRequest(format!("order total must be at most {MAX_AMOUNT}"))
            })?;
        lines.push(OrderLine {
            product_id: product.id,
            product_name: Some(product.name.clone()),
            quantity,
            price: product.price,
        });
    }

    Ok(OrderPlan {
        order: NewOrder {
            user_id,
            shop_id: shop.id,
            lines,
            total,
            reward_points_earned: reward_points_for(total, shop.reward_rate),
        },
        decrements,
    })
}

/// Parse a status filter; `None`, empty and `all` mean every status.
///
/// # Errors
///
/// Returns `MarketError::InvalidRequest` for an unknown status.
pub fn parse_status_filter(status: Option<&str>) -> Result<Option<OrderStatus>, MarketError> {
    match status.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(s) => Ok(Some(s.parse::<OrderStatus>()?)),
    }
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
    shops: ShopRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
            shops: ShopRepository::new(pool),
        }
    }

    /// Place an order for a customer.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-customers, `InvalidRequest`, `NotFound`
    /// or `InsufficientStock` when validation fails. Nothing is written in
    /// any error case.
    #[instrument(skip(self, cart), fields(user_id = %user.id, shop_id = %shop_id, lines = cart.len()))]
    pub async fn place(
        &self,
        user: &CurrentUser,
        shop_id: ShopId,
        cart: &[CartLine],
    ) -> Result<OrderDetails, MarketError> {
        require_customer(user)?;
        validate_cart(cart)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let shop = orders::get_shop(&mut *tx, shop_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("shop".to_owned()))?;

        let ids: Vec<ProductId> = cart
            .iter()
            .map(|l| l.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products = orders::lock_products(&mut *tx, &ids).await?;

        let plan = plan_order(user.id, &shop, cart, &products)?;

        for &(product_id, quantity) in &plan.decrements {
            if !orders::decrement_stock(&mut *tx, product_id, quantity).await? {
                return Err(MarketError::InsufficientStock(format!(
                    "insufficient stock for product {product_id}"
                )));
            }
        }

        let order = orders::insert_order(&mut *tx, &plan.order).await?;
        orders::credit_points(&mut *tx, user.id, order.reward_points_earned)
            .await
            .map_err(not_found_as("user"))?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            order_id = %order.id,
            total = %order.total,
            points = order.reward_points_earned,
            "Order placed"
        );

        Ok(OrderDetails {
            order,
            shop_name: shop.name,
            customer_email: user.email.clone(),
        })
    }

    /// Orders visible to the caller: their own as a customer, their
    /// shop's as a shopkeeper.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::InvalidRequest` for an unknown status filter.
    pub async fn list(
        &self,
        user: &CurrentUser,
        status: Option<&str>,
    ) -> Result<Vec<OrderDetails>, MarketError> {
        let status = parse_status_filter(status)?;

        let scope = if user.is_shopkeeper() {
            match self.shops.get_by_owner(user.id).await? {
                Some(shop) => OrderScope::Shop(shop.id),
                None => return Ok(Vec::new()),
            }
        } else {
            OrderScope::Customer(user.id)
        };

        Ok(self.orders.list(scope, status).await?)
    }

    /// One order, visible to its buyer and the owning shopkeeper.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order doesn't exist and `Forbidden` if the
    /// caller may not see it.
    pub async fn get(&self, user: &CurrentUser, id: OrderId) -> Result<OrderDetails, MarketError> {
        let details = self.load(id).await?;
        if details.order.user_id == user.id || self.owns_shop(user, details.order.shop_id).await? {
            Ok(details)
        } else {
            Err(MarketError::Forbidden(
                "you do not have access to this order".to_owned(),
            ))
        }
    }

    /// Advance an order one step. Only the owning shopkeeper may do this.
    ///
    /// Requesting the current status returns the order unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an unknown status, `NotFound`,
    /// `Forbidden` for anyone but the owning shopkeeper, and `InvalidState`
    /// for a backward or skipping move.
    #[instrument(skip(self), fields(user_id = %user.id, order_id = %id))]
    pub async fn update_status(
        &self,
        user: &CurrentUser,
        id: OrderId,
        status: &str,
    ) -> Result<OrderDetails, MarketError> {
        let target: OrderStatus = status.trim().parse()?;
        let details = self.load(id).await?;

        if !self.owns_shop(user, details.order.shop_id).await? {
            return Err(MarketError::Forbidden(
                "only the shop owner can update order status".to_owned(),
            ));
        }

        let current = details.order.status;
        if !current.check_transition(target)? {
            return Ok(details);
        }

        if !self.orders.transition_status(id, current, target).await? {
            return Err(MarketError::InvalidState(
                "order status changed concurrently".to_owned(),
            ));
        }

        tracing::info!(from = %current, to = %target, "Order status updated");
        self.load(id).await
    }

    async fn load(&self, id: OrderId) -> Result<OrderDetails, MarketError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| MarketError::NotFound("order".to_owned()))
    }

    async fn owns_shop(&self, user: &CurrentUser, shop_id: ShopId) -> Result<bool, MarketError> {
        if !user.is_shopkeeper() {
            return Ok(false);
        }
        Ok(self
            .shops
            .get_by_owner(user.id)
            .await?
            .is_some_and(|shop| shop.id == shop_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use localmart_core::{GeoPoint, RewardRate};

    use super::*;

    fn shop(id: i32, rate: Decimal) -> Shop {
        Shop {
            id: ShopId::new(id),
            owner_id: UserId::new(100 + id),
            name: format!("Shop {id}"),
            address: "1 Market Sq".to_owned(),
            location: GeoPoint::new(0.0, 0.0).unwrap(),
            reward_rate: RewardRate::new(rate).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, shop_id: i32, price: Decimal, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            shop_id: ShopId::new(shop_id),
            name: format!("Product {id}"),
            description: String::new(),
            price,
            stock,
            category: "General".to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product_id: i32, quantity: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[test]
    fn test_total_beyond_storable_amount_rejected() {
        let shop = shop(1, Decimal::new(1, 1));
        let products = [product(1, 1, Decimal::new(100_000_000, 0), 1000)];

        let err = plan_order(UserId::new(7), &shop, &[line(1, 200)], &products).unwrap_err();
        assert!(matches!(err, MarketError::InvalidRequest(_)), "{err:?}");

        // 99 * 100,000,000 = 9,900,000,000 still fits
        let plan = plan_order(UserId::new(7), &shop, &[line(1, 99)], &products).unwrap();
        assert_eq!(plan.order.total, Decimal::new(9_900_000_000, 0));
    }

    #[test]
    fn test_total_and_points_from_current_prices() {
        let shop = shop(1, Decimal::new(1, 1));
        let products = [
            product(1, 1, Decimal::new(1250, 2), 10),
            product(2, 1, Decimal::new(399, 2), 5),
        ];
        let plan = plan_order(UserId::new(7), &shop, &[line(1, 2), line(2, 3)], &products).unwrap();

        // 2 * 12.50 + 3 * 3.99 = 36.97
        assert_eq!(plan.order.total, Decimal::new(3697, 2));
        assert_eq!(plan.order.reward_points_earned, 3);
        assert_eq!(plan.order.lines[0].price, Decimal::new(1250, 2));
        assert_eq!(plan.order.lines[1].quantity, 3);
        let sum: Decimal = plan.order.lines.iter().map(OrderLine::subtotal).sum();
        assert_eq!(sum, plan.order.total);
        assert_eq!(
            plan.decrements,
            vec![(ProductId::new(1), 2), (ProductId::new(2), 3)]
        );
    }

    #[test]
    fn test_duplicate_lines_merge_for_stock_but_stay_separate() {
        let shop = shop(1, Decimal::ZERO);
        let products = [product(4, 1, Decimal::ONE, 5)];

        let plan = plan_order(UserId::new(1), &shop, &[line(4, 2), line(4, 3)], &products).unwrap();
        assert_eq!(plan.order.lines.len(), 2);
        assert_eq!(plan.decrements, vec![(ProductId::new(4), 5)]);
        assert_eq!(plan.order.reward_points_earned, 0);

        let err = plan_order(UserId::new(1), &shop, &[line(4, 3), line(4, 3)], &products).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientStock(_)));
    }

    #[test]
    fn test_unknown_product_is_not_found() {
        let shop = shop(1, Decimal::ONE);
        let products = [product(1, 1, Decimal::ONE, 5)];
        let err = plan_order(UserId::new(1), &shop, &[line(1, 1), line(99, 1)], &products).unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[test]
    fn test_mixed_shop_is_invalid() {
        let shop = shop(1, Decimal::ONE);
        let products = [
            product(1, 1, Decimal::ONE, 5),
            product(2, 2, Decimal::ONE, 5),
        ];
        let err = plan_order(UserId::new(1), &shop, &[line(1, 1), line(2, 1)], &products).unwrap_err();
        assert!(matches!(err, MarketError::InvalidRequest(_)));
    }

    #[test]
    fn test_mixed_shop_reported_before_stock() {
        let shop = shop(1, Decimal::ONE);
        let products = [
            product(1, 1, Decimal::ONE, 0),
            product(2, 2, Decimal::ONE, 5),
        ];
        let err = plan_order(UserId::new(1), &shop, &[line(1, 1), line(2, 1)], &products).unwrap_err();
        assert!(matches!(err, MarketError::InvalidRequest(_)));
    }

    #[test]
    fn test_quantity_over_stock() {
        let shop = shop(1, Decimal::ONE);
        let products = [product(1, 1, Decimal::ONE, 2)];
        let err = plan_order(UserId::new(1), &shop, &[line(1, 3)], &products).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientStock(_)));
    }

    #[test]
    fn test_cart_shape() {
        assert!(matches!(validate_cart(&[]), Err(MarketError::InvalidRequest(_))));
        assert!(matches!(
            validate_cart(&[line(1, 1), line(2, 0)]),
            Err(MarketError::InvalidRequest(_))
        ));
        assert!(validate_cart(&[line(1, -3)]).is_err());
        assert!(validate_cart(&[line(1, 1)]).is_ok());
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("packed")).unwrap(),
            Some(OrderStatus::Packed)
        );
        assert!(matches!(
            parse_status_filter(Some("shipped")),
            Err(MarketError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_cart_line_json() {
        let cart: Vec<CartLine> =
            serde_json::from_str(r#"[{"productId": 3, "quantity": 2}]"#).unwrap();
        assert_eq!(cart, vec![line(3, 2)]);
    }
}
