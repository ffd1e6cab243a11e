//! Order model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use localmart_core::{Email, OrderId, OrderStatus, ProductId, ShopId, UserId};

/// A placed order.
///
/// `total` and `reward_points_earned` are computed once at placement and
/// never recomputed, even if catalog prices or the shop's reward rate change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub reward_points_earned: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item snapshot: unit `price` is the catalog price at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Current product name; `None` once the product has been deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderLine {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An order with the names needed to display it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub shop_name: String,
    pub customer_email: Email,
}
